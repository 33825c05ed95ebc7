//! Pre-built Test Fixtures
//!
//! Ready-to-use test data for common entities across the property
//! accounting system. Fixtures are deterministic so assertions can rely
//! on exact identifiers and dates.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use core_kernel::{
    Currency, DateRange, EntityId, LeaseId, Money, PropertyId, TenantId, UnitId, UtilityId,
};
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Standard USD amount
    pub fn usd_100() -> Money {
        Money::new(dec!(100.00), Currency::USD)
    }

    /// Typical monthly rent
    pub fn usd_rent() -> Money {
        Money::new(dec!(1200.00), Currency::USD)
    }

    /// Typical utility bill total
    pub fn usd_bill() -> Money {
        Money::new(dec!(300.00), Currency::USD)
    }

    /// Zero amount
    pub fn usd_zero() -> Money {
        Money::zero(Currency::USD)
    }

    /// EUR amount for currency mismatch tests
    pub fn eur_100() -> Money {
        Money::new(dec!(100.00), Currency::EUR)
    }

    /// Amount that does not divide evenly three ways
    pub fn usd_odd() -> Money {
        Money::new(dec!(100.01), Currency::USD)
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Standard billing period (January 2024)
    pub fn january_period() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .unwrap()
    }

    /// Bill date following the standard period
    pub fn bill_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    }

    /// Due date for the standard bill
    pub fn due_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 15).unwrap()
    }

    /// A date inside the standard period
    pub fn mid_period() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    /// A date before the standard period
    pub fn before_period() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
    }

    /// A settlement timestamp inside the standard period
    pub fn settlement_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 20, 14, 30, 0).unwrap()
    }
}

/// Fixture for deterministic identifiers
pub struct IdFixtures;

impl IdFixtures {
    pub fn entity_id() -> EntityId {
        EntityId::from_uuid(Uuid::from_u128(0x10))
    }

    pub fn property_id() -> PropertyId {
        PropertyId::from_uuid(Uuid::from_u128(0x20))
    }

    pub fn unit_a() -> UnitId {
        UnitId::from_uuid(Uuid::from_u128(0x31))
    }

    pub fn unit_b() -> UnitId {
        UnitId::from_uuid(Uuid::from_u128(0x32))
    }

    pub fn unit_c() -> UnitId {
        UnitId::from_uuid(Uuid::from_u128(0x33))
    }

    pub fn lease_a() -> LeaseId {
        LeaseId::from_uuid(Uuid::from_u128(0x41))
    }

    pub fn lease_b() -> LeaseId {
        LeaseId::from_uuid(Uuid::from_u128(0x42))
    }

    pub fn lease_c() -> LeaseId {
        LeaseId::from_uuid(Uuid::from_u128(0x43))
    }

    pub fn tenant_id() -> TenantId {
        TenantId::from_uuid(Uuid::from_u128(0x50))
    }

    pub fn electricity() -> UtilityId {
        UtilityId::from_uuid(Uuid::from_u128(0x61))
    }

    pub fn water() -> UtilityId {
        UtilityId::from_uuid(Uuid::from_u128(0x62))
    }
}

/// Fixture for string test data
pub struct StringFixtures;

impl StringFixtures {
    pub fn provider_name() -> &'static str {
        "Metro Power & Light"
    }

    pub fn payment_reference() -> &'static str {
        "CHK-20240115-001"
    }

    pub fn gateway_reference() -> &'static str {
        "gw_txn_7f3a2b"
    }

    pub fn reversal_reason() -> &'static str {
        "Cash drawer recount found duplicate entry"
    }
}
