//! Utility domain errors

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur in the utility domain
#[derive(Debug, Error)]
pub enum UtilityError {
    /// Bill not found
    #[error("Utility bill not found: {0}")]
    BillNotFound(String),

    /// Lease-utility assignment not found
    #[error("Lease utility assignment not found: {0}")]
    LeaseUtilityNotFound(String),

    /// Lease must be active for readings and allocations
    #[error("Lease is not active for assignment {0}")]
    LeaseNotActive(String),

    /// The tenant is not responsible for this utility
    #[error("Utility is not tenant-responsible for assignment {0}")]
    UtilityNotTenantResponsible(String),

    /// No unit qualifies for allocation
    #[error("No eligible units for bill {0}; check lease status and responsibility flags")]
    NoEligibleUnits(String),

    /// Stored percentages must sum to exactly 100
    #[error("Percentages across eligible units must sum to 100%, got {total}%")]
    InvalidPercentageSum { total: Decimal },

    /// Pre-assigned fixed amounts must sum to the bill total
    #[error("Fixed amounts sum to {assigned} but the bill total is {bill_total}")]
    FixedAmountsMismatch {
        bill_total: Decimal,
        assigned: Decimal,
    },

    /// Meter values are never negative
    #[error("Reading value must be non-negative, got {0}")]
    NegativeReading(Decimal),

    /// Meters do not run backward
    #[error("Reading of {value} on {date} violates monotonicity; neighboring reading is {neighbor}")]
    NonMonotonicReading {
        value: Decimal,
        neighbor: Decimal,
        date: chrono::NaiveDate,
    },

    /// Bill status does not permit the operation
    #[error("Bill {bill_id} is {status}; {operation} is not allowed")]
    InvalidBillStatus {
        bill_id: String,
        status: String,
        operation: &'static str,
    },

    /// Calculation error
    #[error("Calculation error: {0}")]
    Calculation(String),
}

impl UtilityError {
    /// Stable machine-readable code for API payloads
    pub fn code(&self) -> &'static str {
        match self {
            UtilityError::BillNotFound(_) => "NOT_FOUND",
            UtilityError::LeaseUtilityNotFound(_) => "LEASE_UTILITY_NOT_FOUND",
            UtilityError::LeaseNotActive(_) => "LEASE_NOT_ACTIVE",
            UtilityError::UtilityNotTenantResponsible(_) => "UTILITY_NOT_TENANT_RESPONSIBLE",
            UtilityError::NoEligibleUnits(_) => "NO_ELIGIBLE_UNITS",
            UtilityError::InvalidPercentageSum { .. } => "INVALID_PERCENTAGE_SUM",
            UtilityError::FixedAmountsMismatch { .. } => "FIXED_AMOUNTS_MISMATCH",
            UtilityError::NegativeReading(_) => "NEGATIVE_READING",
            UtilityError::NonMonotonicReading { .. } => "NON_MONOTONIC_READING",
            UtilityError::InvalidBillStatus { .. } => "INVALID_BILL_STATUS",
            UtilityError::Calculation(_) => "CALCULATION_ERROR",
        }
    }
}
