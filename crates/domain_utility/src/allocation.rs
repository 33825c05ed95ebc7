//! Utility bill allocation engine
//!
//! Splits a bill's total among eligible units. Every split method
//! reconciles rounding so that the allocation amounts sum back to the
//! bill total exactly; a cent is never silently lost or invented.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{AllocationId, LeaseId, LeaseUtilityId, Money, UnitId, UtilityBillId};

use crate::assignment::LeaseUtility;
use crate::bill::{BillStatus, SplitMethod, UtilityBill};
use crate::error::UtilityError;
use crate::reading::MeterLog;

/// One unit's computed share of a bill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilityAllocation {
    /// Unique identifier
    pub id: AllocationId,
    /// The bill being split
    pub utility_bill_id: UtilityBillId,
    /// The assignment this share belongs to
    pub lease_utility_id: LeaseUtilityId,
    /// The unit
    pub unit_id: UnitId,
    /// The lease billed for the share
    pub lease_id: LeaseId,
    /// The allocated amount
    pub amount: Money,
    /// The effective percentage of the total, where meaningful
    pub percentage: Option<Decimal>,
}

/// Result of an allocation run
///
/// Anomalies do not abort the run; they downgrade the outcome to
/// review-required so a human signs off before posting.
#[derive(Debug)]
pub struct AllocationOutcome {
    /// One allocation per eligible unit, summing to the bill total
    pub allocations: Vec<UtilityAllocation>,
    /// Human-readable anomaly descriptions
    pub anomalies: Vec<String>,
}

impl AllocationOutcome {
    /// The status the bill should advance to after this run
    pub fn resulting_status(&self) -> BillStatus {
        if self.anomalies.is_empty() {
            BillStatus::Approved
        } else {
            BillStatus::ReviewRequired
        }
    }
}

/// Computes allocations for a bill across the given assignments
///
/// Only active, tenant-responsible assignments for the bill's utility
/// participate. Prior unposted allocations are the caller's to replace;
/// recalculation is idempotent while the bill still allows it.
pub fn calculate_allocations(
    bill: &UtilityBill,
    assignments: &[LeaseUtility],
    log: &MeterLog,
) -> Result<AllocationOutcome, UtilityError> {
    if !bill.status.allows_allocation() {
        return Err(UtilityError::InvalidBillStatus {
            bill_id: bill.id.to_string(),
            status: bill.status.to_string(),
            operation: "allocation",
        });
    }

    let eligible: Vec<&LeaseUtility> = assignments
        .iter()
        .filter(|a| a.utility_id == bill.utility_id && a.is_eligible())
        .collect();

    if eligible.is_empty() {
        return Err(UtilityError::NoEligibleUnits(bill.id.to_string()));
    }

    let outcome = match bill.split_method {
        SplitMethod::Equal => split_equal(bill, &eligible)?,
        SplitMethod::Metered => split_metered(bill, &eligible, log)?,
        SplitMethod::Percentage => split_percentage(bill, &eligible)?,
        SplitMethod::Fixed => split_fixed(bill, &eligible)?,
    };

    debug_assert_eq!(
        Money::sum(
            outcome.allocations.iter().map(|a| &a.amount),
            bill.total_amount.currency()
        )
        .map(|m| m.amount()),
        Ok(bill.total_amount.amount())
    );

    tracing::info!(
        bill_id = %bill.id,
        method = ?bill.split_method,
        units = outcome.allocations.len(),
        anomalies = outcome.anomalies.len(),
        "Utility bill allocated"
    );

    Ok(outcome)
}

fn allocation_for(
    bill: &UtilityBill,
    assignment: &LeaseUtility,
    amount: Money,
    percentage: Option<Decimal>,
) -> UtilityAllocation {
    UtilityAllocation {
        id: AllocationId::new_v7(),
        utility_bill_id: bill.id,
        lease_utility_id: assignment.id,
        unit_id: assignment.unit_id,
        lease_id: assignment.lease_id,
        amount,
        percentage,
    }
}

fn split_equal(
    bill: &UtilityBill,
    eligible: &[&LeaseUtility],
) -> Result<AllocationOutcome, UtilityError> {
    let parts = bill
        .total_amount
        .allocate(eligible.len() as u32)
        .map_err(|e| UtilityError::Calculation(e.to_string()))?;

    let allocations = eligible
        .iter()
        .zip(parts)
        .map(|(a, amount)| allocation_for(bill, a, amount, None))
        .collect();

    Ok(AllocationOutcome {
        allocations,
        anomalies: Vec::new(),
    })
}

fn split_metered(
    bill: &UtilityBill,
    eligible: &[&LeaseUtility],
    log: &MeterLog,
) -> Result<AllocationOutcome, UtilityError> {
    let mut anomalies = Vec::new();
    let mut consumptions = Vec::with_capacity(eligible.len());

    for assignment in eligible {
        match log.consumption(assignment.id, bill.period.start, bill.period.end) {
            Some(delta) => consumptions.push(delta),
            None => {
                anomalies.push(format!(
                    "Missing period-bounding readings for assignment {}",
                    assignment.id
                ));
                consumptions.push(Decimal::ZERO);
            }
        }
    }

    let total_consumption: Decimal = consumptions.iter().sum();
    if total_consumption.is_zero() {
        // No usable consumption data; fall back to an equal split and
        // flag the whole bill for review.
        anomalies.push("Total metered consumption is zero; fell back to equal split".to_string());
        let mut outcome = split_equal(bill, eligible)?;
        outcome.anomalies = anomalies;
        return Ok(outcome);
    }

    let parts = bill
        .total_amount
        .allocate_by_ratios(&consumptions)
        .map_err(|e| UtilityError::Calculation(e.to_string()))?;

    let allocations = eligible
        .iter()
        .zip(parts)
        .zip(&consumptions)
        .map(|((a, amount), consumption)| {
            let share = (consumption / total_consumption * dec!(100)).round_dp(4);
            allocation_for(bill, a, amount, Some(share))
        })
        .collect();

    Ok(AllocationOutcome {
        allocations,
        anomalies,
    })
}

fn split_percentage(
    bill: &UtilityBill,
    eligible: &[&LeaseUtility],
) -> Result<AllocationOutcome, UtilityError> {
    let percentages: Vec<Decimal> = eligible
        .iter()
        .map(|a| a.percentage.unwrap_or(Decimal::ZERO))
        .collect();

    let total: Decimal = percentages.iter().sum();
    if total != dec!(100) {
        return Err(UtilityError::InvalidPercentageSum { total });
    }

    let parts = bill
        .total_amount
        .allocate_by_ratios(&percentages)
        .map_err(|e| UtilityError::Calculation(e.to_string()))?;

    let allocations = eligible
        .iter()
        .zip(parts)
        .zip(&percentages)
        .map(|((a, amount), pct)| allocation_for(bill, a, amount, Some(*pct)))
        .collect();

    Ok(AllocationOutcome {
        allocations,
        anomalies: Vec::new(),
    })
}

fn split_fixed(
    bill: &UtilityBill,
    eligible: &[&LeaseUtility],
) -> Result<AllocationOutcome, UtilityError> {
    let currency = bill.total_amount.currency();
    let mut amounts = Vec::with_capacity(eligible.len());
    for assignment in eligible {
        amounts.push(
            assignment
                .fixed_amount
                .unwrap_or_else(|| Money::zero(currency)),
        );
    }

    let assigned =
        Money::sum(&amounts, currency).map_err(|e| UtilityError::Calculation(e.to_string()))?;
    if assigned.amount() != bill.total_amount.amount() {
        return Err(UtilityError::FixedAmountsMismatch {
            bill_total: bill.total_amount.amount(),
            assigned: assigned.amount(),
        });
    }

    let allocations = eligible
        .iter()
        .zip(amounts)
        .map(|(a, amount)| allocation_for(bill, a, amount, None))
        .collect();

    Ok(AllocationOutcome {
        allocations,
        anomalies: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_kernel::{Currency, DateRange, PropertyId, UtilityId};

    fn day(month: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, d).unwrap()
    }

    fn bill(total: Decimal, method: SplitMethod, utility_id: core_kernel::UtilityId) -> UtilityBill {
        UtilityBill::new(
            PropertyId::new(),
            utility_id,
            "City Water Co",
            Money::new(total, Currency::USD),
            day(2, 1),
            day(2, 20),
            DateRange::new(day(1, 1), day(1, 31)).unwrap(),
            method,
        )
    }

    fn assignments(utility_id: UtilityId, n: usize) -> Vec<LeaseUtility> {
        (0..n)
            .map(|_| {
                LeaseUtility::new(
                    core_kernel::LeaseId::new(),
                    core_kernel::UnitId::new(),
                    utility_id,
                )
            })
            .collect()
    }

    #[test]
    fn test_equal_split_divides_evenly() {
        let utility = UtilityId::new();
        let bill = bill(dec!(300), SplitMethod::Equal, utility);
        let assignments = assignments(utility, 3);

        let outcome = calculate_allocations(&bill, &assignments, &MeterLog::new()).unwrap();

        let amounts: Vec<Decimal> = outcome.allocations.iter().map(|a| a.amount.amount()).collect();
        assert_eq!(amounts, vec![dec!(100), dec!(100), dec!(100)]);
        assert_eq!(outcome.resulting_status(), BillStatus::Approved);
    }

    #[test]
    fn test_equal_split_reconciles_remainder() {
        let utility = UtilityId::new();
        let bill = bill(dec!(100), SplitMethod::Equal, utility);
        let assignments = assignments(utility, 3);

        let outcome = calculate_allocations(&bill, &assignments, &MeterLog::new()).unwrap();

        let total: Decimal = outcome.allocations.iter().map(|a| a.amount.amount()).sum();
        assert_eq!(total, dec!(100));
        assert_eq!(outcome.allocations[0].amount.amount(), dec!(33.34));
    }

    #[test]
    fn test_no_eligible_units() {
        let utility = UtilityId::new();
        let bill = bill(dec!(100), SplitMethod::Equal, utility);
        let mut assignments = assignments(utility, 2);
        for a in &mut assignments {
            a.is_tenant_responsible = false;
        }

        let err = calculate_allocations(&bill, &assignments, &MeterLog::new()).unwrap_err();
        assert_eq!(err.code(), "NO_ELIGIBLE_UNITS");
    }

    #[test]
    fn test_metered_split_proportional_to_consumption() {
        let utility = UtilityId::new();
        let bill = bill(dec!(100), SplitMethod::Metered, utility);
        let assignments = assignments(utility, 2);

        let mut log = MeterLog::new();
        // First unit consumed 30, second consumed 10 over January
        log.record(&assignments[0], dec!(100), day(1, 1)).unwrap();
        log.record(&assignments[0], dec!(130), day(1, 31)).unwrap();
        log.record(&assignments[1], dec!(50), day(1, 1)).unwrap();
        log.record(&assignments[1], dec!(60), day(1, 31)).unwrap();

        let outcome = calculate_allocations(&bill, &assignments, &log).unwrap();

        assert_eq!(outcome.allocations[0].amount.amount(), dec!(75));
        assert_eq!(outcome.allocations[1].amount.amount(), dec!(25));
        assert_eq!(outcome.resulting_status(), BillStatus::Approved);
    }

    #[test]
    fn test_metered_split_with_missing_readings_needs_review() {
        let utility = UtilityId::new();
        let bill = bill(dec!(100), SplitMethod::Metered, utility);
        let assignments = assignments(utility, 2);

        let mut log = MeterLog::new();
        log.record(&assignments[0], dec!(10), day(1, 1)).unwrap();
        log.record(&assignments[0], dec!(50), day(1, 31)).unwrap();
        // Second unit has no readings at all

        let outcome = calculate_allocations(&bill, &assignments, &log).unwrap();

        assert_eq!(outcome.resulting_status(), BillStatus::ReviewRequired);
        let total: Decimal = outcome.allocations.iter().map(|a| a.amount.amount()).sum();
        assert_eq!(total, dec!(100));
    }

    #[test]
    fn test_metered_zero_consumption_falls_back_to_equal() {
        let utility = UtilityId::new();
        let bill = bill(dec!(90), SplitMethod::Metered, utility);
        let assignments = assignments(utility, 3);

        let outcome = calculate_allocations(&bill, &assignments, &MeterLog::new()).unwrap();

        assert_eq!(outcome.resulting_status(), BillStatus::ReviewRequired);
        let amounts: Vec<Decimal> = outcome.allocations.iter().map(|a| a.amount.amount()).collect();
        assert_eq!(amounts, vec![dec!(30), dec!(30), dec!(30)]);
    }

    #[test]
    fn test_percentage_split_must_sum_to_hundred() {
        let utility = UtilityId::new();
        let bill = bill(dec!(200), SplitMethod::Percentage, utility);
        let mut assignments = assignments(utility, 2);
        assignments[0].percentage = Some(dec!(60));
        assignments[1].percentage = Some(dec!(30));

        let err = calculate_allocations(&bill, &assignments, &MeterLog::new()).unwrap_err();
        assert_eq!(err.code(), "INVALID_PERCENTAGE_SUM");

        assignments[1].percentage = Some(dec!(40));
        let outcome = calculate_allocations(&bill, &assignments, &MeterLog::new()).unwrap();
        assert_eq!(outcome.allocations[0].amount.amount(), dec!(120));
        assert_eq!(outcome.allocations[1].amount.amount(), dec!(80));
        assert_eq!(outcome.allocations[0].percentage, Some(dec!(60)));
    }

    #[test]
    fn test_fixed_split_must_match_total() {
        let utility = UtilityId::new();
        let bill = bill(dec!(150), SplitMethod::Fixed, utility);
        let mut assignments = assignments(utility, 2);
        assignments[0].fixed_amount = Some(Money::new(dec!(100), Currency::USD));
        assignments[1].fixed_amount = Some(Money::new(dec!(40), Currency::USD));

        let err = calculate_allocations(&bill, &assignments, &MeterLog::new()).unwrap_err();
        match err {
            UtilityError::FixedAmountsMismatch {
                bill_total,
                assigned,
            } => {
                assert_eq!(bill_total, dec!(150));
                assert_eq!(assigned, dec!(140));
            }
            other => panic!("unexpected error: {other}"),
        }

        assignments[1].fixed_amount = Some(Money::new(dec!(50), Currency::USD));
        let outcome = calculate_allocations(&bill, &assignments, &MeterLog::new()).unwrap();
        assert_eq!(outcome.allocations[1].amount.amount(), dec!(50));
    }

    #[test]
    fn test_posted_bill_rejects_recalculation() {
        let utility = UtilityId::new();
        let mut bill = bill(dec!(100), SplitMethod::Equal, utility);
        bill.advance(BillStatus::Processing).unwrap();
        bill.advance(BillStatus::Approved).unwrap();
        bill.advance(BillStatus::Posted).unwrap();

        let err =
            calculate_allocations(&bill, &assignments(utility, 2), &MeterLog::new()).unwrap_err();
        assert_eq!(err.code(), "INVALID_BILL_STATUS");
    }
}
