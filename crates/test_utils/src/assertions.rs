//! Custom Test Assertions
//!
//! Specialized assertion helpers for domain types that give more
//! meaningful error messages than standard assertions.

use core_kernel::Money;
use domain_ledger::entry::JournalEntry;
use domain_utility::allocation::UtilityAllocation;
use domain_utility::bill::UtilityBill;
use rust_decimal::Decimal;

/// Asserts that two Money values are approximately equal within a tolerance
///
/// # Panics
///
/// Panics if the currencies don't match or the amounts differ by more
/// than `tolerance`
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts that money values sum exactly to a total
pub fn assert_money_sum_equals(parts: &[Money], total: &Money) {
    let sum = parts.iter().fold(Money::zero(total.currency()), |acc, m| {
        acc.checked_add(m).expect("Currency mismatch in sum")
    });

    assert_eq!(
        sum.amount(),
        total.amount(),
        "Sum of parts ({}) doesn't equal total ({})",
        sum.amount(),
        total.amount()
    );
}

/// Asserts that a journal entry's debits equal its credits
pub fn assert_entry_balanced(entry: &JournalEntry) {
    let debits: Decimal = entry.lines.iter().map(|l| l.debit.amount()).sum();
    let credits: Decimal = entry.lines.iter().map(|l| l.credit.amount()).sum();

    assert_eq!(
        debits, credits,
        "Journal entry {} is imbalanced: debits={}, credits={}",
        entry.id, debits, credits
    );
}

/// Asserts that an allocation set conserves the bill total exactly
pub fn assert_allocations_conserve(bill: &UtilityBill, allocations: &[UtilityAllocation]) {
    let amounts: Vec<Money> = allocations.iter().map(|a| a.amount).collect();
    assert_money_sum_equals(&amounts, &bill.total_amount);

    for allocation in allocations {
        assert!(
            !allocation.amount.is_negative(),
            "Allocation {} for assignment {} is negative: {}",
            allocation.id,
            allocation.lease_utility_id,
            allocation.amount.amount()
        );
    }
}
