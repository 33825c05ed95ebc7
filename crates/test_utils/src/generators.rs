//! Property-Based Test Generators
//!
//! Proptest strategies for generating random test data that maintains
//! domain invariants.

use chrono::NaiveDate;
use core_kernel::{Currency, DateRange, Money};
use domain_utility::bill::SplitMethod;
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for generating valid Currency values
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::USD),
        Just(Currency::EUR),
        Just(Currency::GBP),
        Just(Currency::CAD),
        Just(Currency::AUD),
        Just(Currency::PHP),
        Just(Currency::MXN),
    ]
}

/// Strategy for generating positive amounts in minor units
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000_00i64
}

/// Strategy for generating positive Money values
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    (positive_amount_minor_strategy(), currency_strategy())
        .prop_map(|(amount, currency)| Money::from_minor(amount, currency))
}

/// Strategy for generating positive USD Money values
pub fn usd_money_strategy() -> impl Strategy<Value = Money> {
    positive_amount_minor_strategy().prop_map(|amount| Money::from_minor(amount, Currency::USD))
}

/// Strategy for generating percentages (0.01% to 100%)
pub fn percentage_strategy() -> impl Strategy<Value = Decimal> {
    (1u32..10000u32).prop_map(|n| Decimal::new(n as i64, 2))
}

/// Strategy for generating a set of percentages summing to exactly 100
pub fn percentage_split_strategy(parts: usize) -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec(1u32..100u32, parts).prop_map(|weights| {
        let total: u32 = weights.iter().sum();
        let hundred = Decimal::new(100, 0);
        let mut shares: Vec<Decimal> = weights
            .iter()
            .map(|w| (Decimal::from(*w) * hundred / Decimal::from(total)).round_dp(2))
            .collect();
        // Absorb rounding drift into the last share
        let assigned: Decimal = shares.iter().take(shares.len() - 1).copied().sum();
        let last = shares.len() - 1;
        shares[last] = hundred - assigned;
        shares
    })
}

/// Strategy for generating meter reading values
pub fn reading_value_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for generating split methods
pub fn split_method_strategy() -> impl Strategy<Value = SplitMethod> {
    prop_oneof![
        Just(SplitMethod::Equal),
        Just(SplitMethod::Metered),
        Just(SplitMethod::Percentage),
        Just(SplitMethod::Fixed),
    ]
}

/// Strategy for generating dates within 2024
pub fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (1u32..=366u32).prop_map(|day| {
        NaiveDate::from_yo_opt(2024, day).unwrap_or_else(|| NaiveDate::from_ymd_opt(2024, 12, 31).unwrap())
    })
}

/// Strategy for generating billing periods within 2024
pub fn period_strategy() -> impl Strategy<Value = DateRange> {
    (1u32..330u32, 1u32..30u32).prop_map(|(start, len)| {
        let start_date = NaiveDate::from_yo_opt(2024, start).unwrap();
        let end_date = NaiveDate::from_yo_opt(2024, start + len).unwrap();
        DateRange::new(start_date, end_date).unwrap()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn percentage_splits_sum_to_one_hundred(shares in percentage_split_strategy(5)) {
            let total: Decimal = shares.iter().copied().sum();
            prop_assert_eq!(total, Decimal::new(100, 0));
        }

        #[test]
        fn generated_periods_are_ordered(period in period_strategy()) {
            prop_assert!(period.start <= period.end);
        }
    }
}
