//! Integration tests for the money type

use core_kernel::{Currency, Money, MoneyError};
use rust_decimal_macros::dec;

#[test]
fn equal_split_of_300_over_3_is_exact_hundreds() {
    let total = Money::new(dec!(300.00), Currency::USD);
    let parts = total.allocate(3).unwrap();

    assert_eq!(parts.len(), 3);
    for part in &parts {
        assert_eq!(part.amount(), dec!(100.00));
    }
}

#[test]
fn equal_split_of_100_over_3_loses_no_cent() {
    let total = Money::new(dec!(100.00), Currency::USD);
    let parts = total.allocate(3).unwrap();

    assert_eq!(parts[0].amount(), dec!(33.34));
    assert_eq!(parts[1].amount(), dec!(33.33));
    assert_eq!(parts[2].amount(), dec!(33.33));

    let sum = Money::sum(&parts, Currency::USD).unwrap();
    assert_eq!(sum.amount(), dec!(100.00));
}

#[test]
fn sum_of_empty_sequence_is_zero() {
    let sum = Money::sum(&[], Currency::USD).unwrap();
    assert!(sum.is_zero());
}

#[test]
fn sum_rejects_mixed_currencies() {
    let values = vec![
        Money::new(dec!(10), Currency::USD),
        Money::new(dec!(10), Currency::EUR),
    ];
    assert!(matches!(
        Money::sum(&values, Currency::USD),
        Err(MoneyError::CurrencyMismatch(_, _))
    ));
}

#[test]
fn bankers_rounding_half_to_even() {
    let m = Money::new(dec!(2.125), Currency::USD);
    assert_eq!(m.round_bankers(2).amount(), dec!(2.12));

    let m = Money::new(dec!(2.135), Currency::USD);
    assert_eq!(m.round_bankers(2).amount(), dec!(2.14));
}
