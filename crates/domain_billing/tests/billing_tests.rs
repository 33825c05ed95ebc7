//! Integration tests for invoice payment application and reversal

use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;

use core_kernel::{ActorId, Currency, LeaseId, Money};
use domain_billing::{
    apply_payment, paid_amount, refresh_invoice, reverse_payment, Invoice, InvoiceStatus,
    InvoiceType, Payment, PaymentMethod,
};

fn invoice(total: rust_decimal::Decimal) -> Invoice {
    Invoice::new(
        LeaseId::new(),
        InvoiceType::Rent,
        Money::new(total, Currency::USD),
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
    )
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 15).unwrap()
}

#[test]
fn test_partial_payments_accumulate_until_paid() {
    let mut inv = invoice(dec!(15000));
    let mut payments: Vec<Payment> = Vec::new();

    for amount in [dec!(5000), dec!(5000), dec!(5000)] {
        let p = apply_payment(
            &mut inv,
            &payments,
            Money::new(amount, Currency::USD),
            PaymentMethod::Bank,
            None,
            today(),
        )
        .unwrap();
        payments.push(p);
    }

    assert_eq!(inv.status, InvoiceStatus::Paid);
    assert!(inv.balance.is_zero());
    assert_eq!(inv.amount_paid.amount(), dec!(15000));
}

#[test]
fn test_reversal_then_repayment() {
    let mut inv = invoice(dec!(1200));

    let mut first = apply_payment(
        &mut inv,
        &[],
        Money::new(dec!(1200), Currency::USD),
        PaymentMethod::Cash,
        Some("OR-2001".to_string()),
        today(),
    )
    .unwrap();
    assert_eq!(inv.status, InvoiceStatus::Paid);

    reverse_payment(&mut first, ActorId::new(), "Posted to wrong tenant", Utc::now()).unwrap();
    refresh_invoice(&mut inv, std::slice::from_ref(&first), today()).unwrap();
    assert_eq!(inv.status, InvoiceStatus::Pending);
    assert_eq!(inv.balance.amount(), dec!(1200));

    // The reversed payment no longer consumes balance, so a fresh payment fits
    let second = apply_payment(
        &mut inv,
        std::slice::from_ref(&first),
        Money::new(dec!(1200), Currency::USD),
        PaymentMethod::Bank,
        None,
        today(),
    )
    .unwrap();

    let all = vec![first, second];
    assert_eq!(paid_amount(&all, Currency::USD).unwrap().amount(), dec!(1200));
    assert_eq!(inv.status, InvoiceStatus::Paid);
}

#[test]
fn test_cached_fields_match_recomputation() {
    let mut inv = invoice(dec!(700));
    let mut payments = Vec::new();

    let p1 = apply_payment(
        &mut inv,
        &payments,
        Money::new(dec!(300), Currency::USD),
        PaymentMethod::Cash,
        None,
        today(),
    )
    .unwrap();
    payments.push(p1);

    let p2 = apply_payment(
        &mut inv,
        &payments,
        Money::new(dec!(250), Currency::USD),
        PaymentMethod::Bank,
        None,
        today(),
    )
    .unwrap();
    payments.push(p2);

    let recomputed = paid_amount(&payments, Currency::USD).unwrap();
    assert_eq!(inv.amount_paid, recomputed);
    assert_eq!(inv.balance, inv.total_amount - recomputed);
}

#[test]
fn test_failed_application_never_records_a_payment() {
    let mut inv = invoice(dec!(100));
    let payments: Vec<Payment> = Vec::new();

    let result = apply_payment(
        &mut inv,
        &payments,
        Money::new(dec!(100.02), Currency::USD),
        PaymentMethod::Cash,
        None,
        today(),
    );

    assert!(result.is_err());
    assert!(inv.amount_paid.is_zero());
    assert_eq!(inv.status, InvoiceStatus::Pending);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// amount_paid + balance always reconstructs the invoice total,
        /// no matter what sequence of payments is applied.
        #[test]
        fn totals_reconstruct_after_any_payment_sequence(
            total in 100i64..1_000_000i64,
            attempts in proptest::collection::vec(1i64..500_000i64, 1..8)
        ) {
            let mut inv = invoice(rust_decimal::Decimal::new(total, 2));
            let mut payments: Vec<Payment> = Vec::new();

            for cents in attempts {
                let amount = Money::from_minor(cents, Currency::USD);
                if let Ok(p) = apply_payment(
                    &mut inv,
                    &payments,
                    amount,
                    PaymentMethod::Bank,
                    None,
                    today(),
                ) {
                    payments.push(p);
                }
            }

            let reconstructed = inv.amount_paid + inv.balance;
            prop_assert_eq!(reconstructed, inv.total_amount);
        }
    }
}
