//! Payment application and reversal
//!
//! All invoice totals here are derived wholesale from the payment set.
//! `apply_payment` and `reverse_payment` validate against the recomputed
//! state, mutate, then recompute again, so the cached fields on the
//! invoice can never drift from the payments that back them.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{ActorId, Currency, Money, ReversalId};

use crate::error::BillingError;
use crate::invoice::{Invoice, InvoiceStatus};
use crate::payment::{Payment, PaymentMethod, PaymentReversal};

/// Tolerance for treating an invoice as fully paid
///
/// Allocation rounding can leave a residual of under one cent across a
/// split invoice; anything within this band counts as settled.
pub const EPSILON: Decimal = dec!(0.01);

/// Sums the non-reversed payments in the set
pub fn paid_amount(payments: &[Payment], currency: Currency) -> Result<Money, BillingError> {
    Money::sum(
        payments.iter().filter(|p| !p.is_reversed).map(|p| &p.amount),
        currency,
    )
    .map_err(|e| BillingError::Calculation(e.to_string()))
}

/// Recomputes the invoice's cached totals and status from the payment set
///
/// `payments` must be the complete payment set for this invoice. Status is
/// Paid when the remaining balance is within [`EPSILON`], Overdue when an
/// open invoice is past due on the given local day, otherwise Pending.
pub fn refresh_invoice(
    invoice: &mut Invoice,
    payments: &[Payment],
    today: NaiveDate,
) -> Result<(), BillingError> {
    let paid = paid_amount(payments, invoice.currency())?;
    let balance = invoice
        .total_amount
        .checked_sub(&paid)
        .map_err(|e| BillingError::Calculation(e.to_string()))?;

    invoice.amount_paid = paid;
    invoice.balance = balance;
    invoice.status = if balance.amount().abs() <= EPSILON {
        InvoiceStatus::Paid
    } else if today > invoice.due_date {
        InvoiceStatus::Overdue
    } else {
        InvoiceStatus::Pending
    };
    invoice.updated_at = Utc::now();

    Ok(())
}

/// Applies a payment to an invoice
///
/// Validates against the recomputed remaining balance, never the cached
/// field. On success the invoice caches are refreshed and the new payment
/// is returned for persistence and ledger posting; on failure nothing is
/// mutated.
pub fn apply_payment(
    invoice: &mut Invoice,
    payments: &[Payment],
    amount: Money,
    method: PaymentMethod,
    reference: Option<String>,
    today: NaiveDate,
) -> Result<Payment, BillingError> {
    if !amount.is_positive() {
        return Err(BillingError::NonPositiveAmount(amount.amount()));
    }

    let paid = paid_amount(payments, invoice.currency())?;
    let remaining = invoice
        .total_amount
        .checked_sub(&paid)
        .map_err(|e| BillingError::Calculation(e.to_string()))?;

    if amount.amount() > remaining.amount() + EPSILON {
        return Err(BillingError::AmountExceedsBalance {
            invoice_total: invoice.total_amount.amount(),
            already_paid: paid.amount(),
            remaining: remaining.amount(),
            attempted: amount.amount(),
        });
    }

    let mut payment = Payment::new(invoice.id, amount, method);
    if let Some(reference) = reference {
        payment = payment.with_reference(reference);
    }

    let mut full_set: Vec<Payment> = payments.to_vec();
    full_set.push(payment.clone());
    refresh_invoice(invoice, &full_set, today)?;

    tracing::info!(
        invoice_id = %invoice.id,
        payment_id = %payment.id,
        amount = %payment.amount,
        method = ?payment.method,
        new_balance = %invoice.balance,
        "Payment applied"
    );

    Ok(payment)
}

/// Reverses a cash payment
///
/// Only cash payments can be reversed here and only once. The caller is
/// responsible for refreshing the invoice afterwards and posting the
/// offsetting ledger entry recorded on the returned reversal.
pub fn reverse_payment(
    payment: &mut Payment,
    actor: ActorId,
    reason: impl Into<String>,
    now: DateTime<Utc>,
) -> Result<PaymentReversal, BillingError> {
    if !payment.method.is_reversible() {
        return Err(BillingError::MethodNotReversible(format!(
            "{:?}",
            payment.method
        )));
    }
    if payment.is_reversed {
        return Err(BillingError::AlreadyReversed(payment.id.to_string()));
    }

    let reason = reason.into();
    payment.mark_reversed(actor, reason.clone(), now)?;

    tracing::info!(
        payment_id = %payment.id,
        invoice_id = %payment.invoice_id,
        amount = %payment.amount,
        %actor,
        "Cash payment reversed"
    );

    Ok(PaymentReversal {
        id: ReversalId::new_v7(),
        payment_id: payment.id,
        invoice_id: payment.invoice_id,
        amount: payment.amount,
        reason,
        reversed_by: actor,
        reversed_at: now,
        journal_entry_id: None,
    })
}
