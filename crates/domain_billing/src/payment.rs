//! Payment and reversal records
//!
//! A payment is created once per accepted attempt and never deleted;
//! corrections are reversal records. Ledger posting state is tracked
//! separately from the payment itself so a posting failure never loses an
//! already-received payment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ActorId, InvoiceId, JournalEntryId, Money, PaymentId, ReversalId};

use crate::error::BillingError;

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash received in person
    Cash,
    /// Bank transfer
    Bank,
    /// Credit card via the gateway
    CreditCard,
}

impl PaymentMethod {
    /// True if this payment can be reversed locally
    ///
    /// Electronic payments are reversed through the gateway, not here.
    pub fn is_reversible(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }
}

/// Ledger posting status of a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PostingStatus {
    /// Recorded, not yet posted to the general ledger
    Pending,
    /// Journal entry committed
    Posted,
    /// Posting attempt failed; retried later
    Failed,
}

/// A payment record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier
    pub id: PaymentId,
    /// Invoice being paid
    pub invoice_id: InvoiceId,
    /// Payment amount
    pub amount: Money,
    /// Payment method
    pub method: PaymentMethod,
    /// External reference (receipt number, bank ref)
    pub reference: Option<String>,
    /// Gateway correlation id for electronic payments
    pub gateway_reference: Option<String>,
    /// When the gateway confirmed settlement
    pub settled_at: Option<DateTime<Utc>>,
    /// Reversal flag
    pub is_reversed: bool,
    /// When the payment was reversed
    pub reversed_at: Option<DateTime<Utc>>,
    /// Who reversed it
    pub reversed_by: Option<ActorId>,
    /// Why it was reversed
    pub reversal_reason: Option<String>,
    /// Ledger posting status
    pub posting_status: PostingStatus,
    /// When the money was received
    pub received_at: DateTime<Utc>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a new pending payment
    pub fn new(invoice_id: InvoiceId, amount: Money, method: PaymentMethod) -> Self {
        let now = Utc::now();
        Self {
            id: PaymentId::new_v7(),
            invoice_id,
            amount,
            method,
            reference: None,
            gateway_reference: None,
            settled_at: None,
            is_reversed: false,
            reversed_at: None,
            reversed_by: None,
            reversal_reason: None,
            posting_status: PostingStatus::Pending,
            received_at: now,
            created_at: now,
        }
    }

    /// Sets the external reference
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Sets the gateway correlation id
    pub fn with_gateway_reference(mut self, reference: impl Into<String>) -> Self {
        self.gateway_reference = Some(reference.into());
        self
    }

    /// True once the gateway has confirmed settlement
    pub fn is_settled(&self) -> bool {
        self.settled_at.is_some()
    }

    /// Records gateway settlement; idempotent
    pub fn settle(&mut self, at: DateTime<Utc>) {
        if self.settled_at.is_none() {
            self.settled_at = Some(at);
        }
    }

    /// Marks the ledger posting as committed
    pub fn mark_posted(&mut self) {
        self.posting_status = PostingStatus::Posted;
    }

    /// Marks the ledger posting as failed; the payment itself stands
    pub fn mark_posting_failed(&mut self) {
        self.posting_status = PostingStatus::Failed;
    }

    /// Marks the payment reversed
    ///
    /// Validations live in `reconciliation::reverse_payment`; this method
    /// only applies the state change.
    pub(crate) fn mark_reversed(
        &mut self,
        actor: ActorId,
        reason: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<(), BillingError> {
        if self.is_reversed {
            return Err(BillingError::AlreadyReversed(self.id.to_string()));
        }
        self.is_reversed = true;
        self.reversed_at = Some(at);
        self.reversed_by = Some(actor);
        self.reversal_reason = Some(reason.into());
        Ok(())
    }
}

/// Immutable audit record for a reversed cash payment
///
/// One-to-one with its payment; `journal_entry_id` points at the
/// offsetting ledger entry so the reversal is traceable in both systems.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReversal {
    /// Unique identifier
    pub id: ReversalId,
    /// The reversed payment
    pub payment_id: PaymentId,
    /// The affected invoice
    pub invoice_id: InvoiceId,
    /// Amount nullified
    pub amount: Money,
    /// Reason given by the actor
    pub reason: String,
    /// Who performed the reversal
    pub reversed_by: ActorId,
    /// When
    pub reversed_at: DateTime<Utc>,
    /// The offsetting journal entry
    pub journal_entry_id: Option<JournalEntryId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    #[test]
    fn test_only_cash_is_locally_reversible() {
        assert!(PaymentMethod::Cash.is_reversible());
        assert!(!PaymentMethod::Bank.is_reversible());
        assert!(!PaymentMethod::CreditCard.is_reversible());
    }

    #[test]
    fn test_settle_is_idempotent() {
        let mut payment = Payment::new(
            InvoiceId::new(),
            Money::new(dec!(100), Currency::USD),
            PaymentMethod::CreditCard,
        )
        .with_gateway_reference("pi_123");

        let first = Utc::now();
        payment.settle(first);
        let recorded = payment.settled_at.unwrap();

        payment.settle(Utc::now());
        assert_eq!(payment.settled_at.unwrap(), recorded);
    }

    #[test]
    fn test_posting_failure_keeps_payment() {
        let mut payment = Payment::new(
            InvoiceId::new(),
            Money::new(dec!(100), Currency::USD),
            PaymentMethod::Cash,
        );

        payment.mark_posting_failed();
        assert_eq!(payment.posting_status, PostingStatus::Failed);
        assert!(!payment.is_reversed);
    }
}
