//! Invoice model
//!
//! Invoices are created by the external billing workflow (rent schedules,
//! utility allocations); this crate only mutates their derived payment
//! state.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, InvoiceId, LeaseId, Money};

/// What the invoice bills for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceType {
    /// Periodic rent
    Rent,
    /// Allocated share of a utility bill
    Utility,
}

/// Invoice status, recomputed from the payment set and due date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    /// Open, not yet due or partially paid
    Pending,
    /// Fully paid (within rounding epsilon)
    Paid,
    /// Open and past the due date
    Overdue,
}

/// An invoice against a lease
///
/// `amount_paid` and `balance` are caches over the non-reversed payment
/// set. They are recomputed wholesale on every mutation; nothing ever
/// increments them in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier
    pub id: InvoiceId,
    /// Lease being billed
    pub lease_id: LeaseId,
    /// Invoice type
    pub invoice_type: InvoiceType,
    /// Total billed amount
    pub total_amount: Money,
    /// Cached sum of non-reversed payments
    pub amount_paid: Money,
    /// Cached `total_amount - amount_paid`
    pub balance: Money,
    /// Status
    pub status: InvoiceStatus,
    /// Payment due date
    pub due_date: NaiveDate,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Creates a new open invoice
    pub fn new(
        lease_id: LeaseId,
        invoice_type: InvoiceType,
        total_amount: Money,
        due_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: InvoiceId::new_v7(),
            lease_id,
            invoice_type,
            total_amount,
            amount_paid: Money::zero(total_amount.currency()),
            balance: total_amount,
            status: InvoiceStatus::Pending,
            due_date,
            created_at: now,
            updated_at: now,
        }
    }

    /// The invoice's functional currency
    pub fn currency(&self) -> Currency {
        self.total_amount.currency()
    }

    /// True if the invoice is open past its due date on the given local day
    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        today > self.due_date && self.status != InvoiceStatus::Paid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_invoice_starts_pending_with_full_balance() {
        let total = Money::new(dec!(15000), Currency::USD);
        let invoice = Invoice::new(
            LeaseId::new(),
            InvoiceType::Rent,
            total,
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        );

        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(invoice.balance, total);
        assert!(invoice.amount_paid.is_zero());
    }

    #[test]
    fn test_past_due_check() {
        let invoice = Invoice::new(
            LeaseId::new(),
            InvoiceType::Rent,
            Money::new(dec!(100), Currency::USD),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        );

        assert!(!invoice.is_past_due(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()));
        assert!(invoice.is_past_due(NaiveDate::from_ymd_opt(2025, 3, 2).unwrap()));
    }
}
