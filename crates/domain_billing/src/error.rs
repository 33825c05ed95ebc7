//! Billing domain errors

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// Invoice not found
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Payment not found
    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    /// Payment amount must be positive
    #[error("Payment amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Payment exceeds the invoice's remaining balance
    ///
    /// Carries the full diagnostic payload so callers can render an
    /// actionable message.
    #[error("Payment of {attempted} exceeds remaining balance {remaining} (invoice total {invoice_total}, already paid {already_paid})")]
    AmountExceedsBalance {
        invoice_total: Decimal,
        already_paid: Decimal,
        remaining: Decimal,
        attempted: Decimal,
    },

    /// Only cash payments are reversible locally
    #[error("Payment method {0} is not reversible; electronic payments are reversed via the gateway")]
    MethodNotReversible(String),

    /// Payment has already been reversed
    #[error("Payment already reversed: {0}")]
    AlreadyReversed(String),

    /// Calculation error
    #[error("Calculation error: {0}")]
    Calculation(String),
}

impl BillingError {
    /// Stable machine-readable code for API payloads
    pub fn code(&self) -> &'static str {
        match self {
            BillingError::InvoiceNotFound(_) | BillingError::PaymentNotFound(_) => "NOT_FOUND",
            BillingError::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            BillingError::AmountExceedsBalance { .. } => "AMOUNT_EXCEEDS_BALANCE",
            BillingError::MethodNotReversible(_) => "METHOD_NOT_REVERSIBLE",
            BillingError::AlreadyReversed(_) => "ALREADY_REVERSED",
            BillingError::Calculation(_) => "CALCULATION_ERROR",
        }
    }
}
