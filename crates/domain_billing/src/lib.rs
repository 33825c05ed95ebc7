//! Billing Domain - Invoices, Payments, and Reconciliation
//!
//! This crate tracks what tenants owe and what they have paid. The source
//! of truth for an invoice's balance is the set of non-reversed payments
//! against it; the persisted `amount_paid`/`balance` fields are caches that
//! are recomputed from that set on every mutation, never incremented in
//! place. That keeps the derived totals correct after any sequence of
//! applications and reversals.
//!
//! Cash payments can be reversed locally (an auditable reversal record plus
//! an offsetting ledger entry); electronic payments are reversed through
//! the gateway and are rejected here.

pub mod error;
pub mod invoice;
pub mod payment;
pub mod reconciliation;

pub use error::BillingError;
pub use invoice::{Invoice, InvoiceStatus, InvoiceType};
pub use payment::{Payment, PaymentMethod, PaymentReversal, PostingStatus};
pub use reconciliation::{apply_payment, paid_amount, refresh_invoice, reverse_payment, EPSILON};
