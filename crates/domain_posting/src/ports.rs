//! Store ports the orchestrator drives
//!
//! Each port is an async trait over the relational store. Implementations
//! must make every method an atomic unit of work; the orchestrator
//! sequences them and handles retry, never partial writes.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use core_kernel::{
    DomainPort, InvoiceId, JournalEntryId, LeaseUtilityId, PaymentId, PortError, UtilityBillId,
};
use domain_billing::{Invoice, Payment, PaymentReversal};
use domain_ledger::EntryDraft;
use domain_utility::{LeaseUtility, MeterReading, UtilityAllocation, UtilityBill};

/// Journal entry persistence
#[async_trait]
pub trait LedgerStore: DomainPort {
    /// Validates and commits a draft entry atomically
    async fn post_entry(&self, draft: EntryDraft) -> Result<JournalEntryId, PortError>;
}

/// Invoice and payment persistence
#[async_trait]
pub trait BillingStore: DomainPort {
    async fn load_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError>;

    /// All payments ever recorded against the invoice, reversed included
    async fn load_payments(&self, invoice_id: InvoiceId) -> Result<Vec<Payment>, PortError>;

    async fn load_payment(&self, id: PaymentId) -> Result<Payment, PortError>;

    /// Looks up a payment by its gateway correlation id
    async fn find_by_gateway_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Payment>, PortError>;

    /// Persists the invoice's recomputed totals and the new payment in one
    /// unit of work, conditioned on the invoice totals not having moved
    /// since the read (conflict otherwise)
    async fn save_applied_payment(
        &self,
        invoice: &Invoice,
        payment: &Payment,
    ) -> Result<(), PortError>;

    async fn update_payment(&self, payment: &Payment) -> Result<(), PortError>;

    /// Marks the payment settled only if no settlement is recorded yet.
    /// Returns whether this caller's write landed; a `false` means a
    /// concurrent delivery got there first and the receipt must not be
    /// posted again.
    async fn settle_payment(&self, payment: &Payment) -> Result<bool, PortError>;

    /// Persists the reversal record, the reversed payment, and the
    /// invoice's refreshed totals atomically
    async fn save_reversal(
        &self,
        invoice: &Invoice,
        payment: &Payment,
        reversal: &PaymentReversal,
    ) -> Result<(), PortError>;

    /// Stamps the offsetting journal entry id onto a committed reversal
    async fn update_reversal(&self, reversal: &PaymentReversal) -> Result<(), PortError>;
}

/// Utility bill, assignment, and reading persistence
#[async_trait]
pub trait UtilityStore: DomainPort {
    async fn load_bill(&self, id: UtilityBillId) -> Result<UtilityBill, PortError>;

    async fn update_bill(&self, bill: &UtilityBill) -> Result<(), PortError>;

    /// Assignments for the bill's property and utility
    async fn load_assignments(&self, bill: &UtilityBill) -> Result<Vec<LeaseUtility>, PortError>;

    async fn load_assignment(&self, id: LeaseUtilityId) -> Result<LeaseUtility, PortError>;

    /// Readings for the given assignments, date-ordered
    async fn load_readings(
        &self,
        assignment_ids: &[LeaseUtilityId],
    ) -> Result<Vec<MeterReading>, PortError>;

    /// Appends a validated reading to the log
    async fn append_reading(&self, reading: &MeterReading) -> Result<(), PortError>;

    /// Replaces the bill's unposted allocations and saves its new status
    /// in one unit of work
    async fn replace_allocations(
        &self,
        bill: &UtilityBill,
        allocations: &[UtilityAllocation],
    ) -> Result<(), PortError>;

    async fn load_allocations(
        &self,
        bill_id: UtilityBillId,
    ) -> Result<Vec<UtilityAllocation>, PortError>;
}

/// Convenience for recording a reading through the port
#[derive(Debug, Clone)]
pub struct ReadingRequest {
    pub lease_utility_id: LeaseUtilityId,
    pub value: Decimal,
    pub date: Option<NaiveDate>,
}
