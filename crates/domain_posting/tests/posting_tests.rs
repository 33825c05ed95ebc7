//! Orchestrator tests against in-memory store doubles

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;

use core_kernel::{
    ActorId, Currency, DateRange, DomainPort, EntityId, InvoiceId, JournalEntryId, LeaseId,
    LeaseUtilityId, Money, PaymentId, PortError, PropertyId, Timezone, UnitId, UtilityBillId,
    UtilityId,
};
use domain_billing::{
    Invoice, InvoiceStatus, InvoiceType, Payment, PaymentMethod, PaymentReversal, PostingStatus,
};
use domain_ledger::{ChartRegistry, EntryDraft, JournalBook};
use domain_posting::{
    BillingStore, LedgerStore, PostingError, PostingOrchestrator, ReadingRequest, RetryPolicy,
    UtilityStore,
};
use domain_utility::{
    BillStatus, LeaseUtility, MeterReading, SplitMethod, UtilityAllocation, UtilityBill,
};

#[derive(Clone)]
struct MemLedger {
    inner: Arc<Mutex<(ChartRegistry, JournalBook)>>,
    fail_next: Arc<AtomicU32>,
}

impl MemLedger {
    fn new() -> Self {
        let entity = EntityId::new();
        let mut registry = ChartRegistry::new();
        registry.ensure_standard(entity);
        let book = JournalBook::new(entity, Currency::USD);
        Self {
            inner: Arc::new(Mutex::new((registry, book))),
            fail_next: Arc::new(AtomicU32::new(0)),
        }
    }

    fn entry_count(&self) -> usize {
        self.inner.lock().unwrap().1.entries().len()
    }
}

impl DomainPort for MemLedger {}

#[async_trait]
impl LedgerStore for MemLedger {
    async fn post_entry(&self, draft: EntryDraft) -> Result<JournalEntryId, PortError> {
        if self.fail_next.load(Ordering::SeqCst) > 0 {
            self.fail_next.fetch_sub(1, Ordering::SeqCst);
            return Err(PortError::connection("ledger store unavailable"));
        }
        let mut guard = self.inner.lock().unwrap();
        let (registry, book) = &mut *guard;
        book.post(registry, draft)
            .map_err(|e| PortError::validation(e.to_string()))
    }
}

#[derive(Clone, Default)]
struct MemBilling {
    invoices: Arc<Mutex<HashMap<InvoiceId, Invoice>>>,
    payments: Arc<Mutex<HashMap<PaymentId, Payment>>>,
    reversals: Arc<Mutex<Vec<PaymentReversal>>>,
    conflicts_to_inject: Arc<AtomicU32>,
    reversal_failures_to_inject: Arc<AtomicU32>,
    // Serves that many gateway lookups from a snapshot taken before the
    // payment settled, the way an overlapping webhook delivery reads it
    stale_settlement_reads: Arc<AtomicU32>,
}

impl MemBilling {
    fn insert_invoice(&self, invoice: Invoice) {
        self.invoices.lock().unwrap().insert(invoice.id, invoice);
    }

    fn insert_payment(&self, payment: Payment) {
        self.payments.lock().unwrap().insert(payment.id, payment);
    }

    fn payment(&self, id: PaymentId) -> Payment {
        self.payments.lock().unwrap().get(&id).unwrap().clone()
    }

    fn invoice(&self, id: InvoiceId) -> Invoice {
        self.invoices.lock().unwrap().get(&id).unwrap().clone()
    }
}

impl DomainPort for MemBilling {}

#[async_trait]
impl BillingStore for MemBilling {
    async fn load_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError> {
        self.invoices
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Invoice", id))
    }

    async fn load_payments(&self, invoice_id: InvoiceId) -> Result<Vec<Payment>, PortError> {
        Ok(self
            .payments
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.invoice_id == invoice_id)
            .cloned()
            .collect())
    }

    async fn load_payment(&self, id: PaymentId) -> Result<Payment, PortError> {
        self.payments
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Payment", id))
    }

    async fn find_by_gateway_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Payment>, PortError> {
        let mut found = self
            .payments
            .lock()
            .unwrap()
            .values()
            .find(|p| p.gateway_reference.as_deref() == Some(reference))
            .cloned();
        if self.stale_settlement_reads.load(Ordering::SeqCst) > 0 {
            self.stale_settlement_reads.fetch_sub(1, Ordering::SeqCst);
            if let Some(payment) = found.as_mut() {
                payment.settled_at = None;
            }
        }
        Ok(found)
    }

    async fn save_applied_payment(
        &self,
        invoice: &Invoice,
        payment: &Payment,
    ) -> Result<(), PortError> {
        if self.conflicts_to_inject.load(Ordering::SeqCst) > 0 {
            self.conflicts_to_inject.fetch_sub(1, Ordering::SeqCst);
            return Err(PortError::conflict("invoice balance moved"));
        }
        self.invoices
            .lock()
            .unwrap()
            .insert(invoice.id, invoice.clone());
        self.payments
            .lock()
            .unwrap()
            .insert(payment.id, payment.clone());
        Ok(())
    }

    async fn update_payment(&self, payment: &Payment) -> Result<(), PortError> {
        self.payments
            .lock()
            .unwrap()
            .insert(payment.id, payment.clone());
        Ok(())
    }

    async fn settle_payment(&self, payment: &Payment) -> Result<bool, PortError> {
        let mut payments = self.payments.lock().unwrap();
        let stored = payments
            .get_mut(&payment.id)
            .ok_or_else(|| PortError::not_found("Payment", payment.id))?;
        if stored.settled_at.is_some() {
            return Ok(false);
        }
        stored.settled_at = payment.settled_at;
        Ok(true)
    }

    async fn save_reversal(
        &self,
        invoice: &Invoice,
        payment: &Payment,
        reversal: &PaymentReversal,
    ) -> Result<(), PortError> {
        if self.reversal_failures_to_inject.load(Ordering::SeqCst) > 0 {
            self.reversal_failures_to_inject.fetch_sub(1, Ordering::SeqCst);
            return Err(PortError::connection("billing store unavailable"));
        }
        self.invoices
            .lock()
            .unwrap()
            .insert(invoice.id, invoice.clone());
        self.payments
            .lock()
            .unwrap()
            .insert(payment.id, payment.clone());
        self.reversals.lock().unwrap().push(reversal.clone());
        Ok(())
    }

    async fn update_reversal(&self, reversal: &PaymentReversal) -> Result<(), PortError> {
        let mut reversals = self.reversals.lock().unwrap();
        if let Some(stored) = reversals.iter_mut().find(|r| r.id == reversal.id) {
            *stored = reversal.clone();
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
struct MemUtility {
    bills: Arc<Mutex<HashMap<UtilityBillId, UtilityBill>>>,
    assignments: Arc<Mutex<Vec<LeaseUtility>>>,
    readings: Arc<Mutex<Vec<MeterReading>>>,
    allocations: Arc<Mutex<HashMap<UtilityBillId, Vec<UtilityAllocation>>>>,
}

impl MemUtility {
    fn insert_bill(&self, bill: UtilityBill) {
        self.bills.lock().unwrap().insert(bill.id, bill);
    }

    fn insert_assignment(&self, assignment: LeaseUtility) {
        self.assignments.lock().unwrap().push(assignment);
    }

    fn bill(&self, id: UtilityBillId) -> UtilityBill {
        self.bills.lock().unwrap().get(&id).unwrap().clone()
    }
}

impl DomainPort for MemUtility {}

#[async_trait]
impl UtilityStore for MemUtility {
    async fn load_bill(&self, id: UtilityBillId) -> Result<UtilityBill, PortError> {
        self.bills
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("UtilityBill", id))
    }

    async fn update_bill(&self, bill: &UtilityBill) -> Result<(), PortError> {
        self.bills.lock().unwrap().insert(bill.id, bill.clone());
        Ok(())
    }

    async fn load_assignments(&self, bill: &UtilityBill) -> Result<Vec<LeaseUtility>, PortError> {
        Ok(self
            .assignments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.utility_id == bill.utility_id)
            .cloned()
            .collect())
    }

    async fn load_assignment(&self, id: LeaseUtilityId) -> Result<LeaseUtility, PortError> {
        self.assignments
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| PortError::not_found("LeaseUtility", id))
    }

    async fn load_readings(
        &self,
        assignment_ids: &[LeaseUtilityId],
    ) -> Result<Vec<MeterReading>, PortError> {
        Ok(self
            .readings
            .lock()
            .unwrap()
            .iter()
            .filter(|r| assignment_ids.contains(&r.lease_utility_id))
            .cloned()
            .collect())
    }

    async fn append_reading(&self, reading: &MeterReading) -> Result<(), PortError> {
        self.readings.lock().unwrap().push(reading.clone());
        Ok(())
    }

    async fn replace_allocations(
        &self,
        bill: &UtilityBill,
        allocations: &[UtilityAllocation],
    ) -> Result<(), PortError> {
        self.bills.lock().unwrap().insert(bill.id, bill.clone());
        self.allocations
            .lock()
            .unwrap()
            .insert(bill.id, allocations.to_vec());
        Ok(())
    }

    async fn load_allocations(
        &self,
        bill_id: UtilityBillId,
    ) -> Result<Vec<UtilityAllocation>, PortError> {
        Ok(self
            .allocations
            .lock()
            .unwrap()
            .get(&bill_id)
            .cloned()
            .unwrap_or_default())
    }
}

fn orchestrator(
    ledger: MemLedger,
    billing: MemBilling,
    utility: MemUtility,
) -> PostingOrchestrator<MemLedger, MemBilling, MemUtility> {
    PostingOrchestrator::new(ledger, billing, utility, Timezone::default())
        .with_retry(RetryPolicy::new(3, Duration::from_millis(1)))
}

fn rent_invoice(total: rust_decimal::Decimal) -> Invoice {
    Invoice::new(
        LeaseId::new(),
        InvoiceType::Rent,
        Money::new(total, Currency::USD),
        NaiveDate::from_ymd_opt(2099, 1, 1).unwrap(),
    )
}

fn day(month: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, d).unwrap()
}

fn january_bill(total: rust_decimal::Decimal, method: SplitMethod, utility: UtilityId) -> UtilityBill {
    UtilityBill::new(
        PropertyId::new(),
        utility,
        "Metro Water",
        Money::new(total, Currency::USD),
        day(2, 1),
        day(2, 20),
        DateRange::new(day(1, 1), day(1, 31)).unwrap(),
        method,
    )
}

#[tokio::test]
async fn test_payment_applied_and_posted() {
    let (ledger, billing, utility) = (MemLedger::new(), MemBilling::default(), MemUtility::default());
    let invoice = rent_invoice(dec!(1500));
    let invoice_id = invoice.id;
    billing.insert_invoice(invoice);

    let orch = orchestrator(ledger.clone(), billing.clone(), utility);
    let payment = orch
        .apply_invoice_payment(
            invoice_id,
            Money::new(dec!(1500), Currency::USD),
            PaymentMethod::Cash,
            Some("OR-1".to_string()),
            None,
        )
        .await
        .unwrap();

    assert_eq!(billing.invoice(invoice_id).status, InvoiceStatus::Paid);
    assert_eq!(billing.payment(payment.id).posting_status, PostingStatus::Posted);
    assert_eq!(ledger.entry_count(), 1);
}

#[tokio::test]
async fn test_ledger_outage_keeps_payment() {
    let (ledger, billing, utility) = (MemLedger::new(), MemBilling::default(), MemUtility::default());
    let invoice = rent_invoice(dec!(800));
    let invoice_id = invoice.id;
    billing.insert_invoice(invoice);
    ledger.fail_next.store(10, Ordering::SeqCst);

    let orch = orchestrator(ledger.clone(), billing.clone(), utility);
    let payment = orch
        .apply_invoice_payment(
            invoice_id,
            Money::new(dec!(800), Currency::USD),
            PaymentMethod::Bank,
            None,
            None,
        )
        .await
        .unwrap();

    // Payment survives, invoice is paid, and the posting is queued as failed
    assert_eq!(billing.invoice(invoice_id).status, InvoiceStatus::Paid);
    assert_eq!(billing.payment(payment.id).posting_status, PostingStatus::Failed);
    assert_eq!(ledger.entry_count(), 0);
}

#[tokio::test]
async fn test_balance_conflict_retried_from_fresh_read() {
    let (ledger, billing, utility) = (MemLedger::new(), MemBilling::default(), MemUtility::default());
    let invoice = rent_invoice(dec!(500));
    let invoice_id = invoice.id;
    billing.insert_invoice(invoice);
    billing.conflicts_to_inject.store(2, Ordering::SeqCst);

    let orch = orchestrator(ledger, billing.clone(), utility);
    let payment = orch
        .apply_invoice_payment(
            invoice_id,
            Money::new(dec!(500), Currency::USD),
            PaymentMethod::Cash,
            None,
            None,
        )
        .await
        .unwrap();

    assert!(!payment.is_reversed);
    assert_eq!(billing.invoice(invoice_id).status, InvoiceStatus::Paid);
}

#[tokio::test]
async fn test_gateway_settlement_is_idempotent() {
    let (ledger, billing, utility) = (MemLedger::new(), MemBilling::default(), MemUtility::default());
    let invoice = rent_invoice(dec!(900));
    let invoice_id = invoice.id;
    billing.insert_invoice(invoice);

    let orch = orchestrator(ledger.clone(), billing.clone(), utility);

    // Card payment carries the gateway correlation id and stays pending
    // until the settlement webhook arrives
    let payment = orch
        .apply_invoice_payment(
            invoice_id,
            Money::new(dec!(900), Currency::USD),
            PaymentMethod::CreditCard,
            None,
            Some("pi_789".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(
        billing.payment(payment.id).gateway_reference.as_deref(),
        Some("pi_789")
    );
    assert_eq!(ledger.entry_count(), 0);

    let first = orch
        .settle_gateway_payment("pi_789", Utc::now())
        .await
        .unwrap();
    assert_eq!(first, Some(payment.id));
    assert_eq!(ledger.entry_count(), 1);

    // Re-delivery: no state change, no double posting
    let second = orch
        .settle_gateway_payment("pi_789", Utc::now())
        .await
        .unwrap();
    assert_eq!(second, Some(payment.id));
    assert_eq!(ledger.entry_count(), 1);

    // Unknown reference acknowledges without failing
    let unknown = orch
        .settle_gateway_payment("pi_does_not_exist", Utc::now())
        .await
        .unwrap();
    assert_eq!(unknown, None);
}

#[tokio::test]
async fn test_overlapping_settlement_deliveries_post_once() {
    let (ledger, billing, utility) = (MemLedger::new(), MemBilling::default(), MemUtility::default());
    let invoice = rent_invoice(dec!(450));
    let payment = Payment::new(
        invoice.id,
        Money::new(dec!(450), Currency::USD),
        PaymentMethod::CreditCard,
    )
    .with_gateway_reference("pi_dup");
    billing.insert_invoice(invoice);
    billing.insert_payment(payment.clone());

    let orch = orchestrator(ledger.clone(), billing.clone(), utility);

    let first = orch
        .settle_gateway_payment("pi_dup", Utc::now())
        .await
        .unwrap();
    assert_eq!(first, Some(payment.id));
    assert_eq!(ledger.entry_count(), 1);

    // A delivery that read the payment before the first one settled it
    // loses the conditional write and must not post a second receipt
    billing.stale_settlement_reads.store(1, Ordering::SeqCst);
    let second = orch
        .settle_gateway_payment("pi_dup", Utc::now())
        .await
        .unwrap();
    assert_eq!(second, Some(payment.id));
    assert_eq!(ledger.entry_count(), 1);
    assert!(billing.payment(payment.id).is_settled());
}

#[tokio::test]
async fn test_cash_reversal_posts_offsetting_entry() {
    let (ledger, billing, utility) = (MemLedger::new(), MemBilling::default(), MemUtility::default());
    let invoice = rent_invoice(dec!(1200));
    let invoice_id = invoice.id;
    billing.insert_invoice(invoice);

    let orch = orchestrator(ledger.clone(), billing.clone(), utility);
    let payment = orch
        .apply_invoice_payment(
            invoice_id,
            Money::new(dec!(1200), Currency::USD),
            PaymentMethod::Cash,
            None,
            None,
        )
        .await
        .unwrap();

    let reversal = orch
        .reverse_cash_payment(payment.id, ActorId::new(), "wrong tenant".to_string())
        .await
        .unwrap();

    assert!(reversal.journal_entry_id.is_some());
    assert_eq!(ledger.entry_count(), 2);
    assert!(billing.payment(payment.id).is_reversed);

    let invoice = billing.invoice(invoice_id);
    assert_eq!(invoice.status, InvoiceStatus::Pending);
    assert_eq!(invoice.balance.amount(), dec!(1200));
}

#[tokio::test]
async fn test_reversal_retry_posts_offset_once() {
    let (ledger, billing, utility) = (MemLedger::new(), MemBilling::default(), MemUtility::default());
    let invoice = rent_invoice(dec!(600));
    let invoice_id = invoice.id;
    billing.insert_invoice(invoice);

    let orch = orchestrator(ledger.clone(), billing.clone(), utility);
    let payment = orch
        .apply_invoice_payment(
            invoice_id,
            Money::new(dec!(600), Currency::USD),
            PaymentMethod::Cash,
            None,
            None,
        )
        .await
        .unwrap();
    assert_eq!(ledger.entry_count(), 1);

    // A transient failure on the reversal commit is retried; the retry
    // must not leave an extra offsetting entry behind
    billing.reversal_failures_to_inject.store(1, Ordering::SeqCst);
    let reversal = orch
        .reverse_cash_payment(payment.id, ActorId::new(), "duplicate receipt".to_string())
        .await
        .unwrap();

    assert!(reversal.journal_entry_id.is_some());
    assert_eq!(ledger.entry_count(), 2);
    assert_eq!(billing.reversals.lock().unwrap().len(), 1);
    assert!(billing.payment(payment.id).is_reversed);
}

#[tokio::test]
async fn test_reversal_survives_ledger_outage() {
    let (ledger, billing, utility) = (MemLedger::new(), MemBilling::default(), MemUtility::default());
    let invoice = rent_invoice(dec!(250));
    let invoice_id = invoice.id;
    billing.insert_invoice(invoice);

    let orch = orchestrator(ledger.clone(), billing.clone(), utility);
    let payment = orch
        .apply_invoice_payment(
            invoice_id,
            Money::new(dec!(250), Currency::USD),
            PaymentMethod::Cash,
            None,
            None,
        )
        .await
        .unwrap();

    ledger.fail_next.store(10, Ordering::SeqCst);
    let reversal = orch
        .reverse_cash_payment(payment.id, ActorId::new(), "keyed twice".to_string())
        .await
        .unwrap();

    // The reversal commits even though the offset could not post; the
    // missing journal entry id marks it for the posting sweep
    assert!(reversal.journal_entry_id.is_none());
    assert_eq!(ledger.entry_count(), 1);
    assert!(billing.payment(payment.id).is_reversed);
    assert_eq!(billing.invoice(invoice_id).balance.amount(), dec!(250));
}

#[tokio::test]
async fn test_electronic_payment_reversal_rejected() {
    let (ledger, billing, utility) = (MemLedger::new(), MemBilling::default(), MemUtility::default());
    let invoice = rent_invoice(dec!(300));
    let payment = Payment::new(
        invoice.id,
        Money::new(dec!(300), Currency::USD),
        PaymentMethod::CreditCard,
    );
    billing.insert_invoice(invoice);
    billing.insert_payment(payment.clone());

    let orch = orchestrator(ledger.clone(), billing, utility);
    let err = orch
        .reverse_cash_payment(payment.id, ActorId::new(), "nope".to_string())
        .await
        .unwrap_err();

    assert_eq!(err.code(), "METHOD_NOT_REVERSIBLE");
    assert_eq!(ledger.entry_count(), 0);
}

#[tokio::test]
async fn test_bill_allocation_and_posting_flow() {
    let (ledger, billing, utility) = (MemLedger::new(), MemBilling::default(), MemUtility::default());
    let utility_id = UtilityId::new();
    let bill = january_bill(dec!(300), SplitMethod::Equal, utility_id);
    let bill_id = bill.id;
    utility.insert_bill(bill);
    for _ in 0..3 {
        utility.insert_assignment(LeaseUtility::new(LeaseId::new(), UnitId::new(), utility_id));
    }

    let orch = orchestrator(ledger.clone(), billing, utility.clone());

    let (allocated_bill, allocations) = orch.allocate_bill(bill_id).await.unwrap();
    assert_eq!(allocated_bill.status, BillStatus::Approved);
    assert_eq!(allocations.len(), 3);

    let entry_id = orch.post_utility_bill(bill_id).await.unwrap();
    assert_eq!(utility.bill(bill_id).status, BillStatus::Posted);
    assert_eq!(ledger.entry_count(), 1);

    // Posted bills reject a second posting
    let err = orch.post_utility_bill(bill_id).await.unwrap_err();
    assert_eq!(err.code(), "INVALID_BILL_STATUS");
    let _ = entry_id;
}

#[tokio::test]
async fn test_unapproved_bill_cannot_post() {
    let (ledger, billing, utility) = (MemLedger::new(), MemBilling::default(), MemUtility::default());
    let utility_id = UtilityId::new();
    let bill = january_bill(dec!(100), SplitMethod::Equal, utility_id);
    let bill_id = bill.id;
    utility.insert_bill(bill);

    let orch = orchestrator(ledger, billing, utility);
    let err = orch.post_utility_bill(bill_id).await.unwrap_err();
    assert_eq!(err.code(), "INVALID_BILL_STATUS");
}

#[tokio::test]
async fn test_reading_recorded_through_orchestrator() {
    let (ledger, billing, utility) = (MemLedger::new(), MemBilling::default(), MemUtility::default());
    let assignment = LeaseUtility::new(LeaseId::new(), UnitId::new(), UtilityId::new());
    let assignment_id = assignment.id;
    utility.insert_assignment(assignment);

    let orch = orchestrator(ledger, billing, utility.clone());

    orch.record_reading(ReadingRequest {
        lease_utility_id: assignment_id,
        value: dec!(100),
        date: Some(day(1, 1)),
    })
    .await
    .unwrap();

    // A lower later value violates monotonicity against the stored log
    let err = orch
        .record_reading(ReadingRequest {
            lease_utility_id: assignment_id,
            value: dec!(90),
            date: Some(day(1, 15)),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NON_MONOTONIC_READING");

    assert_eq!(utility.readings.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_assignment_maps_to_domain_error() {
    let (ledger, billing, utility) = (MemLedger::new(), MemBilling::default(), MemUtility::default());
    let orch = orchestrator(ledger, billing, utility);

    let err = orch
        .record_reading(ReadingRequest {
            lease_utility_id: LeaseUtilityId::new(),
            value: dec!(5),
            date: None,
        })
        .await
        .unwrap_err();

    assert_eq!(err.code(), "LEASE_UTILITY_NOT_FOUND");
}

#[tokio::test]
async fn test_tampered_allocations_rejected_at_post_time() {
    let (ledger, billing, utility) = (MemLedger::new(), MemBilling::default(), MemUtility::default());
    let utility_id = UtilityId::new();
    let bill = january_bill(dec!(300), SplitMethod::Equal, utility_id);
    let bill_id = bill.id;
    utility.insert_bill(bill);
    for _ in 0..3 {
        utility.insert_assignment(LeaseUtility::new(LeaseId::new(), UnitId::new(), utility_id));
    }

    let orch = orchestrator(ledger, billing, utility.clone());
    orch.allocate_bill(bill_id).await.unwrap();

    // Drop one allocation behind the orchestrator's back
    utility
        .allocations
        .lock()
        .unwrap()
        .get_mut(&bill_id)
        .unwrap()
        .pop();

    let err = orch.post_utility_bill(bill_id).await.unwrap_err();
    assert!(matches!(err, PostingError::AllocationSumMismatch { .. }));
    assert_ne!(utility.bill(bill_id).status, BillStatus::Posted);
}
