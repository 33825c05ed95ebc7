//! Posting orchestrator
//!
//! Coordinates billing and utility writes with their ledger postings.
//! Two rules shape every flow here:
//!
//! - A received payment is a real-world fact. If the ledger posting fails
//!   after the payment is stored, the payment stands with a failed
//!   posting status and is retried later; it is never rolled back.
//! - Invoice balance checks are optimistic. The store conditions the
//!   final write on the balance still holding; a lost race surfaces as a
//!   conflict and the whole operation is retried from a fresh read.

use chrono::{DateTime, Utc};
use tracing::{error, info};

use core_kernel::{ActorId, JournalEntryId, Money, PaymentId, ReadingId, Timezone, UtilityBillId};
use domain_billing::{
    apply_payment, refresh_invoice, reverse_payment, Payment, PaymentMethod, PaymentReversal,
};
use domain_ledger::{AccountCode, EntryDraft, LineDimensions, LineDraft};
use domain_utility::{
    calculate_allocations, BillStatus, MeterLog, MeterReading, UtilityAllocation, UtilityBill,
};

use crate::error::PostingError;
use crate::ports::{BillingStore, LedgerStore, ReadingRequest, UtilityStore};
use crate::retry::RetryPolicy;

/// Drives multi-store posting flows
pub struct PostingOrchestrator<L, B, U> {
    ledger: L,
    billing: B,
    utility: U,
    retry: RetryPolicy,
    timezone: Timezone,
}

impl<L, B, U> PostingOrchestrator<L, B, U>
where
    L: LedgerStore,
    B: BillingStore,
    U: UtilityStore,
{
    pub fn new(ledger: L, billing: B, utility: U, timezone: Timezone) -> Self {
        Self {
            ledger,
            billing,
            utility,
            retry: RetryPolicy::default(),
            timezone,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Applies a payment to an invoice and posts it to the ledger
    ///
    /// The balance check and the conditional write run under bounded
    /// retry; the ledger posting afterwards does not roll the payment
    /// back on failure.
    pub async fn apply_invoice_payment(
        &self,
        invoice_id: core_kernel::InvoiceId,
        amount: Money,
        method: PaymentMethod,
        reference: Option<String>,
        gateway_reference: Option<String>,
    ) -> Result<Payment, PostingError> {
        let today = self.timezone.local_date(Utc::now());

        let payment = self
            .retry
            .run("apply_invoice_payment", |_| {
                let reference = reference.clone();
                let gateway_reference = gateway_reference.clone();
                async move {
                    let mut invoice = self.billing.load_invoice(invoice_id).await?;
                    let payments = self.billing.load_payments(invoice_id).await?;

                    let mut payment =
                        apply_payment(&mut invoice, &payments, amount, method, reference, today)?;
                    if let Some(gateway_reference) = gateway_reference {
                        payment = payment.with_gateway_reference(gateway_reference);
                    }

                    self.billing.save_applied_payment(&invoice, &payment).await?;
                    Ok(payment)
                }
            })
            .await?;

        // Electronic payments post on gateway settlement, cash and bank
        // post immediately.
        if payment.method != PaymentMethod::CreditCard {
            self.post_receipt_entry(&payment).await;
        }

        Ok(payment)
    }

    /// Handles a gateway settlement confirmation
    ///
    /// Idempotent under webhook re-delivery: the settlement timestamp is
    /// written conditionally, so of any number of concurrent deliveries
    /// exactly one wins the write and posts the receipt. Unknown
    /// references return `None` so the webhook can acknowledge without
    /// failing.
    pub async fn settle_gateway_payment(
        &self,
        gateway_reference: &str,
        settled_at: DateTime<Utc>,
    ) -> Result<Option<PaymentId>, PostingError> {
        let Some(mut payment) = self
            .billing
            .find_by_gateway_reference(gateway_reference)
            .await?
        else {
            info!(gateway_reference, "Settlement for unknown payment, ignoring");
            return Ok(None);
        };

        if payment.is_settled() {
            info!(payment_id = %payment.id, "Settlement re-delivered, no-op");
            return Ok(Some(payment.id));
        }

        payment.settle(settled_at);
        if !self.billing.settle_payment(&payment).await? {
            info!(payment_id = %payment.id, "Lost settlement race, no-op");
            return Ok(Some(payment.id));
        }
        self.post_receipt_entry(&payment).await;

        Ok(Some(payment.id))
    }

    /// Reverses a cash payment
    ///
    /// The reversal record, the reversed payment, and the invoice's
    /// refreshed totals commit under bounded retry first; the offsetting
    /// entry (debit receivable, credit cash) posts exactly once after
    /// the commit. Like a failed receipt posting, a bookkeeping outage
    /// leaves the reversal standing with no journal entry id.
    pub async fn reverse_cash_payment(
        &self,
        payment_id: PaymentId,
        actor: ActorId,
        reason: String,
    ) -> Result<PaymentReversal, PostingError> {
        let today = self.timezone.local_date(Utc::now());

        let mut reversal = self
            .retry
            .run("reverse_cash_payment", |_| {
                let reason = reason.clone();
                async move {
                    let mut payment = self.billing.load_payment(payment_id).await?;
                    let reversal = reverse_payment(&mut payment, actor, reason, Utc::now())?;

                    let mut invoice = self.billing.load_invoice(payment.invoice_id).await?;
                    let mut payments = self.billing.load_payments(payment.invoice_id).await?;
                    if let Some(stored) = payments.iter_mut().find(|p| p.id == payment.id) {
                        *stored = payment.clone();
                    }
                    refresh_invoice(&mut invoice, &payments, today)?;

                    self.billing
                        .save_reversal(&invoice, &payment, &reversal)
                        .await?;

                    Ok(reversal)
                }
            })
            .await?;

        let draft = EntryDraft::new(format!("Reversal of payment {}", reversal.payment_id))
            .with_reference(format!("reversal:{}", reversal.id))
            .debit(AccountCode::AccountsReceivable, reversal.amount)
            .credit(AccountCode::Cash, reversal.amount);

        match self.ledger.post_entry(draft).await {
            Ok(entry_id) => {
                reversal.journal_entry_id = Some(entry_id);
                if let Err(e) = self.billing.update_reversal(&reversal).await {
                    error!(reversal_id = %reversal.id, error = %e, "Failed to stamp journal entry on reversal");
                }
                info!(
                    payment_id = %reversal.payment_id,
                    reversal_id = %reversal.id,
                    journal_entry = %entry_id,
                    "Cash payment reversed and offset posted"
                );
            }
            Err(e) => {
                error!(
                    reversal_id = %reversal.id,
                    error = %e,
                    "Offsetting entry failed, reversal kept without journal entry"
                );
            }
        }

        Ok(reversal)
    }

    /// Runs allocation for a bill and persists the outcome
    pub async fn allocate_bill(
        &self,
        bill_id: UtilityBillId,
    ) -> Result<(UtilityBill, Vec<UtilityAllocation>), PostingError> {
        let mut bill = self.utility.load_bill(bill_id).await?;
        bill.advance(BillStatus::Processing)?;

        let assignments = self.utility.load_assignments(&bill).await?;
        let assignment_ids: Vec<_> = assignments.iter().map(|a| a.id).collect();
        let readings = self.utility.load_readings(&assignment_ids).await?;
        let log = MeterLog::from_readings(readings);

        let outcome = calculate_allocations(&bill, &assignments, &log)?;
        bill.advance(outcome.resulting_status())?;

        self.utility
            .replace_allocations(&bill, &outcome.allocations)
            .await?;

        Ok((bill, outcome.allocations))
    }

    /// Posts an approved utility bill to the ledger
    ///
    /// Re-verifies the conservation invariant at post time: the stored
    /// allocations must still sum to the bill total. The entry debits
    /// utility expense per allocation (tagged with unit and lease
    /// dimensions) and credits accounts payable for the total.
    pub async fn post_utility_bill(
        &self,
        bill_id: UtilityBillId,
    ) -> Result<JournalEntryId, PostingError> {
        let mut bill = self.utility.load_bill(bill_id).await?;

        if bill.status != BillStatus::Approved {
            return Err(domain_utility::UtilityError::InvalidBillStatus {
                bill_id: bill.id.to_string(),
                status: bill.status.to_string(),
                operation: "ledger posting",
            }
            .into());
        }

        let allocations = self.utility.load_allocations(bill_id).await?;
        let currency = bill.total_amount.currency();
        let allocated = Money::sum(allocations.iter().map(|a| &a.amount), currency)
            .map_err(|e| PostingError::Store(core_kernel::PortError::internal(e.to_string())))?;

        if allocated.amount() != bill.total_amount.amount() {
            return Err(PostingError::AllocationSumMismatch {
                bill_total: bill.total_amount.amount(),
                allocated: allocated.amount(),
            });
        }

        let mut draft = EntryDraft::new(format!(
            "Utility bill {} from {}",
            bill.id, bill.provider_name
        ))
        .dated(bill.bill_date)
        .with_reference(format!("utility_bill:{}", bill.id));

        for allocation in &allocations {
            draft = draft.line(
                LineDraft::debit(AccountCode::UtilityExpense, allocation.amount).with_dimensions(
                    LineDimensions {
                        property_id: Some(bill.property_id),
                        unit_id: Some(allocation.unit_id),
                        lease_id: Some(allocation.lease_id),
                        tenant_id: None,
                    },
                ),
            );
        }
        draft = draft.credit(AccountCode::AccountsPayable, bill.total_amount);

        let entry_id = self.ledger.post_entry(draft).await?;

        bill.advance(BillStatus::Posted)?;
        self.utility.update_bill(&bill).await?;

        info!(bill_id = %bill.id, journal_entry = %entry_id, "Utility bill posted");
        Ok(entry_id)
    }

    /// Records a meter reading against the append-only log
    pub async fn record_reading(&self, request: ReadingRequest) -> Result<ReadingId, PostingError> {
        let assignment = self
            .utility
            .load_assignment(request.lease_utility_id)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    domain_utility::UtilityError::LeaseUtilityNotFound(
                        request.lease_utility_id.to_string(),
                    )
                    .into()
                } else {
                    PostingError::Store(e)
                }
            })?;

        let readings = self.utility.load_readings(&[assignment.id]).await?;
        let mut log = MeterLog::from_readings(readings);

        let date = request
            .date
            .unwrap_or_else(|| self.timezone.local_date(Utc::now()));
        let reading_id = log.record(&assignment, request.value, date)?;

        let reading = log
            .readings(assignment.id)
            .iter()
            .find(|r| r.id == reading_id)
            .cloned()
            .map(Ok::<MeterReading, PostingError>)
            .unwrap_or_else(|| {
                Err(PostingError::Store(core_kernel::PortError::internal(
                    "recorded reading missing from log",
                )))
            })?;

        self.utility.append_reading(&reading).await?;
        Ok(reading_id)
    }

    /// Posts the receipt entry for a stored payment
    ///
    /// Failure is recorded on the payment for later retry, never
    /// propagated; the payment itself must survive a bookkeeping outage.
    async fn post_receipt_entry(&self, payment: &Payment) {
        let mut payment = payment.clone();
        let draft = EntryDraft::new(format!("Payment {} received", payment.id))
            .with_reference(format!("payment:{}", payment.id))
            .debit(AccountCode::Cash, payment.amount)
            .credit(AccountCode::AccountsReceivable, payment.amount);

        match self.ledger.post_entry(draft).await {
            Ok(entry_id) => {
                payment.mark_posted();
                info!(payment_id = %payment.id, journal_entry = %entry_id, "Payment posted to ledger");
            }
            Err(e) => {
                payment.mark_posting_failed();
                error!(payment_id = %payment.id, error = %e, "Ledger posting failed, payment kept for retry");
            }
        }

        if let Err(e) = self.billing.update_payment(&payment).await {
            error!(payment_id = %payment.id, error = %e, "Failed to persist posting status");
        }
    }
}
