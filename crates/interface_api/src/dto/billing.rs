//! Invoice and payment DTOs

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{ActorId, InvoiceId, JournalEntryId, LeaseId, PaymentId, ReversalId};
use domain_billing::invoice::{Invoice, InvoiceStatus, InvoiceType};
use domain_billing::payment::{Payment, PaymentMethod, PaymentReversal, PostingStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ApplyPaymentRequest {
    #[validate(custom(function = "super::positive_amount"))]
    pub amount: Decimal,
    /// ISO 4217 code; must match the invoice currency
    #[validate(length(min = 3, max = 3))]
    pub currency: String,
    pub method: PaymentMethod,
    #[validate(length(max = 128))]
    pub reference: Option<String>,
    /// Gateway correlation id; required for card payments so the
    /// settlement webhook can find them
    #[validate(length(min = 1, max = 128))]
    pub gateway_reference: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReversePaymentRequest {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
    /// Back-office user performing the reversal
    pub reversed_by: Uuid,
}

/// Settlement notification pushed by the card gateway
#[derive(Debug, Deserialize, Validate)]
pub struct GatewaySettlementRequest {
    #[validate(length(min = 1, max = 128))]
    pub gateway_reference: String,
    pub settled_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: InvoiceId,
    pub lease_id: LeaseId,
    pub invoice_type: InvoiceType,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub balance: Decimal,
    pub currency: String,
    pub status: InvoiceStatus,
    pub due_date: NaiveDate,
    pub updated_at: DateTime<Utc>,
}

impl From<&Invoice> for InvoiceResponse {
    fn from(invoice: &Invoice) -> Self {
        Self {
            id: invoice.id,
            lease_id: invoice.lease_id,
            invoice_type: invoice.invoice_type,
            total_amount: invoice.total_amount.amount(),
            amount_paid: invoice.amount_paid.amount(),
            balance: invoice.balance.amount(),
            currency: invoice.total_amount.currency().code().to_string(),
            status: invoice.status,
            due_date: invoice.due_date,
            updated_at: invoice.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: PaymentId,
    pub invoice_id: InvoiceId,
    pub amount: Decimal,
    pub currency: String,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub gateway_reference: Option<String>,
    pub settled_at: Option<DateTime<Utc>>,
    pub is_reversed: bool,
    pub posting_status: PostingStatus,
    pub received_at: DateTime<Utc>,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id,
            invoice_id: payment.invoice_id,
            amount: payment.amount.amount(),
            currency: payment.amount.currency().code().to_string(),
            method: payment.method,
            reference: payment.reference.clone(),
            gateway_reference: payment.gateway_reference.clone(),
            settled_at: payment.settled_at,
            is_reversed: payment.is_reversed,
            posting_status: payment.posting_status,
            received_at: payment.received_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReversalResponse {
    pub id: ReversalId,
    pub payment_id: PaymentId,
    pub invoice_id: InvoiceId,
    pub amount: Decimal,
    pub currency: String,
    pub reason: String,
    pub reversed_by: ActorId,
    pub reversed_at: DateTime<Utc>,
    pub journal_entry_id: Option<JournalEntryId>,
}

impl From<&PaymentReversal> for ReversalResponse {
    fn from(reversal: &PaymentReversal) -> Self {
        Self {
            id: reversal.id,
            payment_id: reversal.payment_id,
            invoice_id: reversal.invoice_id,
            amount: reversal.amount.amount(),
            currency: reversal.amount.currency().code().to_string(),
            reason: reversal.reason.clone(),
            reversed_by: reversal.reversed_by,
            reversed_at: reversal.reversed_at,
            journal_entry_id: reversal.journal_entry_id,
        }
    }
}

/// Created payment together with the invoice's refreshed totals
#[derive(Debug, Serialize)]
pub struct ApplyPaymentResponse {
    pub payment: PaymentResponse,
    pub invoice_status: InvoiceStatus,
    pub total_paid: Decimal,
    pub remaining: Decimal,
}

#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    /// None when the reference does not match any pending payment
    pub payment_id: Option<PaymentId>,
    pub outcome: String,
}
