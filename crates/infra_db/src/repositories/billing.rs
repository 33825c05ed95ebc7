//! Billing repository
//!
//! Persists invoices, payments, and reversal records. The payment
//! application write is optimistic: the invoice update is conditioned on
//! the previously-read totals still holding, and a lost race surfaces as
//! a stale-write error the orchestrator retries from a fresh read.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::{Currency, DomainPort, InvoiceId, Money, PaymentId, PortError};
use domain_billing::{
    Invoice, InvoiceStatus, InvoiceType, Payment, PaymentMethod, PaymentReversal, PostingStatus,
};
use domain_posting::BillingStore;

use crate::error::DatabaseError;

fn parse_currency(code: &str) -> Result<Currency, DatabaseError> {
    Currency::from_str(code).map_err(|e| DatabaseError::MappingError(e.to_string()))
}

fn invoice_type_to_str(t: InvoiceType) -> &'static str {
    match t {
        InvoiceType::Rent => "RENT",
        InvoiceType::Utility => "UTILITY",
    }
}

fn invoice_type_from_str(s: &str) -> Result<InvoiceType, DatabaseError> {
    match s {
        "RENT" => Ok(InvoiceType::Rent),
        "UTILITY" => Ok(InvoiceType::Utility),
        other => Err(DatabaseError::MappingError(format!(
            "Unknown invoice type: {other}"
        ))),
    }
}

fn invoice_status_to_str(s: InvoiceStatus) -> &'static str {
    match s {
        InvoiceStatus::Pending => "PENDING",
        InvoiceStatus::Paid => "PAID",
        InvoiceStatus::Overdue => "OVERDUE",
    }
}

fn invoice_status_from_str(s: &str) -> Result<InvoiceStatus, DatabaseError> {
    match s {
        "PENDING" => Ok(InvoiceStatus::Pending),
        "PAID" => Ok(InvoiceStatus::Paid),
        "OVERDUE" => Ok(InvoiceStatus::Overdue),
        other => Err(DatabaseError::MappingError(format!(
            "Unknown invoice status: {other}"
        ))),
    }
}

fn method_to_str(m: PaymentMethod) -> &'static str {
    match m {
        PaymentMethod::Cash => "CASH",
        PaymentMethod::Bank => "BANK",
        PaymentMethod::CreditCard => "CREDIT_CARD",
    }
}

fn method_from_str(s: &str) -> Result<PaymentMethod, DatabaseError> {
    match s {
        "CASH" => Ok(PaymentMethod::Cash),
        "BANK" => Ok(PaymentMethod::Bank),
        "CREDIT_CARD" => Ok(PaymentMethod::CreditCard),
        other => Err(DatabaseError::MappingError(format!(
            "Unknown payment method: {other}"
        ))),
    }
}

fn posting_status_to_str(s: PostingStatus) -> &'static str {
    match s {
        PostingStatus::Pending => "PENDING",
        PostingStatus::Posted => "POSTED",
        PostingStatus::Failed => "FAILED",
    }
}

fn posting_status_from_str(s: &str) -> Result<PostingStatus, DatabaseError> {
    match s {
        "PENDING" => Ok(PostingStatus::Pending),
        "POSTED" => Ok(PostingStatus::Posted),
        "FAILED" => Ok(PostingStatus::Failed),
        other => Err(DatabaseError::MappingError(format!(
            "Unknown posting status: {other}"
        ))),
    }
}

#[derive(Debug, FromRow)]
struct InvoiceRow {
    id: Uuid,
    lease_id: Uuid,
    invoice_type: String,
    total_amount: Decimal,
    amount_paid: Decimal,
    balance: Decimal,
    currency: String,
    status: String,
    due_date: NaiveDate,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InvoiceRow {
    fn into_domain(self) -> Result<Invoice, DatabaseError> {
        let currency = parse_currency(&self.currency)?;
        Ok(Invoice {
            id: self.id.into(),
            lease_id: self.lease_id.into(),
            invoice_type: invoice_type_from_str(&self.invoice_type)?,
            total_amount: Money::new(self.total_amount, currency),
            amount_paid: Money::new(self.amount_paid, currency),
            balance: Money::new(self.balance, currency),
            status: invoice_status_from_str(&self.status)?,
            due_date: self.due_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct PaymentRow {
    id: Uuid,
    invoice_id: Uuid,
    amount: Decimal,
    currency: String,
    method: String,
    reference: Option<String>,
    gateway_reference: Option<String>,
    settled_at: Option<DateTime<Utc>>,
    is_reversed: bool,
    reversed_at: Option<DateTime<Utc>>,
    reversed_by: Option<Uuid>,
    reversal_reason: Option<String>,
    posting_status: String,
    received_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl PaymentRow {
    fn into_domain(self) -> Result<Payment, DatabaseError> {
        let currency = parse_currency(&self.currency)?;
        Ok(Payment {
            id: self.id.into(),
            invoice_id: self.invoice_id.into(),
            amount: Money::new(self.amount, currency),
            method: method_from_str(&self.method)?,
            reference: self.reference,
            gateway_reference: self.gateway_reference,
            settled_at: self.settled_at,
            is_reversed: self.is_reversed,
            reversed_at: self.reversed_at,
            reversed_by: self.reversed_by.map(Into::into),
            reversal_reason: self.reversal_reason,
            posting_status: posting_status_from_str(&self.posting_status)?,
            received_at: self.received_at,
            created_at: self.created_at,
        })
    }
}

const INVOICE_COLUMNS: &str = "id, lease_id, invoice_type, total_amount, amount_paid, balance, \
     currency, status, due_date, created_at, updated_at";

const PAYMENT_COLUMNS: &str = "id, invoice_id, amount, currency, method, reference, \
     gateway_reference, settled_at, is_reversed, reversed_at, reversed_by, reversal_reason, \
     posting_status, received_at, created_at";

/// Repository for invoices and payments
#[derive(Debug, Clone)]
pub struct BillingRepository {
    pool: PgPool,
}

impl BillingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a new invoice
    pub async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, lease_id, invoice_type, total_amount, amount_paid, balance,
                currency, status, due_date, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(Uuid::from(invoice.id))
        .bind(Uuid::from(invoice.lease_id))
        .bind(invoice_type_to_str(invoice.invoice_type))
        .bind(invoice.total_amount.amount())
        .bind(invoice.amount_paid.amount())
        .bind(invoice.balance.amount())
        .bind(invoice.currency().code())
        .bind(invoice_status_to_str(invoice.status))
        .bind(invoice.due_date)
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn fetch_invoice(&self, id: InvoiceId) -> Result<Invoice, DatabaseError> {
        let row: Option<InvoiceRow> =
            sqlx::query_as(&format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1"))
                .bind(Uuid::from(id))
                .fetch_optional(&self.pool)
                .await?;

        row.ok_or_else(|| DatabaseError::not_found("Invoice", id))?
            .into_domain()
    }

    pub async fn fetch_payments(&self, invoice_id: InvoiceId) -> Result<Vec<Payment>, DatabaseError> {
        let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE invoice_id = $1 ORDER BY received_at"
        ))
        .bind(Uuid::from(invoice_id))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PaymentRow::into_domain).collect()
    }

    pub async fn fetch_payment(&self, id: PaymentId) -> Result<Payment, DatabaseError> {
        let row: Option<PaymentRow> =
            sqlx::query_as(&format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"))
                .bind(Uuid::from(id))
                .fetch_optional(&self.pool)
                .await?;

        row.ok_or_else(|| DatabaseError::not_found("Payment", id))?
            .into_domain()
    }

    async fn insert_payment_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        payment: &Payment,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, invoice_id, amount, currency, method, reference,
                gateway_reference, settled_at, is_reversed, reversed_at,
                reversed_by, reversal_reason, posting_status, received_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(Uuid::from(payment.id))
        .bind(Uuid::from(payment.invoice_id))
        .bind(payment.amount.amount())
        .bind(payment.amount.currency().code())
        .bind(method_to_str(payment.method))
        .bind(&payment.reference)
        .bind(&payment.gateway_reference)
        .bind(payment.settled_at)
        .bind(payment.is_reversed)
        .bind(payment.reversed_at)
        .bind(payment.reversed_by.map(Uuid::from))
        .bind(&payment.reversal_reason)
        .bind(posting_status_to_str(payment.posting_status))
        .bind(payment.received_at)
        .bind(payment.created_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Updates the invoice's derived totals, conditioned on the prior state
    ///
    /// `expected_paid` is the amount_paid value the caller read before
    /// recomputing. Zero rows affected means another writer got there
    /// first; the caller retries from a fresh read.
    async fn update_invoice_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        invoice: &Invoice,
        expected_paid: Decimal,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET amount_paid = $2, balance = $3, status = $4, updated_at = $5
            WHERE id = $1 AND amount_paid = $6
            "#,
        )
        .bind(Uuid::from(invoice.id))
        .bind(invoice.amount_paid.amount())
        .bind(invoice.balance.amount())
        .bind(invoice_status_to_str(invoice.status))
        .bind(invoice.updated_at)
        .bind(expected_paid)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::StaleWrite(format!(
                "invoice {} totals moved since read",
                invoice.id
            )));
        }
        Ok(())
    }
}

impl DomainPort for BillingRepository {}

#[async_trait]
impl BillingStore for BillingRepository {
    async fn load_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError> {
        self.fetch_invoice(id).await.map_err(PortError::from)
    }

    async fn load_payments(&self, invoice_id: InvoiceId) -> Result<Vec<Payment>, PortError> {
        self.fetch_payments(invoice_id).await.map_err(PortError::from)
    }

    async fn load_payment(&self, id: PaymentId) -> Result<Payment, PortError> {
        self.fetch_payment(id).await.map_err(PortError::from)
    }

    async fn find_by_gateway_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Payment>, PortError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE gateway_reference = $1"
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::from(DatabaseError::from(e)))?;

        row.map(PaymentRow::into_domain)
            .transpose()
            .map_err(PortError::from)
    }

    async fn save_applied_payment(
        &self,
        invoice: &Invoice,
        payment: &Payment,
    ) -> Result<(), PortError> {
        // The invoice's amount_paid before this application: the new
        // payment is the only non-reversed payment not yet reflected.
        let expected_paid = invoice.amount_paid.amount() - payment.amount.amount();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::from(DatabaseError::from(e)))?;

        Self::update_invoice_tx(&mut tx, invoice, expected_paid)
            .await
            .map_err(PortError::from)?;
        Self::insert_payment_tx(&mut tx, payment)
            .await
            .map_err(PortError::from)?;

        tx.commit()
            .await
            .map_err(|e| PortError::from(DatabaseError::from(e)))?;
        Ok(())
    }

    async fn update_payment(&self, payment: &Payment) -> Result<(), PortError> {
        sqlx::query(
            r#"
            UPDATE payments
            SET settled_at = $2, is_reversed = $3, reversed_at = $4,
                reversed_by = $5, reversal_reason = $6, posting_status = $7
            WHERE id = $1
            "#,
        )
        .bind(Uuid::from(payment.id))
        .bind(payment.settled_at)
        .bind(payment.is_reversed)
        .bind(payment.reversed_at)
        .bind(payment.reversed_by.map(Uuid::from))
        .bind(&payment.reversal_reason)
        .bind(posting_status_to_str(payment.posting_status))
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::from(DatabaseError::from(e)))?;
        Ok(())
    }

    async fn settle_payment(&self, payment: &Payment) -> Result<bool, PortError> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET settled_at = $2
            WHERE id = $1 AND settled_at IS NULL
            "#,
        )
        .bind(Uuid::from(payment.id))
        .bind(payment.settled_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::from(DatabaseError::from(e)))?;

        Ok(result.rows_affected() == 1)
    }

    async fn save_reversal(
        &self,
        invoice: &Invoice,
        payment: &Payment,
        reversal: &PaymentReversal,
    ) -> Result<(), PortError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::from(DatabaseError::from(e)))?;

        sqlx::query(
            r#"
            INSERT INTO payment_reversals (
                id, payment_id, invoice_id, amount, currency, reason,
                reversed_by, reversed_at, journal_entry_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(Uuid::from(reversal.id))
        .bind(Uuid::from(reversal.payment_id))
        .bind(Uuid::from(reversal.invoice_id))
        .bind(reversal.amount.amount())
        .bind(reversal.amount.currency().code())
        .bind(&reversal.reason)
        .bind(Uuid::from(reversal.reversed_by))
        .bind(reversal.reversed_at)
        .bind(reversal.journal_entry_id.map(Uuid::from))
        .execute(&mut *tx)
        .await
        .map_err(|e| PortError::from(DatabaseError::from(e)))?;

        sqlx::query(
            r#"
            UPDATE payments
            SET is_reversed = TRUE, reversed_at = $2, reversed_by = $3, reversal_reason = $4
            WHERE id = $1 AND is_reversed = FALSE
            "#,
        )
        .bind(Uuid::from(payment.id))
        .bind(payment.reversed_at)
        .bind(payment.reversed_by.map(Uuid::from))
        .bind(&payment.reversal_reason)
        .execute(&mut *tx)
        .await
        .map_err(|e| PortError::from(DatabaseError::from(e)))?;

        sqlx::query(
            r#"
            UPDATE invoices
            SET amount_paid = $2, balance = $3, status = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(Uuid::from(invoice.id))
        .bind(invoice.amount_paid.amount())
        .bind(invoice.balance.amount())
        .bind(invoice_status_to_str(invoice.status))
        .bind(invoice.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| PortError::from(DatabaseError::from(e)))?;

        tx.commit()
            .await
            .map_err(|e| PortError::from(DatabaseError::from(e)))?;
        Ok(())
    }

    async fn update_reversal(&self, reversal: &PaymentReversal) -> Result<(), PortError> {
        sqlx::query("UPDATE payment_reversals SET journal_entry_id = $2 WHERE id = $1")
            .bind(Uuid::from(reversal.id))
            .bind(reversal.journal_entry_id.map(Uuid::from))
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::from(DatabaseError::from(e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_string_roundtrips() {
        for t in [InvoiceType::Rent, InvoiceType::Utility] {
            assert_eq!(invoice_type_from_str(invoice_type_to_str(t)).unwrap(), t);
        }
        for s in [
            InvoiceStatus::Pending,
            InvoiceStatus::Paid,
            InvoiceStatus::Overdue,
        ] {
            assert_eq!(invoice_status_from_str(invoice_status_to_str(s)).unwrap(), s);
        }
        for m in [
            PaymentMethod::Cash,
            PaymentMethod::Bank,
            PaymentMethod::CreditCard,
        ] {
            assert_eq!(method_from_str(method_to_str(m)).unwrap(), m);
        }
        for p in [
            PostingStatus::Pending,
            PostingStatus::Posted,
            PostingStatus::Failed,
        ] {
            assert_eq!(
                posting_status_from_str(posting_status_to_str(p)).unwrap(),
                p
            );
        }
        assert!(method_from_str("WIRE").is_err());
    }
}
