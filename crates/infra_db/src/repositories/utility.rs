//! Utility repository
//!
//! Persists utility bills, lease-utility assignments, the append-only
//! reading log, and the allocations an allocation run produces. Readings
//! are insert-only at the SQL level too; there is no update path.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::{Currency, DateRange, DomainPort, LeaseUtilityId, Money, PortError, UtilityBillId};
use domain_posting::UtilityStore;
use domain_utility::{
    BillStatus, LeaseStatus, LeaseUtility, MeterReading, SplitMethod, UtilityAllocation,
    UtilityBill,
};

use crate::error::DatabaseError;

fn parse_currency(code: &str) -> Result<Currency, DatabaseError> {
    Currency::from_str(code).map_err(|e| DatabaseError::MappingError(e.to_string()))
}

fn split_method_to_str(m: SplitMethod) -> &'static str {
    match m {
        SplitMethod::Equal => "EQUAL",
        SplitMethod::Metered => "METERED",
        SplitMethod::Percentage => "PERCENTAGE",
        SplitMethod::Fixed => "FIXED",
    }
}

fn split_method_from_str(s: &str) -> Result<SplitMethod, DatabaseError> {
    match s {
        "EQUAL" => Ok(SplitMethod::Equal),
        "METERED" => Ok(SplitMethod::Metered),
        "PERCENTAGE" => Ok(SplitMethod::Percentage),
        "FIXED" => Ok(SplitMethod::Fixed),
        other => Err(DatabaseError::MappingError(format!(
            "Unknown split method: {other}"
        ))),
    }
}

fn bill_status_to_str(s: BillStatus) -> &'static str {
    match s {
        BillStatus::Draft => "DRAFT",
        BillStatus::Processing => "PROCESSING",
        BillStatus::ReviewRequired => "REVIEW_REQUIRED",
        BillStatus::Approved => "APPROVED",
        BillStatus::Posted => "POSTED",
    }
}

fn bill_status_from_str(s: &str) -> Result<BillStatus, DatabaseError> {
    match s {
        "DRAFT" => Ok(BillStatus::Draft),
        "PROCESSING" => Ok(BillStatus::Processing),
        "REVIEW_REQUIRED" => Ok(BillStatus::ReviewRequired),
        "APPROVED" => Ok(BillStatus::Approved),
        "POSTED" => Ok(BillStatus::Posted),
        other => Err(DatabaseError::MappingError(format!(
            "Unknown bill status: {other}"
        ))),
    }
}

fn lease_status_to_str(s: LeaseStatus) -> &'static str {
    match s {
        LeaseStatus::Pending => "PENDING",
        LeaseStatus::Active => "ACTIVE",
        LeaseStatus::Ended => "ENDED",
    }
}

fn lease_status_from_str(s: &str) -> Result<LeaseStatus, DatabaseError> {
    match s {
        "PENDING" => Ok(LeaseStatus::Pending),
        "ACTIVE" => Ok(LeaseStatus::Active),
        "ENDED" => Ok(LeaseStatus::Ended),
        other => Err(DatabaseError::MappingError(format!(
            "Unknown lease status: {other}"
        ))),
    }
}

#[derive(Debug, FromRow)]
struct BillRow {
    id: Uuid,
    property_id: Uuid,
    utility_id: Uuid,
    provider_name: String,
    total_amount: Decimal,
    currency: String,
    bill_date: NaiveDate,
    due_date: NaiveDate,
    period_start: NaiveDate,
    period_end: NaiveDate,
    split_method: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BillRow {
    fn into_domain(self) -> Result<UtilityBill, DatabaseError> {
        let currency = parse_currency(&self.currency)?;
        let period = DateRange::new(self.period_start, self.period_end)
            .map_err(|e| DatabaseError::MappingError(e.to_string()))?;
        Ok(UtilityBill {
            id: self.id.into(),
            property_id: self.property_id.into(),
            utility_id: self.utility_id.into(),
            provider_name: self.provider_name,
            total_amount: Money::new(self.total_amount, currency),
            bill_date: self.bill_date,
            due_date: self.due_date,
            period,
            split_method: split_method_from_str(&self.split_method)?,
            status: bill_status_from_str(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    id: Uuid,
    lease_id: Uuid,
    unit_id: Uuid,
    utility_id: Uuid,
    is_tenant_responsible: bool,
    lease_status: String,
    fixed_amount: Option<Decimal>,
    fixed_currency: Option<String>,
    percentage: Option<Decimal>,
    created_at: DateTime<Utc>,
}

impl AssignmentRow {
    fn into_domain(self) -> Result<LeaseUtility, DatabaseError> {
        let fixed_amount = match (self.fixed_amount, self.fixed_currency.as_deref()) {
            (Some(amount), Some(code)) => Some(Money::new(amount, parse_currency(code)?)),
            _ => None,
        };
        Ok(LeaseUtility {
            id: self.id.into(),
            lease_id: self.lease_id.into(),
            unit_id: self.unit_id.into(),
            utility_id: self.utility_id.into(),
            is_tenant_responsible: self.is_tenant_responsible,
            lease_status: lease_status_from_str(&self.lease_status)?,
            fixed_amount,
            percentage: self.percentage,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ReadingRow {
    id: Uuid,
    lease_utility_id: Uuid,
    value: Decimal,
    reading_date: NaiveDate,
    recorded_at: DateTime<Utc>,
}

impl ReadingRow {
    fn into_domain(self) -> MeterReading {
        MeterReading {
            id: self.id.into(),
            lease_utility_id: self.lease_utility_id.into(),
            value: self.value,
            reading_date: self.reading_date,
            recorded_at: self.recorded_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct AllocationRow {
    id: Uuid,
    utility_bill_id: Uuid,
    lease_utility_id: Uuid,
    unit_id: Uuid,
    lease_id: Uuid,
    amount: Decimal,
    currency: String,
    percentage: Option<Decimal>,
}

impl AllocationRow {
    fn into_domain(self) -> Result<UtilityAllocation, DatabaseError> {
        let currency = parse_currency(&self.currency)?;
        Ok(UtilityAllocation {
            id: self.id.into(),
            utility_bill_id: self.utility_bill_id.into(),
            lease_utility_id: self.lease_utility_id.into(),
            unit_id: self.unit_id.into(),
            lease_id: self.lease_id.into(),
            amount: Money::new(self.amount, currency),
            percentage: self.percentage,
        })
    }
}

const BILL_COLUMNS: &str = "id, property_id, utility_id, provider_name, total_amount, currency, \
     bill_date, due_date, period_start, period_end, split_method, status, created_at, updated_at";

const ASSIGNMENT_COLUMNS: &str = "id, lease_id, unit_id, utility_id, is_tenant_responsible, \
     lease_status, fixed_amount, fixed_currency, percentage, created_at";

/// Repository for utility bills, assignments, readings, and allocations
#[derive(Debug, Clone)]
pub struct UtilityRepository {
    pool: PgPool,
}

impl UtilityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a new draft bill
    pub async fn insert_bill(&self, bill: &UtilityBill) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO utility_bills (
                id, property_id, utility_id, provider_name, total_amount, currency,
                bill_date, due_date, period_start, period_end, split_method,
                status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(Uuid::from(bill.id))
        .bind(Uuid::from(bill.property_id))
        .bind(Uuid::from(bill.utility_id))
        .bind(&bill.provider_name)
        .bind(bill.total_amount.amount())
        .bind(bill.total_amount.currency().code())
        .bind(bill.bill_date)
        .bind(bill.due_date)
        .bind(bill.period.start)
        .bind(bill.period.end)
        .bind(split_method_to_str(bill.split_method))
        .bind(bill_status_to_str(bill.status))
        .bind(bill.created_at)
        .bind(bill.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Inserts a lease-utility assignment
    pub async fn insert_assignment(&self, assignment: &LeaseUtility) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO lease_utilities (
                id, lease_id, unit_id, utility_id, is_tenant_responsible,
                lease_status, fixed_amount, fixed_currency, percentage, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(Uuid::from(assignment.id))
        .bind(Uuid::from(assignment.lease_id))
        .bind(Uuid::from(assignment.unit_id))
        .bind(Uuid::from(assignment.utility_id))
        .bind(assignment.is_tenant_responsible)
        .bind(lease_status_to_str(assignment.lease_status))
        .bind(assignment.fixed_amount.map(|m| m.amount()))
        .bind(assignment.fixed_amount.map(|m| m.currency().code()))
        .bind(assignment.percentage)
        .bind(assignment.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn fetch_bill(&self, id: UtilityBillId) -> Result<UtilityBill, DatabaseError> {
        let row: Option<BillRow> = sqlx::query_as(&format!(
            "SELECT {BILL_COLUMNS} FROM utility_bills WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| DatabaseError::not_found("UtilityBill", id))?
            .into_domain()
    }
}

impl DomainPort for UtilityRepository {}

#[async_trait]
impl UtilityStore for UtilityRepository {
    async fn load_bill(&self, id: UtilityBillId) -> Result<UtilityBill, PortError> {
        self.fetch_bill(id).await.map_err(PortError::from)
    }

    async fn update_bill(&self, bill: &UtilityBill) -> Result<(), PortError> {
        sqlx::query(
            "UPDATE utility_bills SET status = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(Uuid::from(bill.id))
        .bind(bill_status_to_str(bill.status))
        .bind(bill.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::from(DatabaseError::from(e)))?;
        Ok(())
    }

    async fn load_assignments(&self, bill: &UtilityBill) -> Result<Vec<LeaseUtility>, PortError> {
        // Joins through units so only assignments on the bill's property
        // participate in its allocation.
        let rows: Vec<AssignmentRow> = sqlx::query_as(
            "SELECT lu.id, lu.lease_id, lu.unit_id, lu.utility_id, lu.is_tenant_responsible,
                    lu.lease_status, lu.fixed_amount, lu.fixed_currency, lu.percentage,
                    lu.created_at
             FROM lease_utilities lu
             JOIN units u ON u.id = lu.unit_id
             WHERE u.property_id = $1 AND lu.utility_id = $2",
        )
        .bind(Uuid::from(bill.property_id))
        .bind(Uuid::from(bill.utility_id))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::from(DatabaseError::from(e)))?;

        rows.into_iter()
            .map(|r| r.into_domain().map_err(PortError::from))
            .collect()
    }

    async fn load_assignment(&self, id: LeaseUtilityId) -> Result<LeaseUtility, PortError> {
        let row: Option<AssignmentRow> = sqlx::query_as(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM lease_utilities WHERE id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::from(DatabaseError::from(e)))?;

        row.ok_or_else(|| PortError::not_found("LeaseUtility", id))?
            .into_domain()
            .map_err(PortError::from)
    }

    async fn load_readings(
        &self,
        assignment_ids: &[LeaseUtilityId],
    ) -> Result<Vec<MeterReading>, PortError> {
        let ids: Vec<Uuid> = assignment_ids.iter().copied().map(Uuid::from).collect();
        let rows: Vec<ReadingRow> = sqlx::query_as(
            "SELECT id, lease_utility_id, value, reading_date, recorded_at
             FROM utility_readings
             WHERE lease_utility_id = ANY($1)
             ORDER BY reading_date, recorded_at",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::from(DatabaseError::from(e)))?;

        Ok(rows.into_iter().map(ReadingRow::into_domain).collect())
    }

    async fn append_reading(&self, reading: &MeterReading) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO utility_readings (id, lease_utility_id, value, reading_date, recorded_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::from(reading.id))
        .bind(Uuid::from(reading.lease_utility_id))
        .bind(reading.value)
        .bind(reading.reading_date)
        .bind(reading.recorded_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::from(DatabaseError::from(e)))?;
        Ok(())
    }

    async fn replace_allocations(
        &self,
        bill: &UtilityBill,
        allocations: &[UtilityAllocation],
    ) -> Result<(), PortError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::from(DatabaseError::from(e)))?;

        sqlx::query("DELETE FROM utility_allocations WHERE utility_bill_id = $1")
            .bind(Uuid::from(bill.id))
            .execute(&mut *tx)
            .await
            .map_err(|e| PortError::from(DatabaseError::from(e)))?;

        for allocation in allocations {
            sqlx::query(
                r#"
                INSERT INTO utility_allocations (
                    id, utility_bill_id, lease_utility_id, unit_id, lease_id,
                    amount, currency, percentage
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(Uuid::from(allocation.id))
            .bind(Uuid::from(allocation.utility_bill_id))
            .bind(Uuid::from(allocation.lease_utility_id))
            .bind(Uuid::from(allocation.unit_id))
            .bind(Uuid::from(allocation.lease_id))
            .bind(allocation.amount.amount())
            .bind(allocation.amount.currency().code())
            .bind(allocation.percentage)
            .execute(&mut *tx)
            .await
            .map_err(|e| PortError::from(DatabaseError::from(e)))?;
        }

        sqlx::query("UPDATE utility_bills SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(Uuid::from(bill.id))
            .bind(bill_status_to_str(bill.status))
            .bind(bill.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| PortError::from(DatabaseError::from(e)))?;

        tx.commit()
            .await
            .map_err(|e| PortError::from(DatabaseError::from(e)))?;
        Ok(())
    }

    async fn load_allocations(
        &self,
        bill_id: UtilityBillId,
    ) -> Result<Vec<UtilityAllocation>, PortError> {
        let rows: Vec<AllocationRow> = sqlx::query_as(
            "SELECT id, utility_bill_id, lease_utility_id, unit_id, lease_id,
                    amount, currency, percentage
             FROM utility_allocations WHERE utility_bill_id = $1",
        )
        .bind(Uuid::from(bill_id))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::from(DatabaseError::from(e)))?;

        rows.into_iter()
            .map(|r| r.into_domain().map_err(PortError::from))
            .collect()
    }
}
