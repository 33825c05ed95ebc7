//! Utility bill, allocation, and meter reading DTOs

use chrono::NaiveDate;
use core_kernel::{
    AllocationId, JournalEntryId, LeaseId, LeaseUtilityId, PropertyId, ReadingId, UnitId,
    UtilityBillId, UtilityId,
};
use domain_utility::bill::{BillStatus, SplitMethod, UtilityBill};
use domain_utility::allocation::UtilityAllocation;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBillRequest {
    pub property_id: Uuid,
    pub utility_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub provider_name: String,
    #[validate(custom(function = "super::non_negative_amount"))]
    pub total_amount: Decimal,
    #[validate(length(min = 3, max = 3))]
    pub currency: String,
    pub bill_date: NaiveDate,
    pub due_date: NaiveDate,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub split_method: SplitMethod,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordReadingRequest {
    pub lease_utility_id: Uuid,
    #[validate(custom(function = "super::non_negative_amount"))]
    pub reading_value: Decimal,
    /// Defaults to today in the organization timezone when omitted
    pub reading_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct BillResponse {
    pub id: UtilityBillId,
    pub property_id: PropertyId,
    pub utility_id: UtilityId,
    pub provider_name: String,
    pub total_amount: Decimal,
    pub currency: String,
    pub bill_date: NaiveDate,
    pub due_date: NaiveDate,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub split_method: SplitMethod,
    pub status: BillStatus,
}

impl From<&UtilityBill> for BillResponse {
    fn from(bill: &UtilityBill) -> Self {
        Self {
            id: bill.id,
            property_id: bill.property_id,
            utility_id: bill.utility_id,
            provider_name: bill.provider_name.clone(),
            total_amount: bill.total_amount.amount(),
            currency: bill.total_amount.currency().code().to_string(),
            bill_date: bill.bill_date,
            due_date: bill.due_date,
            period_start: bill.period.start,
            period_end: bill.period.end,
            split_method: bill.split_method,
            status: bill.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AllocationResponse {
    pub id: AllocationId,
    pub utility_bill_id: UtilityBillId,
    pub lease_utility_id: LeaseUtilityId,
    pub unit_id: UnitId,
    pub lease_id: LeaseId,
    pub amount: Decimal,
    pub currency: String,
    pub percentage: Option<Decimal>,
}

impl From<&UtilityAllocation> for AllocationResponse {
    fn from(allocation: &UtilityAllocation) -> Self {
        Self {
            id: allocation.id,
            utility_bill_id: allocation.utility_bill_id,
            lease_utility_id: allocation.lease_utility_id,
            unit_id: allocation.unit_id,
            lease_id: allocation.lease_id,
            amount: allocation.amount.amount(),
            currency: allocation.amount.currency().code().to_string(),
            percentage: allocation.percentage,
        }
    }
}

/// Result of running the split for a bill
#[derive(Debug, Serialize)]
pub struct AllocationRunResponse {
    pub bill: BillResponse,
    pub allocations: Vec<AllocationResponse>,
}

#[derive(Debug, Serialize)]
pub struct PostBillResponse {
    pub bill_id: UtilityBillId,
    pub journal_entry_id: JournalEntryId,
    pub status: BillStatus,
}

#[derive(Debug, Serialize)]
pub struct ReadingResponse {
    pub id: ReadingId,
}
