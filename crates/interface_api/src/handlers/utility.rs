//! Utility bill, allocation, and meter reading handlers

use std::str::FromStr;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use core_kernel::{
    Currency, DateRange, LeaseUtilityId, Money, PropertyId, UtilityBillId, UtilityId,
};
use domain_posting::ports::{ReadingRequest, UtilityStore};
use domain_posting::PostingError;
use domain_utility::UtilityBill;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{permissions, require_role, Claims};
use crate::dto::utility::{
    AllocationResponse, AllocationRunResponse, BillResponse, CreateBillRequest,
    PostBillResponse, ReadingResponse, RecordReadingRequest,
};
use crate::error::ApiError;
use crate::AppState;

/// Registers a provider bill in draft status
pub async fn create_bill(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<CreateBillRequest>,
) -> Result<(StatusCode, Json<BillResponse>), ApiError> {
    require_role(&claims, permissions::UTILITY_WRITE)?;
    request.validate()?;

    let currency = Currency::from_str(&request.currency)
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let period = DateRange::new(request.period_start, request.period_end)
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let bill = UtilityBill::new(
        PropertyId::from_uuid(request.property_id),
        UtilityId::from_uuid(request.utility_id),
        request.provider_name,
        Money::new(request.total_amount, currency),
        request.bill_date,
        request.due_date,
        period,
        request.split_method,
    );

    state.utility.insert_bill(&bill).await?;

    Ok((StatusCode::CREATED, Json(BillResponse::from(&bill))))
}

/// Gets a bill
pub async fn get_bill(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BillResponse>, ApiError> {
    let bill = state.utility.fetch_bill(UtilityBillId::from_uuid(id)).await?;
    Ok(Json(BillResponse::from(&bill)))
}

/// Runs the split for a bill and stores the resulting allocations
///
/// Recalculation is allowed until the bill is posted; each run replaces
/// the previous allocation set.
pub async fn calculate_allocations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<AllocationRunResponse>, ApiError> {
    require_role(&claims, permissions::UTILITY_WRITE)?;

    let (bill, allocations) = state
        .orchestrator
        .allocate_bill(UtilityBillId::from_uuid(id))
        .await?;

    Ok(Json(AllocationRunResponse {
        bill: BillResponse::from(&bill),
        allocations: allocations.iter().map(AllocationResponse::from).collect(),
    }))
}

/// Lists the stored allocations for a bill
pub async fn list_allocations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AllocationResponse>>, ApiError> {
    let allocations = state
        .utility
        .load_allocations(UtilityBillId::from_uuid(id))
        .await
        .map_err(PostingError::from)?;
    Ok(Json(allocations.iter().map(AllocationResponse::from).collect()))
}

/// Posts an approved bill to the general ledger
pub async fn post_bill(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<PostBillResponse>, ApiError> {
    require_role(&claims, permissions::UTILITY_POST)?;

    let bill_id = UtilityBillId::from_uuid(id);
    let journal_entry_id = state.orchestrator.post_utility_bill(bill_id).await?;

    Ok(Json(PostBillResponse {
        bill_id,
        journal_entry_id,
        status: domain_utility::BillStatus::Posted,
    }))
}

/// Appends a meter reading
pub async fn record_reading(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(request): Json<RecordReadingRequest>,
) -> Result<(StatusCode, Json<ReadingResponse>), ApiError> {
    require_role(&claims, permissions::READING_WRITE)?;
    request.validate()?;

    let id = state
        .orchestrator
        .record_reading(ReadingRequest {
            lease_utility_id: LeaseUtilityId::from_uuid(request.lease_utility_id),
            value: request.reading_value,
            date: request.reading_date,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ReadingResponse { id })))
}
