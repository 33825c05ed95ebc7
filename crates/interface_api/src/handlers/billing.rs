//! Invoice and payment handlers

use std::str::FromStr;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use core_kernel::{ActorId, Currency, InvoiceId, Money, PaymentId};
use domain_billing::PaymentMethod;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{permissions, require_role, Claims};
use crate::dto::billing::{
    ApplyPaymentRequest, ApplyPaymentResponse, InvoiceResponse, PaymentResponse,
    ReversePaymentRequest, ReversalResponse,
};
use crate::error::ApiError;
use crate::AppState;

/// Gets an invoice with its recomputed payment totals
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice = state.billing.fetch_invoice(InvoiceId::from_uuid(id)).await?;
    Ok(Json(InvoiceResponse::from(&invoice)))
}

/// Lists payments recorded against an invoice, reversed ones included
pub async fn list_payments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PaymentResponse>>, ApiError> {
    let payments = state
        .billing
        .fetch_payments(InvoiceId::from_uuid(id))
        .await?;
    Ok(Json(payments.iter().map(PaymentResponse::from).collect()))
}

/// Applies a payment to an invoice
///
/// Cash and bank payments post to the ledger immediately; card payments
/// stay pending until the gateway settlement webhook arrives.
pub async fn apply_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<ApplyPaymentRequest>,
) -> Result<(StatusCode, Json<ApplyPaymentResponse>), ApiError> {
    require_role(&claims, permissions::PAYMENT_WRITE)?;
    request.validate()?;
    if request.method == PaymentMethod::CreditCard && request.gateway_reference.is_none() {
        return Err(ApiError::Validation(
            "gateway_reference is required for card payments".to_string(),
        ));
    }

    let currency = Currency::from_str(&request.currency)
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    let amount = Money::new(request.amount, currency);

    let invoice_id = InvoiceId::from_uuid(id);
    let payment = state
        .orchestrator
        .apply_invoice_payment(
            invoice_id,
            amount,
            request.method,
            request.reference,
            request.gateway_reference,
        )
        .await?;

    let invoice = state.billing.fetch_invoice(invoice_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApplyPaymentResponse {
            payment: PaymentResponse::from(&payment),
            invoice_status: invoice.status,
            total_paid: invoice.amount_paid.amount(),
            remaining: invoice.balance.amount(),
        }),
    ))
}

/// Reverses a cash payment
///
/// Electronic payments are rejected here; those are corrected through
/// the gateway's own refund flow.
pub async fn reverse_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReversePaymentRequest>,
) -> Result<(StatusCode, Json<ReversalResponse>), ApiError> {
    require_role(&claims, permissions::PAYMENT_REVERSE)?;
    request.validate()?;

    let reversal = state
        .orchestrator
        .reverse_cash_payment(
            PaymentId::from_uuid(id),
            ActorId::from_uuid(request.reversed_by),
            request.reason,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ReversalResponse::from(&reversal))))
}
