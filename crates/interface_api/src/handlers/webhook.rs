//! Payment gateway webhook handlers
//!
//! The gateway is outside our trust boundary, so notifications carry a
//! signature token minted with a shared secret that is distinct from the
//! user-facing JWT secret. Settlement is idempotent; the gateway retries
//! delivery until it sees a 2xx.

use axum::{extract::State, http::HeaderMap, Json};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use crate::dto::billing::{GatewaySettlementRequest, SettlementResponse};
use crate::error::ApiError;
use crate::AppState;

/// Claims the gateway signs into its notification token
#[derive(Debug, Deserialize)]
struct GatewayClaims {
    #[allow(dead_code)]
    exp: i64,
}

fn verify_signature(headers: &HeaderMap, secret: &str) -> Result<(), ApiError> {
    let token = headers
        .get("X-Gateway-Signature")
        .and_then(|h| h.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    decode::<GatewayClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        warn!("Gateway signature rejected: {:?}", e);
        ApiError::Unauthorized
    })?;

    Ok(())
}

/// Handles a settlement notification for a card payment
///
/// Unknown references are acknowledged rather than erroring so the
/// gateway does not retry notifications for payments recorded in
/// another system.
pub async fn gateway_settlement(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<GatewaySettlementRequest>,
) -> Result<Json<SettlementResponse>, ApiError> {
    verify_signature(&headers, &state.config.webhook_secret)?;
    request.validate()?;

    let payment_id = state
        .orchestrator
        .settle_gateway_payment(&request.gateway_reference, request.settled_at)
        .await?;

    let outcome = match payment_id {
        Some(id) => {
            info!(payment_id = %id, gateway_reference = %request.gateway_reference, "Gateway settlement applied");
            "settled"
        }
        None => {
            info!(gateway_reference = %request.gateway_reference, "Gateway settlement ignored, no matching payment");
            "ignored"
        }
    };

    Ok(Json(SettlementResponse {
        payment_id,
        outcome: outcome.to_string(),
    }))
}
