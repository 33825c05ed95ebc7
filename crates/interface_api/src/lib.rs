//! HTTP API Layer
//!
//! This crate provides the REST API for the property accounting core using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for billing, utilities, and gateway webhooks
//! - **Middleware**: Authentication, tracing, audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses carrying domain error codes
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{build_state, create_router, config::ApiConfig};
//!
//! let state = build_state(pool, config).await?;
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use chrono_tz::Tz;
use core_kernel::{Currency, EntityId, Timezone};
use domain_posting::PostingOrchestrator;
use infra_db::{BillingRepository, LedgerRepository, UtilityRepository};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{billing, health, utility, webhook};
use crate::middleware::{audit_middleware, auth_middleware};

/// The orchestrator wired to the PostgreSQL repositories
pub type Orchestrator =
    PostingOrchestrator<LedgerRepository, BillingRepository, UtilityRepository>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: ApiConfig,
    pub orchestrator: Arc<Orchestrator>,
    pub billing: BillingRepository,
    pub utility: UtilityRepository,
}

/// Builds the application state
///
/// Bootstraps the entity's chart of accounts and wires the posting
/// orchestrator to the database-backed stores.
pub async fn build_state(pool: PgPool, config: ApiConfig) -> anyhow::Result<AppState> {
    let entity_id = EntityId::from_uuid(config.entity_id);
    let currency = Currency::from_str(&config.currency)?;
    let timezone = Tz::from_str(&config.timezone)
        .map_err(|e| anyhow::anyhow!("Invalid timezone '{}': {}", config.timezone, e))?;

    let ledger = LedgerRepository::bootstrap(pool.clone(), entity_id, currency).await?;
    let billing = BillingRepository::new(pool.clone());
    let utility = UtilityRepository::new(pool.clone());

    let orchestrator = PostingOrchestrator::new(
        ledger,
        billing.clone(),
        utility.clone(),
        Timezone::new(timezone),
    );

    Ok(AppState {
        pool,
        config,
        orchestrator: Arc::new(orchestrator),
        billing,
        utility,
    })
}

/// Creates the main API router
///
/// # Arguments
///
/// * `state` - Shared application state from [`build_state`]
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Webhooks are public but verified with the gateway's shared secret
    let webhook_routes = Router::new()
        .route("/webhooks/gateway", post(webhook::gateway_settlement));

    // Invoice and payment routes
    let invoice_routes = Router::new()
        .route("/:id", get(billing::get_invoice))
        .route("/:id/payments", get(billing::list_payments))
        .route("/:id/payments", post(billing::apply_payment));

    let payment_routes = Router::new()
        .route("/:id/reverse", post(billing::reverse_payment));

    // Utility bill routes
    let bill_routes = Router::new()
        .route("/", post(utility::create_bill))
        .route("/:id", get(utility::get_bill))
        .route("/:id/allocations", post(utility::calculate_allocations))
        .route("/:id/allocations", get(utility::list_allocations))
        .route("/:id/post", post(utility::post_bill));

    let reading_routes = Router::new()
        .route("/", post(utility::record_reading));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/invoices", invoice_routes)
        .nest("/payments", payment_routes)
        .nest("/utility-bills", bill_routes)
        .nest("/meter-readings", reading_routes)
        .layer(axum_middleware::from_fn_with_state(state.clone(), audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .merge(webhook_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
