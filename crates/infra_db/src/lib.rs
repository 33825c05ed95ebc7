//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the property accounting core, built on
//! SQLx. The crate follows the repository pattern: each repository owns
//! the SQL for one aggregate, maps rows to domain types, and implements
//! the store ports the posting orchestrator drives.
//!
//! Writes that span tables (a journal entry with its lines, a payment
//! with its invoice totals, a reversal with its audit record) run inside
//! a single transaction. The payment application path uses an optimistic
//! conditional update; a lost race maps to a conflict the orchestrator
//! retries from a fresh read.

pub mod error;
pub mod pool;
pub mod repositories;

pub use error::DatabaseError;
pub use pool::{create_pool, create_pool_from_url, DatabaseConfig, DatabasePool};
pub use repositories::{BillingRepository, LedgerRepository, UtilityRepository};
