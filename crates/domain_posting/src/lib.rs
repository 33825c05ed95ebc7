//! Posting Orchestration
//!
//! Sits between the HTTP surface and the domain crates. The orchestrator
//! sequences each flow's storage and ledger writes, applies bounded
//! retry with exponential backoff to transient failures, and keeps the
//! two standing guarantees: received payments are never rolled back by a
//! ledger failure, and re-delivered gateway confirmations never
//! double-post.

pub mod error;
pub mod orchestrator;
pub mod ports;
pub mod retry;

pub use error::PostingError;
pub use orchestrator::PostingOrchestrator;
pub use ports::{BillingStore, LedgerStore, ReadingRequest, UtilityStore};
pub use retry::RetryPolicy;
