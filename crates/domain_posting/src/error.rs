//! Orchestration errors

use thiserror::Error;

use core_kernel::PortError;
use domain_billing::BillingError;
use domain_ledger::LedgerError;
use domain_utility::UtilityError;

/// Errors surfaced by the posting orchestrator
#[derive(Debug, Error)]
pub enum PostingError {
    /// Ledger invariant or precondition failure
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Billing domain failure
    #[error(transparent)]
    Billing(#[from] BillingError),

    /// Utility domain failure
    #[error(transparent)]
    Utility(#[from] UtilityError),

    /// Storage failure
    #[error(transparent)]
    Store(#[from] PortError),

    /// Bounded retry gave up on a transient failure
    #[error("Operation {operation} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last_error: String,
    },

    /// Allocation set no longer sums to the bill total at post time
    #[error("Allocations sum to {allocated} but bill total is {bill_total}")]
    AllocationSumMismatch {
        bill_total: rust_decimal::Decimal,
        allocated: rust_decimal::Decimal,
    },
}

impl PostingError {
    /// True if the failure is worth a bounded retry
    ///
    /// Only storage-level contention and timeouts qualify; domain
    /// validation failures are deterministic and retried never.
    pub fn is_transient(&self) -> bool {
        matches!(self, PostingError::Store(e) if e.is_transient())
    }

    /// Stable machine-readable code for API payloads
    pub fn code(&self) -> &'static str {
        match self {
            PostingError::Ledger(e) => e.code(),
            PostingError::Billing(e) => e.code(),
            PostingError::Utility(e) => e.code(),
            PostingError::Store(_) => "STORE_ERROR",
            PostingError::RetriesExhausted { .. } => "RETRIES_EXHAUSTED",
            PostingError::AllocationSumMismatch { .. } => "ALLOCATION_SUM_MISMATCH",
        }
    }
}
