//! Ledger domain errors

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur in the ledger domain
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Entry debits and credits do not balance; nothing is written
    #[error("Journal entry is not balanced: debits={debits}, credits={credits}")]
    Imbalance { debits: Decimal, credits: Decimal },

    /// A symbolic account code has no configured account for the entity
    #[error("No account configured for code '{code}'")]
    UnconfiguredAccount { code: String },

    /// Financial entity not found
    #[error("Financial entity not found: {0}")]
    EntityNotFound(String),

    /// Account already exists for the code
    #[error("Account already configured for code '{0}'")]
    DuplicateAccount(String),

    /// Journal entry not found
    #[error("Journal entry not found: {0}")]
    EntryNotFound(String),

    /// Entry has no lines
    #[error("Journal entry must have at least one line")]
    EmptyEntry,

    /// Calculation error
    #[error("Calculation error: {0}")]
    Calculation(String),
}

impl LedgerError {
    /// Stable machine-readable code for API payloads
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::Imbalance { .. } => "GL_IMBALANCE",
            LedgerError::UnconfiguredAccount { .. } => "UNCONFIGURED_ACCOUNT",
            LedgerError::EntityNotFound(_) => "ENTITY_NOT_FOUND",
            LedgerError::DuplicateAccount(_) => "DUPLICATE_ACCOUNT",
            LedgerError::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            LedgerError::EmptyEntry => "EMPTY_ENTRY",
            LedgerError::Calculation(_) => "CALCULATION_ERROR",
        }
    }
}
