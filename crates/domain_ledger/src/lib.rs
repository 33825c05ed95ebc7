//! Ledger Domain - Double-Entry Journal Posting
//!
//! This crate implements the general ledger for the property platform: a
//! chart of accounts keyed by symbolic codes, a per-entity registry that
//! resolves those codes, and a posting engine that refuses to commit any
//! journal entry whose debits and credits do not balance exactly.
//!
//! # Double-Entry Accounting Principles
//!
//! Every financial event creates balanced debit and credit lines:
//! - Debits increase asset/expense accounts
//! - Credits increase liability/equity/income accounts
//! - The sum of all debits must equal the sum of all credits, exactly
//!
//! Entries are created locked; corrections are offsetting entries, never
//! edits. Account balances are always derived by summation over journal
//! lines rather than stored as mutable running totals.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_ledger::{ChartRegistry, JournalBook, EntryDraft, AccountCode};
//!
//! let mut registry = ChartRegistry::new();
//! registry.ensure_standard(entity_id);
//!
//! let draft = EntryDraft::new("Rent payment received")
//!     .debit(AccountCode::Cash, amount)
//!     .credit(AccountCode::AccountsReceivable, amount);
//!
//! let entry_id = book.post(&registry, draft)?;
//! ```

pub mod account;
pub mod entry;
pub mod error;
pub mod posting;
pub mod registry;

pub use account::{Account, AccountCode, AccountType, standard_accounts};
pub use entry::{EntryDraft, JournalEntry, JournalLine, LineDimensions, LineDraft};
pub use error::LedgerError;
pub use posting::{JournalBook, TrialBalance, TrialBalanceEntry};
pub use registry::ChartRegistry;
