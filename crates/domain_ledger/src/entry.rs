//! Journal entry and line types
//!
//! A journal entry exclusively owns its lines: they are created together at
//! post time and never independently mutated. Drafts reference symbolic
//! account codes; resolution to concrete accounts happens in the posting
//! engine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{
    AccountId, EntityId, JournalEntryId, JournalLineId, LeaseId, Money, PropertyId, TenantId,
    UnitId,
};

use crate::account::AccountCode;

/// Reporting dimensions attached to a journal line
///
/// Dimensions tag lines for property/unit/lease/tenant reporting; they play
/// no part in balancing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDimensions {
    pub property_id: Option<PropertyId>,
    pub unit_id: Option<UnitId>,
    pub lease_id: Option<LeaseId>,
    pub tenant_id: Option<TenantId>,
}

impl LineDimensions {
    pub fn for_lease(lease_id: LeaseId) -> Self {
        Self {
            lease_id: Some(lease_id),
            ..Default::default()
        }
    }

    pub fn for_property(property_id: PropertyId) -> Self {
        Self {
            property_id: Some(property_id),
            ..Default::default()
        }
    }
}

/// A committed journal line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalLine {
    /// Unique line identifier
    pub id: JournalLineId,
    /// Resolved account
    pub account_id: AccountId,
    /// Debit amount (zero for credit lines)
    pub debit: Money,
    /// Credit amount (zero for debit lines)
    pub credit: Money,
    /// Reporting dimensions
    pub dimensions: LineDimensions,
    /// Optional line memo
    pub memo: Option<String>,
}

/// A committed journal entry
///
/// Entries are created with `is_locked = true`; system-posted entries are
/// never edited after commit. Corrections require an offsetting entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique entry identifier
    pub id: JournalEntryId,
    /// Owning financial entity
    pub entity_id: EntityId,
    /// Business date of the transaction
    pub transaction_date: NaiveDate,
    /// When the entry was committed
    pub posted_at: DateTime<Utc>,
    /// Description
    pub description: String,
    /// External reference (e.g., "payment:PAY-…", "utility_bill:UBL-…")
    pub reference: Option<String>,
    /// Locked flag; always true for system-posted entries
    pub is_locked: bool,
    /// Owned lines
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    /// Total debit across lines
    pub fn total_debit(&self, currency: core_kernel::Currency) -> Money {
        self.lines
            .iter()
            .fold(Money::zero(currency), |acc, l| acc + l.debit)
    }

    /// Total credit across lines
    pub fn total_credit(&self, currency: core_kernel::Currency) -> Money {
        self.lines
            .iter()
            .fold(Money::zero(currency), |acc, l| acc + l.credit)
    }
}

/// A draft line referencing a symbolic account code
#[derive(Debug, Clone)]
pub struct LineDraft {
    /// Symbolic account code, resolved at post time
    pub code: AccountCode,
    /// Debit amount
    pub debit: Option<Money>,
    /// Credit amount
    pub credit: Option<Money>,
    /// Reporting dimensions
    pub dimensions: LineDimensions,
    /// Optional memo
    pub memo: Option<String>,
}

impl LineDraft {
    /// Creates a debit line draft
    pub fn debit(code: AccountCode, amount: Money) -> Self {
        Self {
            code,
            debit: Some(amount),
            credit: None,
            dimensions: LineDimensions::default(),
            memo: None,
        }
    }

    /// Creates a credit line draft
    pub fn credit(code: AccountCode, amount: Money) -> Self {
        Self {
            code,
            debit: None,
            credit: Some(amount),
            dimensions: LineDimensions::default(),
            memo: None,
        }
    }

    /// Attaches reporting dimensions
    pub fn with_dimensions(mut self, dimensions: LineDimensions) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Attaches a memo
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// Builder for a journal entry awaiting posting
///
/// The draft is validated and committed by `JournalBook::post`; an
/// imbalanced draft is never observable in storage.
#[derive(Debug, Clone)]
pub struct EntryDraft {
    /// Entry description
    pub description: String,
    /// Business date; defaults to today at post time
    pub transaction_date: Option<NaiveDate>,
    /// External reference
    pub reference: Option<String>,
    /// Draft lines
    pub lines: Vec<LineDraft>,
}

impl EntryDraft {
    /// Creates a new draft
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            transaction_date: None,
            reference: None,
            lines: Vec::new(),
        }
    }

    /// Sets the business date
    pub fn dated(mut self, date: NaiveDate) -> Self {
        self.transaction_date = Some(date);
        self
    }

    /// Sets the external reference
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Adds a debit line
    pub fn debit(mut self, code: AccountCode, amount: Money) -> Self {
        self.lines.push(LineDraft::debit(code, amount));
        self
    }

    /// Adds a credit line
    pub fn credit(mut self, code: AccountCode, amount: Money) -> Self {
        self.lines.push(LineDraft::credit(code, amount));
        self
    }

    /// Adds a pre-built line
    pub fn line(mut self, line: LineDraft) -> Self {
        self.lines.push(line);
        self
    }

    /// Checks if the draft is balanced
    pub fn is_balanced(&self) -> bool {
        let mut debits = rust_decimal::Decimal::ZERO;
        let mut credits = rust_decimal::Decimal::ZERO;

        for line in &self.lines {
            if let Some(d) = &line.debit {
                debits += d.amount();
            }
            if let Some(c) = &line.credit {
                credits += c.amount();
            }
        }

        debits == credits
    }
}
