//! Journal posting engine
//!
//! Validates and commits double-entry journal entries for one financial
//! entity. The balance invariant is enforced before anything is written:
//! either the whole entry (with all its lines) is committed, or nothing is.

use chrono::Utc;
use tracing::info;

use core_kernel::{AccountId, Currency, EntityId, JournalEntryId, JournalLineId, Money};

use crate::entry::{EntryDraft, JournalEntry, JournalLine};
use crate::error::LedgerError;
use crate::registry::ChartRegistry;

/// The journal for one financial entity
///
/// # Invariants
///
/// - Every committed entry balances exactly (sum of debits == sum of credits)
/// - Entries are locked at creation and never modified, only offset
/// - Account balances are derived by summation over lines, never stored
#[derive(Debug)]
pub struct JournalBook {
    entity_id: EntityId,
    currency: Currency,
    entries: Vec<JournalEntry>,
}

impl JournalBook {
    /// Creates an empty journal for the entity
    pub fn new(entity_id: EntityId, currency: Currency) -> Self {
        Self {
            entity_id,
            currency,
            entries: Vec::new(),
        }
    }

    /// Returns the owning entity
    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    /// Returns the functional currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns all committed entries
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Finds a committed entry
    pub fn entry(&self, id: &JournalEntryId) -> Option<&JournalEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    /// Validates and commits a draft entry
    ///
    /// # Errors
    ///
    /// - `LedgerError::EmptyEntry` if the draft has no lines
    /// - `LedgerError::Imbalance` if exact debit and credit totals differ;
    ///   no entry is written
    /// - `LedgerError::UnconfiguredAccount` if a symbolic code has no
    ///   account configured for this entity
    pub fn post(
        &mut self,
        registry: &ChartRegistry,
        draft: EntryDraft,
    ) -> Result<JournalEntryId, LedgerError> {
        if draft.lines.is_empty() {
            return Err(LedgerError::EmptyEntry);
        }

        self.validate_balance(&draft)?;

        // Resolve every symbolic code before building anything
        let mut resolved: Vec<AccountId> = Vec::with_capacity(draft.lines.len());
        for line in &draft.lines {
            let account = registry.resolve(self.entity_id, line.code)?;
            resolved.push(account.id);
        }

        let entry_id = JournalEntryId::new_v7();
        let now = Utc::now();
        let zero = Money::zero(self.currency);

        let lines = draft
            .lines
            .iter()
            .zip(resolved)
            .map(|(line, account_id)| JournalLine {
                id: JournalLineId::new_v7(),
                account_id,
                debit: line.debit.unwrap_or(zero),
                credit: line.credit.unwrap_or(zero),
                dimensions: line.dimensions,
                memo: line.memo.clone(),
            })
            .collect();

        let entry = JournalEntry {
            id: entry_id,
            entity_id: self.entity_id,
            transaction_date: draft.transaction_date.unwrap_or_else(|| now.date_naive()),
            posted_at: now,
            description: draft.description,
            reference: draft.reference,
            is_locked: true,
            lines,
        };

        info!(
            entity = %self.entity_id,
            entry = %entry_id,
            lines = entry.lines.len(),
            "journal entry posted"
        );

        self.entries.push(entry);
        Ok(entry_id)
    }

    /// Posts an offsetting entry that exactly reverses a committed entry
    ///
    /// Locked entries are never edited; this is the only correction path.
    pub fn post_offsetting(
        &mut self,
        entry_id: &JournalEntryId,
        reason: &str,
    ) -> Result<JournalEntryId, LedgerError> {
        let original = self
            .entry(entry_id)
            .ok_or_else(|| LedgerError::EntryNotFound(entry_id.to_string()))?
            .clone();

        let offset_id = JournalEntryId::new_v7();
        let now = Utc::now();

        // Swap debit and credit on every line
        let lines = original
            .lines
            .iter()
            .map(|line| JournalLine {
                id: JournalLineId::new_v7(),
                account_id: line.account_id,
                debit: line.credit,
                credit: line.debit,
                dimensions: line.dimensions,
                memo: Some(format!("Offset: {reason}")),
            })
            .collect();

        let entry = JournalEntry {
            id: offset_id,
            entity_id: self.entity_id,
            transaction_date: now.date_naive(),
            posted_at: now,
            description: format!("Offsetting entry for {entry_id}: {reason}"),
            reference: Some(format!("offsets:{entry_id}")),
            is_locked: true,
            lines,
        };

        self.entries.push(entry);
        Ok(offset_id)
    }

    /// Net movement on an account, derived by summation over lines
    ///
    /// Positive means net debit, negative net credit. Because balances are
    /// summed on demand, concurrent postings never contend on a stored
    /// running total.
    pub fn account_net(&self, account_id: &AccountId) -> Money {
        self.entries
            .iter()
            .flat_map(|e| e.lines.iter())
            .filter(|l| &l.account_id == account_id)
            .fold(Money::zero(self.currency), |acc, l| acc + l.debit - l.credit)
    }

    /// Generates a trial balance over all committed entries
    pub fn trial_balance(&self, registry: &ChartRegistry) -> TrialBalance {
        let zero = Money::zero(self.currency);
        let mut entries = Vec::new();
        let mut total_debits = zero;
        let mut total_credits = zero;

        for account in registry.accounts(self.entity_id) {
            let net = self.account_net(&account.id);
            if net.is_zero() {
                continue;
            }

            let (debit, credit) = if net.is_negative() {
                (zero, net.abs())
            } else {
                (net, zero)
            };

            total_debits = total_debits + debit;
            total_credits = total_credits + credit;
            entries.push(TrialBalanceEntry {
                account_id: account.id,
                account_code: account.code.clone(),
                account_name: account.name.clone(),
                debit,
                credit,
            });
        }

        entries.sort_by(|a, b| a.account_code.cmp(&b.account_code));

        TrialBalance {
            is_balanced: total_debits == total_credits,
            entries,
            total_debits,
            total_credits,
        }
    }

    fn validate_balance(&self, draft: &EntryDraft) -> Result<(), LedgerError> {
        let mut total_debits = Money::zero(self.currency);
        let mut total_credits = Money::zero(self.currency);

        for line in &draft.lines {
            if let Some(debit) = &line.debit {
                total_debits = total_debits
                    .checked_add(debit)
                    .map_err(|e| LedgerError::Calculation(e.to_string()))?;
            }
            if let Some(credit) = &line.credit {
                total_credits = total_credits
                    .checked_add(credit)
                    .map_err(|e| LedgerError::Calculation(e.to_string()))?;
            }
        }

        if total_debits != total_credits {
            return Err(LedgerError::Imbalance {
                debits: total_debits.amount(),
                credits: total_credits.amount(),
            });
        }

        Ok(())
    }
}

/// Trial balance report
#[derive(Debug)]
pub struct TrialBalance {
    /// Individual account entries, ordered by code
    pub entries: Vec<TrialBalanceEntry>,
    /// Total debits
    pub total_debits: Money,
    /// Total credits
    pub total_credits: Money,
    /// Whether the trial balance is balanced
    pub is_balanced: bool,
}

/// A single entry in the trial balance
#[derive(Debug)]
pub struct TrialBalanceEntry {
    /// Account ID
    pub account_id: AccountId,
    /// Account code
    pub account_code: String,
    /// Account name
    pub account_name: String,
    /// Debit balance
    pub debit: Money,
    /// Credit balance
    pub credit: Money,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountCode;
    use rust_decimal_macros::dec;

    fn setup() -> (ChartRegistry, JournalBook, EntityId) {
        let entity = EntityId::new();
        let mut registry = ChartRegistry::new();
        registry.ensure_standard(entity);
        let book = JournalBook::new(entity, Currency::USD);
        (registry, book, entity)
    }

    #[test]
    fn test_balanced_entry_posts() {
        let (registry, mut book, _) = setup();
        let amount = Money::new(dec!(1500), Currency::USD);

        let draft = EntryDraft::new("Rent receipt")
            .debit(AccountCode::Cash, amount)
            .credit(AccountCode::RentalIncome, amount);

        let id = book.post(&registry, draft).unwrap();
        let entry = book.entry(&id).unwrap();
        assert!(entry.is_locked);
        assert_eq!(entry.lines.len(), 2);
    }

    #[test]
    fn test_imbalanced_entry_rejected_and_nothing_persisted() {
        let (registry, mut book, _) = setup();

        let draft = EntryDraft::new("Broken")
            .debit(AccountCode::Cash, Money::new(dec!(100), Currency::USD))
            .credit(
                AccountCode::AccountsReceivable,
                Money::new(dec!(99), Currency::USD),
            );

        let result = book.post(&registry, draft);
        match result {
            Err(LedgerError::Imbalance { debits, credits }) => {
                assert_eq!(debits, dec!(100));
                assert_eq!(credits, dec!(99));
            }
            other => panic!("expected Imbalance, got {other:?}"),
        }
        assert!(book.entries().is_empty());
    }

    #[test]
    fn test_unconfigured_account_rejected() {
        let entity = EntityId::new();
        let registry = ChartRegistry::new(); // nothing configured
        let mut book = JournalBook::new(entity, Currency::USD);
        let amount = Money::new(dec!(10), Currency::USD);

        let draft = EntryDraft::new("Orphan")
            .debit(AccountCode::Cash, amount)
            .credit(AccountCode::RentalIncome, amount);

        assert!(matches!(
            book.post(&registry, draft),
            Err(LedgerError::UnconfiguredAccount { .. })
        ));
        assert!(book.entries().is_empty());
    }

    #[test]
    fn test_offsetting_entry_nets_to_zero() {
        let (registry, mut book, entity) = setup();
        let amount = Money::new(dec!(250), Currency::USD);

        let id = book
            .post(
                &registry,
                EntryDraft::new("Cash payment")
                    .debit(AccountCode::Cash, amount)
                    .credit(AccountCode::AccountsReceivable, amount),
            )
            .unwrap();

        book.post_offsetting(&id, "payment reversed").unwrap();

        let cash = registry.resolve(entity, AccountCode::Cash).unwrap().id;
        assert!(book.account_net(&cash).is_zero());
    }

    #[test]
    fn test_trial_balance_balances() {
        let (registry, mut book, _) = setup();
        let rent = Money::new(dec!(1500), Currency::USD);
        let bill = Money::new(dec!(320.55), Currency::USD);

        book.post(
            &registry,
            EntryDraft::new("Rent receipt")
                .debit(AccountCode::Cash, rent)
                .credit(AccountCode::RentalIncome, rent),
        )
        .unwrap();

        book.post(
            &registry,
            EntryDraft::new("Water bill")
                .debit(AccountCode::UtilityExpense, bill)
                .credit(AccountCode::AccountsPayable, bill),
        )
        .unwrap();

        let tb = book.trial_balance(&registry);
        assert!(tb.is_balanced);
        assert_eq!(tb.total_debits, tb.total_credits);
        assert_eq!(tb.entries.len(), 4);
    }
}
