//! Per-entity chart of accounts registry
//!
//! The registry is an explicitly-owned lookup cache from symbolic account
//! code to the entity's concrete account record. It is populated by an
//! idempotent `ensure` bootstrap and invalidated explicitly when an
//! administrator edits the chart; correctness never relies on process
//! lifetime.

use std::collections::HashMap;

use core_kernel::EntityId;
use tracing::debug;

use crate::account::{standard_accounts, Account, AccountCode};
use crate::error::LedgerError;

/// Registry of configured accounts, keyed by entity then code
#[derive(Debug, Default)]
pub struct ChartRegistry {
    entities: HashMap<EntityId, HashMap<String, Account>>,
}

impl ChartRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotently installs accounts for an entity
    ///
    /// Existing accounts are never replaced: an account that may already be
    /// referenced by posted lines is immutable. Only codes missing from the
    /// entity's chart are added.
    pub fn ensure(&mut self, entity_id: EntityId, accounts: Vec<Account>) {
        let chart = self.entities.entry(entity_id).or_default();
        for account in accounts {
            if !chart.contains_key(&account.code) {
                debug!(entity = %entity_id, code = %account.code, "configuring account");
                chart.insert(account.code.clone(), account);
            }
        }
    }

    /// Installs the standard property chart for an entity
    pub fn ensure_standard(&mut self, entity_id: EntityId) {
        self.ensure(entity_id, standard_accounts(entity_id));
    }

    /// Drops the cached chart for an entity
    ///
    /// Called after any administrative edit of the account table; the next
    /// `ensure` rebuilds the lookup from the store.
    pub fn invalidate(&mut self, entity_id: EntityId) {
        self.entities.remove(&entity_id);
    }

    /// Resolves a symbolic code to the entity's account
    pub fn resolve(&self, entity_id: EntityId, symbol: AccountCode) -> Result<&Account, LedgerError> {
        self.resolve_code(entity_id, symbol.code())
    }

    /// Resolves a raw code string to the entity's account
    pub fn resolve_code(&self, entity_id: EntityId, code: &str) -> Result<&Account, LedgerError> {
        self.entities
            .get(&entity_id)
            .and_then(|chart| chart.get(code))
            .filter(|account| account.is_active)
            .ok_or_else(|| LedgerError::UnconfiguredAccount {
                code: code.to_string(),
            })
    }

    /// Returns all configured accounts for an entity
    pub fn accounts(&self, entity_id: EntityId) -> Vec<&Account> {
        self.entities
            .get(&entity_id)
            .map(|chart| chart.values().collect())
            .unwrap_or_default()
    }
}
