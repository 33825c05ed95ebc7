//! Ledger repository
//!
//! Persists journal entries with their lines in a single transaction and
//! keeps the in-process chart registry in sync with the accounts table.
//! Validation (balance, account resolution) runs through the domain
//! posting engine before any row is written.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use core_kernel::{Currency, DomainPort, EntityId, JournalEntryId, PortError};
use domain_ledger::{
    standard_accounts, Account, AccountType, ChartRegistry, EntryDraft, JournalBook, JournalEntry,
};
use domain_posting::LedgerStore;

use crate::error::DatabaseError;

fn account_type_to_str(account_type: AccountType) -> &'static str {
    match account_type {
        AccountType::Asset => "ASSET",
        AccountType::Liability => "LIABILITY",
        AccountType::Equity => "EQUITY",
        AccountType::Income => "INCOME",
        AccountType::Expense => "EXPENSE",
    }
}

fn account_type_from_str(s: &str) -> Result<AccountType, DatabaseError> {
    match s {
        "ASSET" => Ok(AccountType::Asset),
        "LIABILITY" => Ok(AccountType::Liability),
        "EQUITY" => Ok(AccountType::Equity),
        "INCOME" => Ok(AccountType::Income),
        "EXPENSE" => Ok(AccountType::Expense),
        other => Err(DatabaseError::MappingError(format!(
            "Unknown account type: {other}"
        ))),
    }
}

#[derive(Debug, FromRow)]
struct AccountRow {
    id: Uuid,
    entity_id: Uuid,
    code: String,
    name: String,
    account_type: String,
    is_active: bool,
}

impl AccountRow {
    fn into_domain(self) -> Result<Account, DatabaseError> {
        Ok(Account {
            id: self.id.into(),
            entity_id: self.entity_id.into(),
            code: self.code,
            name: self.name,
            account_type: account_type_from_str(&self.account_type)?,
            is_active: self.is_active,
        })
    }
}

/// Repository for the journal of one financial entity
#[derive(Clone)]
pub struct LedgerRepository {
    pool: PgPool,
    entity_id: EntityId,
    currency: Currency,
    registry: Arc<RwLock<ChartRegistry>>,
}

impl LedgerRepository {
    /// Bootstraps the repository for an entity
    ///
    /// Idempotently installs the standard chart in the accounts table and
    /// loads the entity's configured accounts into the registry cache.
    pub async fn bootstrap(
        pool: PgPool,
        entity_id: EntityId,
        currency: Currency,
    ) -> Result<Self, DatabaseError> {
        for account in standard_accounts(entity_id) {
            sqlx::query(
                r#"
                INSERT INTO accounts (id, entity_id, code, name, account_type, is_active)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (entity_id, code) DO NOTHING
                "#,
            )
            .bind(Uuid::from(account.id))
            .bind(Uuid::from(account.entity_id))
            .bind(&account.code)
            .bind(&account.name)
            .bind(account_type_to_str(account.account_type))
            .bind(account.is_active)
            .execute(&pool)
            .await?;
        }

        let repository = Self {
            pool,
            entity_id,
            currency,
            registry: Arc::new(RwLock::new(ChartRegistry::new())),
        };
        repository.reload_registry().await?;
        Ok(repository)
    }

    /// Rebuilds the registry cache from the accounts table
    pub async fn reload_registry(&self) -> Result<(), DatabaseError> {
        let rows: Vec<AccountRow> = sqlx::query_as(
            "SELECT id, entity_id, code, name, account_type, is_active
             FROM accounts WHERE entity_id = $1",
        )
        .bind(Uuid::from(self.entity_id))
        .fetch_all(&self.pool)
        .await?;

        let accounts = rows
            .into_iter()
            .map(AccountRow::into_domain)
            .collect::<Result<Vec<_>, _>>()?;

        let mut registry = self.registry.write().expect("registry lock poisoned");
        registry.invalidate(self.entity_id);
        registry.ensure(self.entity_id, accounts);
        Ok(())
    }

    /// The entity this repository posts for
    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    /// Validates a draft and persists the committed entry atomically
    pub async fn persist_entry(&self, draft: EntryDraft) -> Result<JournalEntryId, DatabaseError> {
        // Validate and resolve through the domain engine first; the draft
        // never touches the database if it is imbalanced or unresolvable.
        let entry = {
            let registry = self.registry.read().expect("registry lock poisoned");
            let mut book = JournalBook::new(self.entity_id, self.currency);
            let id = book
                .post(&registry, draft)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;
            book.entry(&id)
                .cloned()
                .ok_or_else(|| DatabaseError::MappingError("posted entry missing".to_string()))?
        };

        self.insert_entry(&entry).await?;
        Ok(entry.id)
    }

    async fn insert_entry(&self, entry: &JournalEntry) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO journal_entries (
                id, entity_id, transaction_date, posted_at, description,
                reference, is_locked
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::from(entry.id))
        .bind(Uuid::from(entry.entity_id))
        .bind(entry.transaction_date)
        .bind(entry.posted_at)
        .bind(&entry.description)
        .bind(&entry.reference)
        .bind(entry.is_locked)
        .execute(&mut *tx)
        .await?;

        for line in &entry.lines {
            sqlx::query(
                r#"
                INSERT INTO journal_lines (
                    id, entry_id, account_id, debit, credit, currency,
                    property_id, unit_id, lease_id, tenant_id, memo
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(Uuid::from(line.id))
            .bind(Uuid::from(entry.id))
            .bind(Uuid::from(line.account_id))
            .bind(line.debit.amount())
            .bind(line.credit.amount())
            .bind(self.currency.code())
            .bind(line.dimensions.property_id.map(Uuid::from))
            .bind(line.dimensions.unit_id.map(Uuid::from))
            .bind(line.dimensions.lease_id.map(Uuid::from))
            .bind(line.dimensions.tenant_id.map(Uuid::from))
            .bind(&line.memo)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            entity = %self.entity_id,
            entry = %entry.id,
            lines = entry.lines.len(),
            "journal entry persisted"
        );
        Ok(())
    }
}

impl DomainPort for LedgerRepository {}

#[async_trait]
impl LedgerStore for LedgerRepository {
    async fn post_entry(&self, draft: EntryDraft) -> Result<JournalEntryId, PortError> {
        self.persist_entry(draft).await.map_err(PortError::from)
    }
}
