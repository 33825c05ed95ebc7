//! Account types for the chart of accounts
//!
//! This module defines the account structure for double-entry bookkeeping
//! and the fixed catalog of symbolic codes the rest of the platform posts
//! against.

use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, EntityId};

/// Types of accounts in the chart of accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    /// Asset accounts (debit normal balance)
    Asset,
    /// Liability accounts (credit normal balance)
    Liability,
    /// Equity accounts (credit normal balance)
    Equity,
    /// Income accounts (credit normal balance)
    Income,
    /// Expense accounts (debit normal balance)
    Expense,
}

impl AccountType {
    /// Returns true if this account type has a debit normal balance
    pub fn is_debit_normal(&self) -> bool {
        matches!(self, AccountType::Asset | AccountType::Expense)
    }
}

/// The fixed, well-known symbolic account codes
///
/// Codes are grouped by standard ranges: assets 1000s, liabilities 2000s,
/// equity 3000s, income 4000s, expenses 5000s. Resolving a code to a
/// concrete account is a pure lookup against the entity's configured
/// accounts; this catalog itself holds no mutable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountCode {
    Cash,
    AccountsReceivable,
    AccountsPayable,
    SecurityDepositLiability,
    RetainedEarnings,
    RentalIncome,
    UtilityRecoveryIncome,
    LateFeeIncome,
    MaintenanceIncome,
    UtilityExpense,
    MaintenanceExpense,
    ManagementFees,
}

impl AccountCode {
    /// Returns the numeric code string (e.g., "1100")
    pub fn code(&self) -> &'static str {
        match self {
            AccountCode::Cash => "1000",
            AccountCode::AccountsReceivable => "1100",
            AccountCode::AccountsPayable => "2000",
            AccountCode::SecurityDepositLiability => "2100",
            AccountCode::RetainedEarnings => "3000",
            AccountCode::RentalIncome => "4000",
            AccountCode::UtilityRecoveryIncome => "4100",
            AccountCode::LateFeeIncome => "4200",
            AccountCode::MaintenanceIncome => "4300",
            AccountCode::UtilityExpense => "5000",
            AccountCode::MaintenanceExpense => "5100",
            AccountCode::ManagementFees => "5200",
        }
    }

    /// Returns the display name
    pub fn name(&self) -> &'static str {
        match self {
            AccountCode::Cash => "Cash",
            AccountCode::AccountsReceivable => "Accounts Receivable",
            AccountCode::AccountsPayable => "Accounts Payable",
            AccountCode::SecurityDepositLiability => "Security Deposit Liability",
            AccountCode::RetainedEarnings => "Retained Earnings",
            AccountCode::RentalIncome => "Rental Income",
            AccountCode::UtilityRecoveryIncome => "Utility Recovery Income",
            AccountCode::LateFeeIncome => "Late Fee Income",
            AccountCode::MaintenanceIncome => "Maintenance Income",
            AccountCode::UtilityExpense => "Utility Expense",
            AccountCode::MaintenanceExpense => "Maintenance Expense",
            AccountCode::ManagementFees => "Management Fees",
        }
    }

    /// Returns the account type implied by the code range
    pub fn account_type(&self) -> AccountType {
        match self {
            AccountCode::Cash | AccountCode::AccountsReceivable => AccountType::Asset,
            AccountCode::AccountsPayable | AccountCode::SecurityDepositLiability => {
                AccountType::Liability
            }
            AccountCode::RetainedEarnings => AccountType::Equity,
            AccountCode::RentalIncome
            | AccountCode::UtilityRecoveryIncome
            | AccountCode::LateFeeIncome
            | AccountCode::MaintenanceIncome => AccountType::Income,
            AccountCode::UtilityExpense
            | AccountCode::MaintenanceExpense
            | AccountCode::ManagementFees => AccountType::Expense,
        }
    }

    /// All well-known codes, in chart order
    pub fn all() -> &'static [AccountCode] {
        &[
            AccountCode::Cash,
            AccountCode::AccountsReceivable,
            AccountCode::AccountsPayable,
            AccountCode::SecurityDepositLiability,
            AccountCode::RetainedEarnings,
            AccountCode::RentalIncome,
            AccountCode::UtilityRecoveryIncome,
            AccountCode::LateFeeIncome,
            AccountCode::MaintenanceIncome,
            AccountCode::UtilityExpense,
            AccountCode::MaintenanceExpense,
            AccountCode::ManagementFees,
        ]
    }

    /// Parses a numeric code string back into the symbolic code
    pub fn from_code(code: &str) -> Option<AccountCode> {
        AccountCode::all().iter().copied().find(|c| c.code() == code)
    }
}

/// An account in an entity's chart of accounts
///
/// Accounts are immutable once referenced by a posted entry; the registry
/// never replaces an existing account on re-bootstrap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier
    pub id: AccountId,
    /// Owning financial entity (one per organization)
    pub entity_id: EntityId,
    /// Account code (e.g., "1100")
    pub code: String,
    /// Account name
    pub name: String,
    /// Account type
    pub account_type: AccountType,
    /// Whether account is active
    pub is_active: bool,
}

impl Account {
    /// Creates a new account
    pub fn new(
        id: AccountId,
        entity_id: EntityId,
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
    ) -> Self {
        Self {
            id,
            entity_id,
            code: code.into(),
            name: name.into(),
            account_type,
            is_active: true,
        }
    }

    /// Creates an account from a well-known symbolic code
    pub fn from_symbol(entity_id: EntityId, symbol: AccountCode) -> Self {
        Self::new(
            AccountId::new(),
            entity_id,
            symbol.code(),
            symbol.name(),
            symbol.account_type(),
        )
    }
}

/// Creates the standard property-management chart for an entity
pub fn standard_accounts(entity_id: EntityId) -> Vec<Account> {
    AccountCode::all()
        .iter()
        .map(|symbol| Account::from_symbol(entity_id, *symbol))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_type_is_debit_normal() {
        assert!(AccountType::Asset.is_debit_normal());
        assert!(AccountType::Expense.is_debit_normal());
        assert!(!AccountType::Liability.is_debit_normal());
        assert!(!AccountType::Equity.is_debit_normal());
        assert!(!AccountType::Income.is_debit_normal());
    }

    #[test]
    fn test_codes_follow_standard_ranges() {
        for symbol in AccountCode::all() {
            let leading = symbol.code().chars().next().unwrap();
            match symbol.account_type() {
                AccountType::Asset => assert_eq!(leading, '1'),
                AccountType::Liability => assert_eq!(leading, '2'),
                AccountType::Equity => assert_eq!(leading, '3'),
                AccountType::Income => assert_eq!(leading, '4'),
                AccountType::Expense => assert_eq!(leading, '5'),
            }
        }
    }

    #[test]
    fn test_code_roundtrip() {
        for symbol in AccountCode::all() {
            assert_eq!(AccountCode::from_code(symbol.code()), Some(*symbol));
        }
        assert_eq!(AccountCode::from_code("9999"), None);
    }

    #[test]
    fn test_standard_accounts_cover_all_codes() {
        let entity = EntityId::new();
        let accounts = standard_accounts(entity);
        assert_eq!(accounts.len(), AccountCode::all().len());
        assert!(accounts.iter().all(|a| a.entity_id == entity && a.is_active));
    }
}
