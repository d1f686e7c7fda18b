// 🌱 Seeding, reserved categories and account/category setup
//
// Two categories are anchors for ledger flows and must exist:
// - "invoice payment": both legs of a credit card invoice payment
// - "balance adjustment": manual corrections of an account's balance
// Their names come from configuration; seeding creates them on an empty ledger.

use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db;
use crate::entities::{Account, AccountType, Category, CategoryType, NewAccount, Owner};
use crate::error::{LedgerError, LedgerResult};

// ============================================================================
// RESERVED CATEGORIES
// ============================================================================

/// Configured names of the reserved categories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedNames {
    /// Matched as a substring of the category name
    pub invoice: String,
    /// Matched exactly
    pub adjustment: String,
}

impl Default for ReservedNames {
    fn default() -> Self {
        ReservedNames {
            invoice: "Invoice payment".to_string(),
            adjustment: "Balance adjustment".to_string(),
        }
    }
}

/// Reserved category ids as found in the store; `None` = missing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservedCategories {
    invoice: Option<i64>,
    adjustment: Option<i64>,
    names: ReservedNames,
}

impl ReservedCategories {
    pub fn resolve(conn: &Connection, names: &ReservedNames) -> LedgerResult<Self> {
        let invoice = db::find_category_containing(conn, &names.invoice)?.map(|c| c.id);
        let adjustment = db::get_category_by_name(conn, &names.adjustment)?.map(|c| c.id);

        if invoice.is_none() {
            tracing::warn!(name = %names.invoice, "invoice payment category not found");
        }
        if adjustment.is_none() {
            tracing::warn!(name = %names.adjustment, "balance adjustment category not found");
        }

        Ok(ReservedCategories {
            invoice,
            adjustment,
            names: names.clone(),
        })
    }

    pub fn invoice(&self) -> LedgerResult<i64> {
        self.invoice.ok_or_else(|| {
            LedgerError::Configuration(format!(
                "category '{}' not found, invoice payments are disabled",
                self.names.invoice
            ))
        })
    }

    pub fn adjustment(&self) -> LedgerResult<i64> {
        self.adjustment.ok_or_else(|| {
            LedgerError::Configuration(format!(
                "category '{}' not found, balance adjustments are disabled",
                self.names.adjustment
            ))
        })
    }

    /// Problems to show before enabling dependent operations
    pub fn missing(&self) -> Vec<String> {
        [self.invoice(), self.adjustment()]
            .into_iter()
            .filter_map(|r| r.err().map(|e| e.to_string()))
            .collect()
    }
}

// ============================================================================
// SEEDING
// ============================================================================

const DEFAULT_ACCOUNTS: &[(&str, AccountType)] = &[
    ("Main checking", AccountType::Checking),
    ("Savings", AccountType::Savings),
    ("Credit card", AccountType::Credit),
];

const DEFAULT_CATEGORIES: &[(&str, CategoryType)] = &[
    ("Food", CategoryType::Expense),
    ("Interest", CategoryType::Income),
    ("Housing", CategoryType::Expense),
    ("Other", CategoryType::Expense),
    ("Salary", CategoryType::Income),
    ("Personal", CategoryType::Expense),
    ("Transport", CategoryType::Expense),
    ("Gifts", CategoryType::Expense),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub accounts_added: usize,
    pub categories_added: usize,
}

/// Fill an empty ledger with default accounts and categories.
///
/// Accounts and categories are seeded independently, each only when its table
/// is empty; running it again changes nothing.
pub fn seed_defaults(conn: &Connection, names: &ReservedNames) -> LedgerResult<SeedReport> {
    let report = db::in_transaction(conn, |tx| {
        let mut report = SeedReport::default();

        if db::count_accounts(tx)? == 0 {
            for (name, account_type) in DEFAULT_ACCOUNTS {
                db::insert_account(tx, &NewAccount::new(name, Owner::Primary, *account_type))?;
                report.accounts_added += 1;
            }
        }

        if db::count_categories(tx)? == 0 {
            for (name, category_type) in DEFAULT_CATEGORIES {
                db::insert_category(tx, name, *category_type)?;
                report.categories_added += 1;
            }
            db::insert_category(tx, &names.invoice, CategoryType::Transfer)?;
            db::insert_category(tx, &names.adjustment, CategoryType::Transfer)?;
            report.categories_added += 2;
        }

        Ok(report)
    })?;

    if report != SeedReport::default() {
        tracing::info!(
            accounts = report.accounts_added,
            categories = report.categories_added,
            "ledger seeded with defaults"
        );
    }
    Ok(report)
}

// ============================================================================
// ACCOUNT & CATEGORY SETUP
// ============================================================================

pub fn create_account(
    conn: &Connection,
    name: &str,
    owner: Owner,
    account_type: AccountType,
    initial_balance: Decimal,
) -> LedgerResult<i64> {
    let account = NewAccount::new(name, owner, account_type).with_initial_balance(initial_balance);
    if account.name.is_empty() {
        return Err(LedgerError::validation("account name", name));
    }

    let id = db::insert_account(conn, &account)?;
    tracing::info!(id, name = %account.name, account_type = %account_type, "account created");
    Ok(id)
}

pub fn create_category(
    conn: &Connection,
    name: &str,
    category_type: CategoryType,
) -> LedgerResult<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LedgerError::validation("category name", name));
    }

    let id = db::insert_category(conn, name, category_type)?;
    tracing::info!(id, name, category_type = %category_type, "category created");
    Ok(id)
}

/// Overwrite an account's initial balance. Day-to-day corrections go through
/// `adjustment::adjust_balance` instead; returns false for an unknown id.
pub fn set_initial_balance(
    conn: &Connection,
    account_id: i64,
    initial_balance: Decimal,
) -> LedgerResult<bool> {
    let updated = db::update_account_initial_balance(conn, account_id, initial_balance)?;
    if updated {
        tracing::info!(account_id, initial_balance = %initial_balance, "initial balance set");
    }
    Ok(updated)
}

pub fn accounts(conn: &Connection) -> LedgerResult<Vec<Account>> {
    db::list_accounts(conn)
}

pub fn categories(conn: &Connection) -> LedgerResult<Vec<Category>> {
    db::list_categories(conn)
}
