// 🗄️ Ledger Store - SQLite persistence for accounts, categories, transactions
//
// Three tables keyed by auto-incrementing integer ids. Transactions reference
// accounts/categories by id with no cascade: deleting a referenced row would
// orphan transactions, so nothing here deletes accounts or categories.
//
// Amounts are stored as TEXT (exact decimal) and summed in Rust.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{ToSql, Type};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::entities::{
    Account, Category, CategoryType, NewAccount, NewTransaction, OwnerFilter, Transaction,
    TransactionFilter, TransactionRow,
};
use crate::error::{LedgerError, LedgerResult};

// ============================================================================
// CONNECTION & SCHEMA
// ============================================================================

/// Open (creating if needed) the ledger database at `path`
pub fn open_database(path: &Path, wal: bool) -> LedgerResult<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)?;
    if wal {
        // WAL for crash recovery
        conn.pragma_update(None, "journal_mode", "WAL")?;
    }
    setup_database(&conn)?;

    tracing::debug!(path = %path.display(), wal, "ledger database opened");
    Ok(conn)
}

pub fn open_in_memory() -> LedgerResult<Connection> {
    let conn = Connection::open_in_memory()?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> LedgerResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            owner TEXT NOT NULL DEFAULT 'primary',
            type TEXT NOT NULL DEFAULT 'checking',
            initial_balance TEXT NOT NULL DEFAULT '0'
        );

        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            type TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            amount TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            account_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            owner TEXT NOT NULL DEFAULT 'primary',
            paid_by TEXT NOT NULL DEFAULT 'primary',
            split_mode TEXT NOT NULL DEFAULT 'none',
            card_label TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
        CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id);",
    )?;

    Ok(())
}

/// Run `f` inside one SQLite transaction: commit on Ok, roll back on Err.
pub fn in_transaction<T, F>(conn: &Connection, f: F) -> LedgerResult<T>
where
    F: FnOnce(&Connection) -> LedgerResult<T>,
{
    let tx = conn.unchecked_transaction()?;
    let value = f(&*tx)?;
    tx.commit()?;
    Ok(value)
}

fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// ============================================================================
// ACCOUNTS
// ============================================================================

const ACCOUNT_COLUMNS: &str = "id, name, owner, type, initial_balance";

fn map_account(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        owner: row.get(2)?,
        account_type: row.get(3)?,
        initial_balance: decimal_at(row, 4)?,
    })
}

pub fn insert_account(conn: &Connection, account: &NewAccount) -> LedgerResult<i64> {
    conn.execute(
        "INSERT INTO accounts (name, owner, type, initial_balance) VALUES (?1, ?2, ?3, ?4)",
        params![
            account.name,
            account.owner,
            account.account_type,
            account.initial_balance.to_string(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_account(conn: &Connection, id: i64) -> LedgerResult<Option<Account>> {
    let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], map_account).optional()?)
}

pub fn get_account_by_name(conn: &Connection, name: &str) -> LedgerResult<Option<Account>> {
    let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE name = ?1 ORDER BY id LIMIT 1");
    Ok(conn.query_row(&sql, [name], map_account).optional()?)
}

/// All accounts ordered by name ascending
pub fn list_accounts(conn: &Connection) -> LedgerResult<Vec<Account>> {
    let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY name ASC, id ASC");
    let mut stmt = conn.prepare(&sql)?;
    let accounts = stmt
        .query_map([], map_account)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(accounts)
}

/// Returns false when the account does not exist
pub fn update_account_initial_balance(
    conn: &Connection,
    id: i64,
    initial_balance: Decimal,
) -> LedgerResult<bool> {
    let changed = conn.execute(
        "UPDATE accounts SET initial_balance = ?1 WHERE id = ?2",
        params![initial_balance.to_string(), id],
    )?;
    Ok(changed > 0)
}

pub fn count_accounts(conn: &Connection) -> LedgerResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))?)
}

// ============================================================================
// CATEGORIES
// ============================================================================

fn map_category(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        category_type: row.get(2)?,
    })
}

pub fn insert_category(
    conn: &Connection,
    name: &str,
    category_type: CategoryType,
) -> LedgerResult<i64> {
    conn.execute(
        "INSERT INTO categories (name, type) VALUES (?1, ?2)",
        params![name, category_type],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_category(conn: &Connection, id: i64) -> LedgerResult<Option<Category>> {
    Ok(conn
        .query_row(
            "SELECT id, name, type FROM categories WHERE id = ?1",
            [id],
            map_category,
        )
        .optional()?)
}

pub fn get_category_by_name(conn: &Connection, name: &str) -> LedgerResult<Option<Category>> {
    Ok(conn
        .query_row(
            "SELECT id, name, type FROM categories WHERE name = ?1 ORDER BY id LIMIT 1",
            [name],
            map_category,
        )
        .optional()?)
}

/// First category (by id) whose name contains `fragment`
pub fn find_category_containing(
    conn: &Connection,
    fragment: &str,
) -> LedgerResult<Option<Category>> {
    Ok(conn
        .query_row(
            "SELECT id, name, type FROM categories
             WHERE instr(name, ?1) > 0
             ORDER BY id LIMIT 1",
            [fragment],
            map_category,
        )
        .optional()?)
}

/// All categories ordered by type, then name
pub fn list_categories(conn: &Connection) -> LedgerResult<Vec<Category>> {
    let mut stmt =
        conn.prepare("SELECT id, name, type FROM categories ORDER BY type ASC, name ASC, id ASC")?;
    let categories = stmt
        .query_map([], map_category)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(categories)
}

pub fn count_categories(conn: &Connection) -> LedgerResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?)
}

// ============================================================================
// TRANSACTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str = "id, date, amount, description, account_id, category_id,
     owner, paid_by, split_mode, card_label, created_at, updated_at";

fn map_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        date: row.get(1)?,
        amount: decimal_at(row, 2)?,
        description: row.get(3)?,
        account_id: row.get(4)?,
        category_id: row.get(5)?,
        owner: row.get(6)?,
        paid_by: row.get(7)?,
        split_mode: row.get(8)?,
        card_label: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

pub fn insert_transaction(
    conn: &Connection,
    tx: &NewTransaction,
    now: DateTime<Utc>,
) -> LedgerResult<i64> {
    conn.execute(
        "INSERT INTO transactions (
            date, amount, description, account_id, category_id,
            owner, paid_by, split_mode, card_label, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            tx.date,
            tx.amount.to_string(),
            tx.description,
            tx.account_id,
            tx.category_id,
            tx.owner,
            tx.paid_by,
            tx.split_mode,
            tx.card_label,
            now,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_transaction(conn: &Connection, id: i64) -> LedgerResult<Option<Transaction>> {
    let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1");
    Ok(conn.query_row(&sql, [id], map_transaction).optional()?)
}

/// Overwrite every mutable column of an existing row
pub fn save_transaction(conn: &Connection, tx: &Transaction) -> LedgerResult<bool> {
    let changed = conn.execute(
        "UPDATE transactions SET
            date = ?1, amount = ?2, description = ?3, account_id = ?4, category_id = ?5,
            owner = ?6, paid_by = ?7, split_mode = ?8, card_label = ?9, updated_at = ?10
         WHERE id = ?11",
        params![
            tx.date,
            tx.amount.to_string(),
            tx.description,
            tx.account_id,
            tx.category_id,
            tx.owner,
            tx.paid_by,
            tx.split_mode,
            tx.card_label,
            tx.updated_at,
            tx.id,
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_transaction(conn: &Connection, id: i64) -> LedgerResult<bool> {
    let changed = conn.execute("DELETE FROM transactions WHERE id = ?1", [id])?;
    Ok(changed > 0)
}

/// Enriched listing, newest first with id as the tie-break.
///
/// Inner joins: a transaction whose account or category row is gone does not
/// show up here (it still counts towards balances).
pub fn query_transactions(
    conn: &Connection,
    filter: &TransactionFilter,
) -> LedgerResult<Vec<TransactionRow>> {
    let mut sql = String::from(
        "SELECT t.id, t.date, t.amount, t.description,
                a.id, a.name, a.type,
                c.id, c.name, c.type,
                t.owner, t.paid_by, t.split_mode, t.card_label
         FROM transactions t
         JOIN accounts a ON t.account_id = a.id
         JOIN categories c ON t.category_id = c.id
         WHERE 1 = 1",
    );
    let mut args: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(start) = filter.start {
        sql.push_str(" AND t.date >= ?");
        args.push(Box::new(start));
    }
    if let Some(end) = filter.end {
        sql.push_str(" AND t.date <= ?");
        args.push(Box::new(end));
    }
    if let OwnerFilter::Only(owner) = filter.owner {
        sql.push_str(" AND t.owner = ?");
        args.push(Box::new(owner));
    }
    if let Some(account_id) = filter.account_id {
        sql.push_str(" AND t.account_id = ?");
        args.push(Box::new(account_id));
    }
    sql.push_str(" ORDER BY t.date DESC, t.id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(args.iter()), |row| {
            Ok(TransactionRow {
                id: row.get(0)?,
                date: row.get(1)?,
                amount: decimal_at(row, 2)?,
                description: row.get(3)?,
                account_id: row.get(4)?,
                account: row.get(5)?,
                account_type: row.get(6)?,
                category_id: row.get(7)?,
                category: row.get(8)?,
                category_type: row.get(9)?,
                owner: row.get(10)?,
                paid_by: row.get(11)?,
                split_mode: row.get(12)?,
                card_label: row.get(13)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// (account_id, amount) for every transaction dated on or before `as_of`
/// (all transactions when `as_of` is None)
pub fn account_amounts(
    conn: &Connection,
    as_of: Option<NaiveDate>,
) -> LedgerResult<Vec<(i64, Decimal)>> {
    let map = |row: &Row<'_>| -> rusqlite::Result<(i64, Decimal)> {
        Ok((row.get(0)?, decimal_at(row, 1)?))
    };

    let amounts = match as_of {
        Some(as_of) => {
            let mut stmt =
                conn.prepare("SELECT account_id, amount FROM transactions WHERE date <= ?1")?;
            let rows = stmt.query_map([as_of], map)?.collect::<Result<Vec<_>, _>>()?;
            rows
        }
        None => {
            let mut stmt = conn.prepare("SELECT account_id, amount FROM transactions")?;
            let rows = stmt.query_map([], map)?.collect::<Result<Vec<_>, _>>()?;
            rows
        }
    };

    Ok(amounts)
}

/// Amounts of every transaction on one account, unfiltered by date
pub fn amounts_for_account(conn: &Connection, account_id: i64) -> LedgerResult<Vec<Decimal>> {
    let mut stmt = conn.prepare("SELECT amount FROM transactions WHERE account_id = ?1")?;
    let amounts = stmt
        .query_map([account_id], |row| decimal_at(row, 0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(amounts)
}

pub fn count_transactions(conn: &Connection) -> LedgerResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?)
}

/// Reject ids that do not point at existing rows
pub fn ensure_references(conn: &Connection, account_id: i64, category_id: i64) -> LedgerResult<()> {
    if get_account(conn, account_id)?.is_none() {
        return Err(LedgerError::Reference {
            kind: "account",
            id: account_id,
        });
    }
    if get_category(conn, category_id)?.is_none() {
        return Err(LedgerError::Reference {
            kind: "category",
            id: category_id,
        });
    }
    Ok(())
}
