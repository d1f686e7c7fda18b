// 📒 Transaction Service - validated writes and balance queries
//
// Stateless: every call works against the connection it is given and keeps
// nothing between calls. Enum fields arrive already typed (parsing is where
// unknown owner/paid_by/split_mode values are rejected); references to
// accounts and categories are checked here before anything is written.

use chrono::Utc;
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::db;
use crate::entities::{
    normalize_card_label, NewTransaction, TransactionFilter, TransactionPatch, TransactionRow,
};
use crate::error::{LedgerError, LedgerResult};

/// Append one transaction. Amount is stored exactly as given (no re-rounding).
pub fn create(conn: &Connection, tx: &NewTransaction) -> LedgerResult<i64> {
    db::ensure_references(conn, tx.account_id, tx.category_id)?;
    let id = db::insert_transaction(conn, tx, Utc::now())?;

    tracing::info!(
        id,
        date = %tx.date,
        amount = %tx.amount,
        account_id = tx.account_id,
        category_id = tx.category_id,
        "transaction created"
    );
    Ok(id)
}

/// Create several transactions as one unit: all are written or none are.
pub fn create_batch(conn: &Connection, batch: &[NewTransaction]) -> LedgerResult<Vec<i64>> {
    let total = batch.len();

    db::in_transaction(conn, |tx| {
        let mut ids = Vec::with_capacity(total);
        for (idx, new) in batch.iter().enumerate() {
            let id = create(tx, new).map_err(|source| LedgerError::Batch {
                failed_at: idx + 1,
                total,
                source: Box::new(source),
            })?;
            ids.push(id);
        }
        Ok(ids)
    })
    .inspect_err(|e| tracing::warn!(error = %e, "batch rolled back"))
}

/// Apply `patch` to transaction `id`.
///
/// Missing id is a soft-fail: nothing is written and `Ok(false)` comes back.
pub fn update(conn: &Connection, id: i64, patch: &TransactionPatch) -> LedgerResult<bool> {
    let Some(mut tx) = db::get_transaction(conn, id)? else {
        tracing::warn!(id, "update skipped: transaction not found");
        return Ok(false);
    };

    if let Some(account_id) = patch.account_id {
        if db::get_account(conn, account_id)?.is_none() {
            return Err(LedgerError::Reference {
                kind: "account",
                id: account_id,
            });
        }
    }
    if let Some(category_id) = patch.category_id {
        if db::get_category(conn, category_id)?.is_none() {
            return Err(LedgerError::Reference {
                kind: "category",
                id: category_id,
            });
        }
    }

    patch.apply(&mut tx);
    // labels only survive on credit accounts, including after a move
    if let Some(account) = db::get_account(conn, tx.account_id)? {
        tx.card_label = normalize_card_label(account.account_type, tx.card_label.as_deref());
    }
    tx.updated_at = Utc::now();
    let saved = db::save_transaction(conn, &tx)?;

    tracing::info!(id, "transaction updated");
    Ok(saved)
}

/// Delete transaction `id`; `Ok(false)` when it does not exist
pub fn delete(conn: &Connection, id: i64) -> LedgerResult<bool> {
    let deleted = db::delete_transaction(conn, id)?;
    if deleted {
        tracing::info!(id, "transaction deleted");
    } else {
        tracing::warn!(id, "delete skipped: transaction not found");
    }
    Ok(deleted)
}

/// Enriched transactions matching `filter`, date desc then id desc
pub fn list(conn: &Connection, filter: &TransactionFilter) -> LedgerResult<Vec<TransactionRow>> {
    let rows = db::query_transactions(conn, filter)?;
    tracing::debug!(count = rows.len(), "transactions listed");
    Ok(rows)
}

/// Live balance: initial_balance + every transaction on the account,
/// regardless of date
pub fn balance(conn: &Connection, account_id: i64) -> LedgerResult<Decimal> {
    let account = db::get_account(conn, account_id)?.ok_or(LedgerError::Reference {
        kind: "account",
        id: account_id,
    })?;

    let total: Decimal = db::amounts_for_account(conn, account_id)?.into_iter().sum();
    Ok(account.initial_balance + total)
}
