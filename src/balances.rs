// 📊 Balance Aggregator - per-account, cash and credit figures for dashboards
//
// balance(account, as_of) = initial_balance + Σ amounts dated <= as_of
// (every transaction when as_of is None).
//
// Credit accounts: a negative balance is the amount owed on the invoice, a
// positive balance is money in the user's favor.
//
// Nothing is cached; each call recomputes from the store. Personal-scale
// volumes (hundreds to low thousands of rows) keep this cheap.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::db;
use crate::entities::AccountType;
use crate::error::LedgerResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account_id: i64,
    pub account: String,
    pub account_type: AccountType,
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditOutstanding {
    pub account_id: i64,
    pub account: String,
    /// max(0, -balance)
    pub owed: Decimal,
    /// max(0, balance)
    pub in_credit: Decimal,
    pub balance: Decimal,
}

/// Split a credit account balance into (owed, in_credit)
pub fn split_credit_balance(balance: Decimal) -> (Decimal, Decimal) {
    let owed = (-balance).max(Decimal::ZERO);
    let in_credit = balance.max(Decimal::ZERO);
    (owed, in_credit)
}

/// Balance of every account, ordered by account name.
///
/// Credit accounts are left out entirely when `include_credit` is false.
pub fn balances_by_account(
    conn: &Connection,
    include_credit: bool,
    as_of: Option<NaiveDate>,
) -> LedgerResult<Vec<AccountBalance>> {
    let mut sums: HashMap<i64, Decimal> = HashMap::new();
    for (account_id, amount) in db::account_amounts(conn, as_of)? {
        *sums.entry(account_id).or_default() += amount;
    }

    let balances: Vec<AccountBalance> = db::list_accounts(conn)?
        .into_iter()
        .filter(|account| include_credit || !account.is_credit())
        .map(|account| AccountBalance {
            balance: account.initial_balance
                + sums.get(&account.id).copied().unwrap_or_default(),
            account_id: account.id,
            account: account.name,
            account_type: account.account_type,
        })
        .collect();

    tracing::debug!(accounts = balances.len(), ?as_of, include_credit, "balances computed");
    Ok(balances)
}

/// Cash available: sum over non-credit accounts
pub fn cash_total_balance(conn: &Connection, as_of: Option<NaiveDate>) -> LedgerResult<Decimal> {
    Ok(balances_by_account(conn, false, as_of)?
        .iter()
        .map(|b| b.balance)
        .sum())
}

/// Owed / in-credit split for each credit account, ordered by account name
pub fn credit_outstanding_by_account(
    conn: &Connection,
    as_of: Option<NaiveDate>,
) -> LedgerResult<Vec<CreditOutstanding>> {
    Ok(balances_by_account(conn, true, as_of)?
        .into_iter()
        .filter(|b| b.account_type.is_credit())
        .map(|b| {
            let (owed, in_credit) = split_credit_balance(b.balance);
            CreditOutstanding {
                account_id: b.account_id,
                account: b.account,
                owed,
                in_credit,
                balance: b.balance,
            }
        })
        .collect())
}

/// Total owed across all credit accounts
pub fn total_credit_outstanding(
    conn: &Connection,
    as_of: Option<NaiveDate>,
) -> LedgerResult<Decimal> {
    Ok(credit_outstanding_by_account(conn, as_of)?
        .iter()
        .map(|c| c.owed)
        .sum())
}
