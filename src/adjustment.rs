// ⚖️ Balance Adjustment
//
// Bring an account to a target balance by writing the difference as one
// transaction under the reserved "balance adjustment" category. The account's
// initial_balance is never touched.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::entities::{round_amount, NewTransaction, Owner, Payer, SplitMode, Transaction};
use crate::error::LedgerResult;
use crate::seed::ReservedCategories;
use crate::{db, transactions};

/// Differences smaller than a cent are treated as already balanced
const TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Returns the adjustment written, or `None` when the balance already matches
pub fn adjust_balance(
    conn: &Connection,
    account_id: i64,
    target: Decimal,
    date: NaiveDate,
    reserved: &ReservedCategories,
) -> LedgerResult<Option<Transaction>> {
    let category_id = reserved.adjustment()?;
    let current = transactions::balance(conn, account_id)?;
    let delta = target - current;

    if delta.abs() < TOLERANCE {
        tracing::info!(account_id, balance = %current, "balance already matches target");
        return Ok(None);
    }

    let new = NewTransaction::new(
        date,
        round_amount(delta),
        &format!("Balance adjustment to {}", round_amount(target)),
        account_id,
        category_id,
    )
    .with_owner(Owner::Primary)
    .with_paid_by(Payer::Primary)
    .with_split_mode(SplitMode::None);

    let id = transactions::create(conn, &new)?;
    tracing::info!(account_id, delta = %new.amount, target = %target, "balance adjusted");

    db::get_transaction(conn, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{AccountType, NewAccount};
    use crate::error::LedgerError;
    use crate::seed::{seed_defaults, ReservedNames};
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn setup() -> (Connection, i64, ReservedCategories) {
        let conn = db::open_in_memory().unwrap();
        let names = ReservedNames::default();
        seed_defaults(&conn, &names).unwrap();
        let acc = db::insert_account(
            &conn,
            &NewAccount::new("Wallet", Owner::Primary, AccountType::Checking)
                .with_initial_balance(dec!(40)),
        )
        .unwrap();
        let reserved = ReservedCategories::resolve(&conn, &names).unwrap();
        (conn, acc, reserved)
    }

    #[test]
    fn test_adjusts_to_target() {
        let (conn, acc, reserved) = setup();

        let tx = adjust_balance(&conn, acc, dec!(25.50), today(), &reserved)
            .unwrap()
            .unwrap();
        assert_eq!(tx.amount, dec!(-14.50));
        assert_eq!(tx.description, "Balance adjustment to 25.50");
        assert_eq!(transactions::balance(&conn, acc).unwrap(), dec!(25.50));
    }

    #[test]
    fn test_no_adjustment_when_balanced() {
        let (conn, acc, reserved) = setup();
        let before = db::count_transactions(&conn).unwrap();

        assert!(adjust_balance(&conn, acc, dec!(40.001), today(), &reserved)
            .unwrap()
            .is_none());
        assert_eq!(db::count_transactions(&conn).unwrap(), before);
    }

    #[test]
    fn test_requires_reserved_category() {
        let (conn, acc, _) = setup();
        assert!(matches!(
            adjust_balance(&conn, acc, dec!(0), today(), &ReservedCategories::default()),
            Err(LedgerError::Configuration(_))
        ));
    }
}
