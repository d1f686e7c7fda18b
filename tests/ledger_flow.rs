// End-to-end ledger flows against an on-disk database

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::TempDir;

use household_ledger::{
    adjust_balance, balances_by_account, cash_total_balance, create_installments,
    credit_outstanding_by_account, db, export_csv, period_summary, seed_defaults, settle_invoice,
    total_credit_outstanding, transactions, InvoicePayment, LedgerError, NewTransaction, Owner,
    OwnerFilter, ReservedCategories, ReservedNames, TransactionFilter, TransactionPatch,
};

struct Ledger {
    _dir: TempDir,
    conn: Connection,
    checking: i64,
    card: i64,
    food: i64,
    salary: i64,
    reserved: ReservedCategories,
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn ledger() -> Ledger {
    let dir = tempfile::tempdir().unwrap();
    let conn = db::open_database(&dir.path().join("data").join("finance.db"), true).unwrap();
    let names = ReservedNames::default();
    seed_defaults(&conn, &names).unwrap();

    let checking = db::get_account_by_name(&conn, "Main checking").unwrap().unwrap().id;
    let card = db::get_account_by_name(&conn, "Credit card").unwrap().unwrap().id;
    let food = db::get_category_by_name(&conn, "Food").unwrap().unwrap().id;
    let salary = db::get_category_by_name(&conn, "Salary").unwrap().unwrap().id;
    let reserved = ReservedCategories::resolve(&conn, &names).unwrap();

    Ledger {
        _dir: dir,
        conn,
        checking,
        card,
        food,
        salary,
        reserved,
    }
}

impl Ledger {
    fn record(&self, date: NaiveDate, amount: Decimal, desc: &str, account: i64, category: i64) -> i64 {
        transactions::create(&self.conn, &NewTransaction::new(date, amount, desc, account, category))
            .unwrap()
    }
}

#[test]
fn test_create_then_list_round_trip() {
    let l = ledger();
    let new = NewTransaction::new(d(2024, 4, 2), dec!(-12.34), "Lunch", l.checking, l.food)
        .with_owner(Owner::Both);
    let id = transactions::create(&l.conn, &new).unwrap();

    let rows = transactions::list(&l.conn, &TransactionFilter::default()).unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.id, id);
    assert_eq!(row.date, d(2024, 4, 2));
    assert_eq!(row.amount, dec!(-12.34));
    assert_eq!(row.description, "Lunch");
    assert_eq!(row.account, "Main checking");
    assert_eq!(row.category, "Food");
    assert_eq!(row.owner, Owner::Both);
}

#[test]
fn test_list_filters_by_owner_and_account() {
    let l = ledger();
    let savings = db::get_account_by_name(&l.conn, "Savings").unwrap().unwrap().id;
    let add = |day: u32, account: i64, owner: Owner| {
        let new = NewTransaction::new(d(2024, 7, day), dec!(-10), "x", account, l.food).with_owner(owner);
        transactions::create(&l.conn, &new).unwrap()
    };
    let a = add(1, l.checking, Owner::Partner);
    let b = add(2, savings, Owner::Primary);
    let c = add(3, savings, Owner::Partner);
    let e = add(3, l.checking, Owner::Both);

    let ids = |filter: &TransactionFilter| -> Vec<i64> {
        transactions::list(&l.conn, filter).unwrap().iter().map(|r| r.id).collect()
    };

    let partner: OwnerFilter = "partner".parse().unwrap();
    let all: OwnerFilter = "all".parse().unwrap();
    assert_eq!(ids(&TransactionFilter::default().with_owner(partner)), vec![c, a]);
    assert_eq!(ids(&TransactionFilter::default().for_account(savings)), vec![c, b]);
    assert_eq!(
        ids(&TransactionFilter::default().with_owner(partner).for_account(l.checking)),
        vec![a]
    );
    assert_eq!(ids(&TransactionFilter::default().with_owner(all)), vec![e, c, b, a]);
}

#[test]
fn test_balance_is_initial_plus_sum() {
    let l = ledger();
    household_ledger::seed::set_initial_balance(&l.conn, l.checking, dec!(150)).unwrap();
    l.record(d(2024, 1, 5), dec!(2000), "Pay", l.checking, l.salary);
    l.record(d(2024, 1, 9), dec!(-45.10), "Market", l.checking, l.food);
    l.record(d(2024, 1, 20), dec!(-4.90), "Bakery", l.checking, l.food);

    assert_eq!(transactions::balance(&l.conn, l.checking).unwrap(), dec!(2100));
    assert_eq!(cash_total_balance(&l.conn, None).unwrap(), dec!(2100));
}

#[test]
fn test_as_of_only_counts_earlier_entries() {
    let l = ledger();
    l.record(d(2024, 1, 5), dec!(100), "Jan", l.checking, l.salary);
    l.record(d(2024, 2, 5), dec!(100), "Feb", l.checking, l.salary);
    l.record(d(2024, 3, 5), dec!(100), "Mar", l.checking, l.salary);

    let at = |date| cash_total_balance(&l.conn, Some(date)).unwrap();
    assert_eq!(at(d(2023, 12, 31)), dec!(0));
    assert_eq!(at(d(2024, 1, 5)), dec!(100));
    assert_eq!(at(d(2024, 2, 28)), dec!(200));
    assert_eq!(at(d(2024, 12, 31)), dec!(300));
}

#[test]
fn test_installments_from_first_creates_all() {
    let l = ledger();
    let base = NewTransaction::new(d(2024, 11, 20), dec!(-100), "Phone", l.card, l.food);
    let ids = create_installments(&l.conn, &base, 1, 3).unwrap();
    assert_eq!(ids.len(), 3);

    let mut rows = transactions::list(&l.conn, &TransactionFilter::default()).unwrap();
    rows.reverse();
    let dates: Vec<_> = rows.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![d(2024, 11, 1), d(2024, 12, 1), d(2025, 1, 1)]);
    assert_eq!(rows[0].description, "Phone (1/3)");
    assert_eq!(rows[2].description, "Phone (3/3)");
    assert!(rows.iter().all(|r| r.amount == dec!(-100)));
}

#[test]
fn test_installments_last_only_creates_one() {
    let l = ledger();
    let base = NewTransaction::new(d(2024, 5, 9), dec!(-80), "Desk", l.card, l.food);
    let ids = create_installments(&l.conn, &base, 2, 2).unwrap();
    assert_eq!(ids.len(), 1);

    let tx = db::get_transaction(&l.conn, ids[0]).unwrap().unwrap();
    assert_eq!(tx.description, "Desk (2/2)");
    assert_eq!(tx.date, d(2024, 5, 1));
}

#[test]
fn test_installments_out_of_sequence_write_nothing() {
    let l = ledger();
    let base = NewTransaction::new(d(2024, 5, 9), dec!(-80), "Desk", l.card, l.food);
    let err = create_installments(&l.conn, &base, 3, 2).unwrap_err();
    assert!(matches!(err, LedgerError::Sequencing { current: 3, total: 2 }));
    assert_eq!(db::count_transactions(&l.conn).unwrap(), 0);
}

#[test]
fn test_installments_with_bad_category_roll_back() {
    let l = ledger();
    let base = NewTransaction::new(d(2024, 5, 9), dec!(-80), "Desk", l.card, 9999);
    let err = create_installments(&l.conn, &base, 1, 4).unwrap_err();
    assert!(matches!(err, LedgerError::Batch { failed_at: 1, total: 4, .. }));
    assert_eq!(db::count_transactions(&l.conn).unwrap(), 0);
}

#[test]
fn test_invoice_payment_moves_money_to_card() {
    let l = ledger();
    l.record(d(2024, 3, 1), dec!(1000), "Pay", l.checking, l.salary);
    l.record(d(2024, 3, 2), dec!(-200), "Dinner", l.card, l.food);

    let payment = InvoicePayment {
        origin_account_id: l.checking,
        destination_account_id: l.card,
        amount: dec!(500),
        date: d(2024, 3, 10),
        description: "March invoice".to_string(),
    };
    let settlement = settle_invoice(&l.conn, &payment, &l.reserved).unwrap();
    assert_ne!(settlement.debit_id, settlement.credit_id);

    assert_eq!(transactions::balance(&l.conn, l.checking).unwrap(), dec!(500));
    assert_eq!(transactions::balance(&l.conn, l.card).unwrap(), dec!(300));

    let credit = credit_outstanding_by_account(&l.conn, None).unwrap();
    assert_eq!(credit.len(), 1);
    assert_eq!(credit[0].owed, dec!(0));
    assert_eq!(credit[0].in_credit, dec!(300));
    assert_eq!(total_credit_outstanding(&l.conn, None).unwrap(), dec!(0));

    let cash = balances_by_account(&l.conn, false, None).unwrap();
    assert!(cash.iter().all(|b| b.account_id != l.card));
}

#[test]
fn test_invoice_rejects_non_positive_amounts() {
    let l = ledger();
    for amount in [dec!(0), dec!(-50)] {
        let payment = InvoicePayment {
            origin_account_id: l.checking,
            destination_account_id: l.card,
            amount,
            date: d(2024, 3, 10),
            description: "Invoice".to_string(),
        };
        let err = settle_invoice(&l.conn, &payment, &l.reserved).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(_)));
    }
    assert_eq!(db::count_transactions(&l.conn).unwrap(), 0);
}

#[test]
fn test_update_missing_id_changes_nothing() {
    let l = ledger();
    l.record(d(2024, 3, 1), dec!(-10), "Coffee", l.checking, l.food);

    let patch = TransactionPatch {
        description: Some("Tea".to_string()),
        ..Default::default()
    };
    assert!(!transactions::update(&l.conn, 4242, &patch).unwrap());
    assert!(!transactions::delete(&l.conn, 4242).unwrap());
    assert_eq!(db::count_transactions(&l.conn).unwrap(), 1);

    let rows = transactions::list(&l.conn, &TransactionFilter::default()).unwrap();
    assert_eq!(rows[0].description, "Coffee");
}

#[test]
fn test_adjustment_then_summary() {
    let l = ledger();
    l.record(d(2024, 6, 1), dec!(3000), "Pay", l.checking, l.salary);
    l.record(d(2024, 6, 3), dec!(-120), "Groceries", l.checking, l.food);

    let adj = adjust_balance(&l.conn, l.checking, dec!(2900), d(2024, 6, 30), &l.reserved)
        .unwrap()
        .unwrap();
    assert_eq!(adj.amount, dec!(20));
    assert!(adjust_balance(&l.conn, l.checking, dec!(2900), d(2024, 6, 30), &l.reserved)
        .unwrap()
        .is_none());

    let summary = period_summary(
        &l.conn,
        &TransactionFilter::between(d(2024, 6, 1), d(2024, 6, 30)).with_owner(OwnerFilter::All),
    )
    .unwrap();
    assert_eq!(summary.transaction_count, 3);
    assert_eq!(summary.by_category.len(), 1);
    assert_eq!(summary.by_category[0].category, "Food");
}

#[test]
fn test_export_listing_to_csv() {
    let l = ledger();
    l.record(d(2024, 6, 1), dec!(3000), "Pay", l.checking, l.salary);
    l.record(d(2024, 6, 3), dec!(-120), "Groceries", l.checking, l.food);

    let rows = transactions::list(&l.conn, &TransactionFilter::default()).unwrap();
    let mut out = Vec::new();
    assert_eq!(export_csv(&rows, &mut out).unwrap(), 2);

    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.lines().nth(1).unwrap().contains("Groceries"));
}
