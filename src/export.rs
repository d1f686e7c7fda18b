// CSV export of transaction listings

use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

use crate::entities::TransactionRow;
use crate::error::LedgerResult;

/// Column order; matches the field order of `CsvRecord`
pub const HEADER: [&str; 12] = [
    "id",
    "date",
    "amount",
    "description",
    "account",
    "account_type",
    "category",
    "category_type",
    "owner",
    "paid_by",
    "split_mode",
    "card_label",
];

#[derive(Debug, Serialize)]
struct CsvRecord<'a> {
    id: i64,
    date: String,
    amount: Decimal,
    description: &'a str,
    account: &'a str,
    account_type: &'static str,
    category: &'a str,
    category_type: &'static str,
    owner: &'static str,
    paid_by: &'static str,
    split_mode: &'static str,
    card_label: &'a str,
}

impl<'a> From<&'a TransactionRow> for CsvRecord<'a> {
    fn from(row: &'a TransactionRow) -> Self {
        CsvRecord {
            id: row.id,
            date: row.date.format("%Y-%m-%d").to_string(),
            amount: row.amount,
            description: &row.description,
            account: &row.account,
            account_type: row.account_type.as_str(),
            category: &row.category,
            category_type: row.category_type.as_str(),
            owner: row.owner.as_str(),
            paid_by: row.paid_by.as_str(),
            split_mode: row.split_mode.as_str(),
            card_label: row.card_label.as_deref().unwrap_or(""),
        }
    }
}

/// Write `rows` as CSV (with header) and return how many were written
pub fn export_csv<W: Write>(rows: &[TransactionRow], writer: W) -> LedgerResult<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    // serialize() only emits the header along with the first record
    if rows.is_empty() {
        wtr.write_record(HEADER)?;
    }
    for row in rows {
        wtr.serialize(CsvRecord::from(row))?;
    }
    wtr.flush()?;

    tracing::info!(rows = rows.len(), "transactions exported");
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{AccountType, CategoryType, Owner, Payer, SplitMode};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_export_writes_header_and_rows() {
        let rows = vec![TransactionRow {
            id: 7,
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            amount: dec!(-300.00),
            description: "Laptop (2/3)".to_string(),
            account_id: 3,
            account: "Card".to_string(),
            account_type: AccountType::Credit,
            category_id: 1,
            category: "Personal".to_string(),
            category_type: CategoryType::Expense,
            owner: Owner::Both,
            paid_by: Payer::Partner,
            split_mode: SplitMode::Equal,
            card_label: Some("4321".to_string()),
        }];

        let mut out = Vec::new();
        assert_eq!(export_csv(&rows, &mut out).unwrap(), 1);

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,date,amount,description,account,account_type,category,category_type,owner,paid_by,split_mode,card_label"
        );
        assert_eq!(
            lines.next().unwrap(),
            "7,2024-02-01,-300.00,Laptop (2/3),Card,credit,Personal,expense,both,partner,equal,4321"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_empty_export_still_has_header() {
        let mut out = Vec::new();
        assert_eq!(export_csv(&[], &mut out).unwrap(), 0);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.trim_end(), HEADER.join(","));
        assert_eq!(text.lines().count(), 1);
    }
}
