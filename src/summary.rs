// Period summary: inflows, outflows and spending by category over a listing

use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entities::{CategoryType, TransactionFilter, TransactionRow};
use crate::error::LedgerResult;
use crate::transactions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpend {
    pub category: String,
    /// Magnitude of outflows (positive)
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub income: Decimal,
    /// Magnitude of outflows (positive)
    pub expense: Decimal,
    pub net: Decimal,
    pub transaction_count: usize,
    pub by_category: Vec<CategorySpend>,
}

impl PeriodSummary {
    pub fn from_rows(rows: &[TransactionRow]) -> Self {
        let income: Decimal = rows
            .iter()
            .filter(|r| r.amount > Decimal::ZERO)
            .map(|r| r.amount)
            .sum();
        let outflow: Decimal = rows
            .iter()
            .filter(|r| r.amount < Decimal::ZERO)
            .map(|r| r.amount)
            .sum();

        // transfers (invoice payments, adjustments) are not spending
        let mut spend: BTreeMap<&str, Decimal> = BTreeMap::new();
        for row in rows
            .iter()
            .filter(|r| r.amount < Decimal::ZERO && r.category_type != CategoryType::Transfer)
        {
            *spend.entry(row.category.as_str()).or_default() += row.amount.abs();
        }

        let mut by_category: Vec<CategorySpend> = spend
            .into_iter()
            .map(|(category, amount)| CategorySpend {
                category: category.to_string(),
                amount,
            })
            .collect();
        // biggest spend first; BTreeMap order breaks ties by name
        by_category.sort_by(|a, b| b.amount.cmp(&a.amount));

        PeriodSummary {
            income,
            expense: outflow.abs(),
            net: income + outflow,
            transaction_count: rows.len(),
            by_category,
        }
    }
}

pub fn period_summary(conn: &Connection, filter: &TransactionFilter) -> LedgerResult<PeriodSummary> {
    let rows = transactions::list(conn, filter)?;
    Ok(PeriodSummary::from_rows(&rows))
}
