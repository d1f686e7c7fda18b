// 🏷️ Category Entity
//
// Category type is fixed once created. Transfer categories are excluded from
// spending breakdowns (invoice payments and balance adjustments are transfers).

use serde::{Deserialize, Serialize};

tagged_enum! {
    CategoryType, "category type" {
        Income => "income",
        Expense => "expense",
        /// Money moving between own accounts (neutral)
        Transfer => "transfer",
        Investment => "investment",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub category_type: CategoryType,
}
