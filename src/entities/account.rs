// 💳 Account Entity
//
// An account's id is assigned by the store and never changes. Its balance is
// never stored: it is always initial_balance + the signed amounts of its
// transactions. The account type decides whether a negative balance means
// "overdrawn" (cash) or "amount owed" (credit).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

tagged_enum! {
    /// Whose money an account or transaction belongs to
    Owner, "owner" {
        Primary => "primary",
        Partner => "partner",
        /// Shared between both users
        Both => "both",
    }
}

tagged_enum! {
    AccountType, "account type" {
        Checking => "checking",
        Savings => "savings",
        /// Credit card: negative balance = amount owed on the invoice
        Credit => "credit",
    }
}

impl AccountType {
    pub fn is_credit(&self) -> bool {
        matches!(self, AccountType::Credit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub owner: Owner,
    pub account_type: AccountType,
    pub initial_balance: Decimal,
}

impl Account {
    pub fn is_credit(&self) -> bool {
        self.account_type.is_credit()
    }
}

/// Input for creating an account (id is assigned on insert)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAccount {
    pub name: String,
    pub owner: Owner,
    pub account_type: AccountType,
    #[serde(default)]
    pub initial_balance: Decimal,
}

impl NewAccount {
    pub fn new(name: &str, owner: Owner, account_type: AccountType) -> Self {
        NewAccount {
            name: name.trim().to_string(),
            owner,
            account_type,
            initial_balance: Decimal::ZERO,
        }
    }

    pub fn with_initial_balance(mut self, initial_balance: Decimal) -> Self {
        self.initial_balance = initial_balance;
        self
    }
}
