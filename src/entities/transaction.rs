// 💸 Transaction Entity
//
// amount is signed: positive = inflow, negative = outflow.
// Transactions are independent once written. Installment members share no
// group id; they are related only by description suffix " (k/N)" and matching
// amount/category/account.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

use super::{AccountType, CategoryType, Owner};
use crate::error::LedgerError;

tagged_enum! {
    /// Who actually paid
    Payer, "paid_by" {
        Primary => "primary",
        Partner => "partner",
    }
}

tagged_enum! {
    /// How a shared expense is allocated between the two users
    SplitMode, "split_mode" {
        None => "none",
        Equal => "equal",
        /// The other person covers 100%
        OtherPays => "other_100",
    }
}

tagged_enum! {
    /// Transaction type picked at entry time; decides the amount's sign
    EntryKind, "transaction type" {
        Expense => "expense",
        Income => "income",
        Transfer => "transfer",
    }
}

impl EntryKind {
    /// Expense ⇒ negative, income ⇒ positive, transfer legs keep the caller's sign
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            EntryKind::Expense => -amount.abs(),
            EntryKind::Income => amount.abs(),
            EntryKind::Transfer => amount,
        }
    }
}

/// Round to cents, midpoint away from zero. Callers round before submitting;
/// the transaction service stores amounts as given.
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// card_label only means something on credit accounts; blank labels are dropped
pub fn normalize_card_label(account_type: AccountType, label: Option<&str>) -> Option<String> {
    if !account_type.is_credit() {
        return None;
    }
    label
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
}

// ============================================================================
// PERSISTED RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub description: String,
    pub account_id: i64,
    pub category_id: i64,
    pub owner: Owner,
    pub paid_by: Payer,
    pub split_mode: SplitMode,
    pub card_label: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// WRITE INPUTS
// ============================================================================

/// Input for `create`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub amount: Decimal,
    #[serde(default)]
    pub description: String,
    pub account_id: i64,
    pub category_id: i64,
    #[serde(default = "default_owner")]
    pub owner: Owner,
    #[serde(default = "default_payer")]
    pub paid_by: Payer,
    #[serde(default = "default_split")]
    pub split_mode: SplitMode,
    #[serde(default)]
    pub card_label: Option<String>,
}

fn default_owner() -> Owner {
    Owner::Primary
}

fn default_payer() -> Payer {
    Payer::Primary
}

fn default_split() -> SplitMode {
    SplitMode::None
}

impl NewTransaction {
    pub fn new(
        date: NaiveDate,
        amount: Decimal,
        description: &str,
        account_id: i64,
        category_id: i64,
    ) -> Self {
        NewTransaction {
            date,
            amount,
            description: description.to_string(),
            account_id,
            category_id,
            owner: default_owner(),
            paid_by: default_payer(),
            split_mode: default_split(),
            card_label: None,
        }
    }

    pub fn with_owner(mut self, owner: Owner) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_paid_by(mut self, paid_by: Payer) -> Self {
        self.paid_by = paid_by;
        self
    }

    pub fn with_split_mode(mut self, split_mode: SplitMode) -> Self {
        self.split_mode = split_mode;
        self
    }

    pub fn with_card_label(mut self, card_label: Option<String>) -> Self {
        self.card_label = card_label;
        self
    }
}

/// Partial update for `update`. `None` leaves a field untouched;
/// `card_label: Some(None)` clears the label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPatch {
    pub date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub owner: Option<Owner>,
    pub paid_by: Option<Payer>,
    pub split_mode: Option<SplitMode>,
    /// Absent = keep, `null` = clear
    #[serde(default, deserialize_with = "present_or_null")]
    pub card_label: Option<Option<String>>,
}

/// Tells an explicit `null` apart from a missing field
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl TransactionPatch {
    pub fn is_empty(&self) -> bool {
        *self == TransactionPatch::default()
    }

    /// Apply the supplied fields onto `tx`
    pub fn apply(&self, tx: &mut Transaction) {
        if let Some(date) = self.date {
            tx.date = date;
        }
        if let Some(amount) = self.amount {
            tx.amount = amount;
        }
        if let Some(description) = &self.description {
            tx.description = description.clone();
        }
        if let Some(account_id) = self.account_id {
            tx.account_id = account_id;
        }
        if let Some(category_id) = self.category_id {
            tx.category_id = category_id;
        }
        if let Some(owner) = self.owner {
            tx.owner = owner;
        }
        if let Some(paid_by) = self.paid_by {
            tx.paid_by = paid_by;
        }
        if let Some(split_mode) = self.split_mode {
            tx.split_mode = split_mode;
        }
        if let Some(card_label) = &self.card_label {
            tx.card_label = card_label.clone();
        }
    }
}

// ============================================================================
// READ MODELS
// ============================================================================

/// Listing record: transaction joined with its account and category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub description: String,
    pub account_id: i64,
    pub account: String,
    pub account_type: AccountType,
    pub category_id: i64,
    pub category: String,
    pub category_type: CategoryType,
    pub owner: Owner,
    pub paid_by: Payer,
    pub split_mode: SplitMode,
    pub card_label: Option<String>,
}

/// Owner filter for listings; `All` is the "all" sentinel that disables it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerFilter {
    #[default]
    All,
    Only(Owner),
}

impl FromStr for OwnerFilter {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" => Ok(OwnerFilter::All),
            other => other.parse().map(OwnerFilter::Only),
        }
    }
}

/// Listing filter; absent bounds are open, present bounds are inclusive
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub owner: OwnerFilter,
    pub account_id: Option<i64>,
}

impl TransactionFilter {
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        TransactionFilter {
            start: Some(start),
            end: Some(end),
            ..Default::default()
        }
    }

    pub fn up_to(end: NaiveDate) -> Self {
        TransactionFilter {
            end: Some(end),
            ..Default::default()
        }
    }

    pub fn with_owner(mut self, owner: OwnerFilter) -> Self {
        self.owner = owner;
        self
    }

    pub fn for_account(mut self, account_id: i64) -> Self {
        self.account_id = Some(account_id);
        self
    }
}
