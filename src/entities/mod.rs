// Entity Models - Accounts, Categories, Transactions
//
// Closed string enums (owner, payer, split mode, account/category type) are
// tagged variants checked at construction. Unknown tags are rejected with
// LedgerError::Validation instead of being coerced.

/// Declares a closed enum persisted and serialized as a lowercase tag.
macro_rules! tagged_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $tag:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $tag)] $variant ),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $tag ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::LedgerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $( $tag => Ok($name::$variant), )+
                    other => Err($crate::error::LedgerError::validation($field, other)),
                }
            }
        }

        impl rusqlite::types::ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
                Ok(rusqlite::types::ToSqlOutput::from(self.as_str()))
            }
        }

        impl rusqlite::types::FromSql for $name {
            fn column_result(
                value: rusqlite::types::ValueRef<'_>,
            ) -> rusqlite::types::FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e| rusqlite::types::FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

pub mod account;
pub mod category;
pub mod transaction;

pub use account::{Account, AccountType, NewAccount, Owner};
pub use category::{Category, CategoryType};
pub use transaction::{
    normalize_card_label, round_amount, EntryKind, NewTransaction, OwnerFilter, Payer,
    SplitMode, Transaction, TransactionFilter, TransactionPatch, TransactionRow,
};
