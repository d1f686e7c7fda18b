// ⚠️ Ledger errors
//
// Every failure the ledger can report to a caller. Soft-fails (update/delete of
// a missing transaction) are NOT errors and never show up here.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// A closed enum received a value outside its tag set
    #[error("invalid {field}: {value:?}")]
    Validation { field: &'static str, value: String },

    /// account_id / category_id does not point at an existing row
    #[error("{kind} {id} does not exist")]
    Reference { kind: &'static str, id: i64 },

    /// Installment index past the total (n > N) or a zero count
    #[error("installment {current}/{total} is out of sequence")]
    Sequencing { current: u32, total: u32 },

    /// A reserved category (invoice payment, balance adjustment) is missing
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("amount must be greater than zero, got {0}")]
    InvalidAmount(Decimal),

    /// A multi-row write failed part way; the whole batch was rolled back
    #[error("batch aborted at write {failed_at} of {total}, nothing was written: {source}")]
    Batch {
        failed_at: usize,
        total: usize,
        #[source]
        source: Box<LedgerError>,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] ::config::ConfigError),
}

impl LedgerError {
    pub fn validation(field: &'static str, value: impl Into<String>) -> Self {
        LedgerError::Validation {
            field,
            value: value.into(),
        }
    }

    /// True for errors the user can fix by correcting their input
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            LedgerError::Validation { .. }
                | LedgerError::Reference { .. }
                | LedgerError::Sequencing { .. }
                | LedgerError::InvalidAmount(_)
        )
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
