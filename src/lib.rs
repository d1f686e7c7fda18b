// Household Ledger - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod error;
pub mod config;
pub mod temporal;       // Month arithmetic (clamped add, installment anchoring)
pub mod entities;       // Accounts, categories, transactions + closed enums
pub mod db;             // Ledger Store (SQLite)
pub mod transactions;   // Transaction Service
pub mod installments;   // Installment Expander
pub mod invoice;        // Invoice Settlement
pub mod adjustment;     // Balance Adjustment
pub mod balances;       // Balance Aggregator
pub mod summary;        // Period Summary
pub mod seed;           // Defaults + reserved categories
pub mod defaults;       // Last-used entry values
pub mod export;         // CSV export

use std::sync::Once;

// Re-export commonly used types
pub use error::{LedgerError, LedgerResult};
pub use crate::config::LedgerConfig;
pub use entities::{
    Account, AccountType, Category, CategoryType, EntryKind, NewAccount, NewTransaction,
    OwnerFilter, Owner, Payer, SplitMode, Transaction, TransactionFilter, TransactionPatch,
    TransactionRow,
};
pub use db::{open_database, open_in_memory, setup_database};
pub use installments::{create_installments, InstallmentPlan};
pub use invoice::{settle_invoice, InvoicePayment, InvoiceSettlement};
pub use adjustment::adjust_balance;
pub use balances::{
    balances_by_account, cash_total_balance, credit_outstanding_by_account,
    total_credit_outstanding, AccountBalance, CreditOutstanding,
};
pub use summary::{period_summary, CategorySpend, PeriodSummary};
pub use seed::{seed_defaults, ReservedCategories, ReservedNames};
pub use defaults::EntryDefaults;
pub use export::export_csv;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber (`RUST_LOG` overrides the
/// default `household_ledger=info`).
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("household_ledger=info,ledger_server=info"));

        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_tracing_twice_does_not_panic() {
        super::init_tracing();
        super::init_tracing();
    }
}
