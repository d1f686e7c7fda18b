use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::path::PathBuf;

use household_ledger::{
    adjustment, balances, db, entities::normalize_card_label, entities::round_amount, export,
    installments, invoice, seed, summary, transactions, Account, AccountType, Category,
    CategoryType, EntryDefaults, EntryKind, InstallmentPlan, InvoicePayment, LedgerConfig,
    NewTransaction, Owner, OwnerFilter, Payer, ReservedCategories, SplitMode, TransactionFilter,
    TransactionPatch, TransactionRow,
};

#[derive(Parser, Debug)]
#[command(name = "household-ledger")]
#[command(version, about = "Household ledger: balances, installments and card invoices", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database and seed default accounts/categories
    Init,
    /// Manage accounts
    #[command(subcommand)]
    Account(AccountCommand),
    /// Manage categories
    #[command(subcommand)]
    Category(CategoryCommand),
    /// Record, edit, delete and list transactions
    #[command(subcommand)]
    Tx(TxCommand),
    /// Pay a credit card invoice from a bank account (two entries)
    PayInvoice {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "Invoice payment")]
        description: String,
    },
    /// Bring an account to a target balance
    Adjust {
        #[arg(long)]
        account: String,
        #[arg(long, allow_hyphen_values = true)]
        target: Decimal,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Cash and credit card balances
    Balances {
        /// Only count transactions dated on or before this day (default: today)
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Income, expense and spending by category over a period
    Summary {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Export transactions as CSV
    Export {
        #[command(flatten)]
        filter: FilterArgs,
        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "primary")]
        owner: Owner,
        #[arg(long = "type", default_value = "checking")]
        account_type: AccountType,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        initial_balance: Decimal,
    },
    List,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long = "type", default_value = "expense")]
        category_type: CategoryType,
    },
    List,
}

#[derive(Subcommand, Debug)]
enum TxCommand {
    /// Record a transaction; omitted options reuse the last entry's values
    Add(AddTxArgs),
    Update(UpdateTxArgs),
    Delete { id: i64 },
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Args, Debug)]
struct AddTxArgs {
    /// Amount as typed (sign comes from --kind)
    #[arg(long, allow_hyphen_values = true)]
    amount: Decimal,
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long)]
    kind: Option<EntryKind>,
    #[arg(long)]
    account: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    owner: Option<Owner>,
    #[arg(long)]
    paid_by: Option<Payer>,
    #[arg(long)]
    split: Option<SplitMode>,
    /// Card label (credit accounts only)
    #[arg(long)]
    card: Option<String>,
    /// Installments as n/N (current/total)
    #[arg(long)]
    installments: Option<InstallmentPlan>,
}

#[derive(Args, Debug)]
struct UpdateTxArgs {
    id: i64,
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Signed amount, stored as given
    #[arg(long, allow_hyphen_values = true)]
    amount: Option<Decimal>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    account: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    owner: Option<Owner>,
    #[arg(long)]
    paid_by: Option<Payer>,
    #[arg(long)]
    split: Option<SplitMode>,
    /// New card label; empty string clears it
    #[arg(long)]
    card: Option<String>,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    #[arg(long)]
    start: Option<NaiveDate>,
    #[arg(long)]
    end: Option<NaiveDate>,
    /// primary | partner | both | all
    #[arg(long, default_value = "all")]
    owner: OwnerFilter,
    #[arg(long)]
    account: Option<String>,
}

fn main() -> Result<()> {
    household_ledger::init_tracing();

    let cli = Cli::parse();
    let cfg = LedgerConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let conn = db::open_database(&cfg.database.path, cfg.database.wal)
        .with_context(|| format!("Failed to open database {:?}", cfg.database.path))?;

    match cli.command {
        Command::Init => run_init(&conn, &cfg),
        Command::Account(cmd) => run_account(&conn, cmd),
        Command::Category(cmd) => run_category(&conn, cmd),
        Command::Tx(cmd) => run_tx(&conn, &cfg, cmd),
        Command::PayInvoice {
            from,
            to,
            amount,
            date,
            description,
        } => {
            let reserved = ReservedCategories::resolve(&conn, &cfg.reserved_names())?;
            let payment = InvoicePayment {
                origin_account_id: find_account(&conn, &from)?.id,
                destination_account_id: find_account(&conn, &to)?.id,
                amount,
                date: date.unwrap_or_else(today),
                description,
            };
            let settlement = invoice::settle_invoice(&conn, &payment, &reserved)?;
            println!(
                "✓ Payment recorded: {} -{:.2} (#{}), {} +{:.2} (#{})",
                from, payment.amount, settlement.debit_id, to, payment.amount, settlement.credit_id
            );
            Ok(())
        }
        Command::Adjust {
            account,
            target,
            date,
        } => {
            let reserved = ReservedCategories::resolve(&conn, &cfg.reserved_names())?;
            let acc = find_account(&conn, &account)?;
            match adjustment::adjust_balance(&conn, acc.id, target, date.unwrap_or_else(today), &reserved)? {
                Some(tx) => println!("✓ Adjustment created: {:.2} (#{})", tx.amount, tx.id),
                None => println!("✓ Balance already matches, nothing to adjust"),
            }
            Ok(())
        }
        Command::Balances { as_of } => run_balances(&conn, as_of.unwrap_or_else(today)),
        Command::Summary { filter } => {
            let filter = build_filter(&conn, filter)?;
            print_summary(&summary::period_summary(&conn, &filter)?);
            Ok(())
        }
        Command::Export { filter, out } => {
            let filter = build_filter(&conn, filter)?;
            let rows = transactions::list(&conn, &filter)?;
            let written = match out {
                Some(path) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("Failed to create {:?}", path))?;
                    export::export_csv(&rows, file)?
                }
                None => export::export_csv(&rows, std::io::stdout().lock())?,
            };
            eprintln!("✓ Exported {} transactions", written);
            Ok(())
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn find_account(conn: &Connection, name: &str) -> Result<Account> {
    db::get_account_by_name(conn, name)?.with_context(|| format!("Account {:?} not found", name))
}

fn find_category(conn: &Connection, name: &str) -> Result<Category> {
    db::get_category_by_name(conn, name)?.with_context(|| format!("Category {:?} not found", name))
}

fn build_filter(conn: &Connection, args: FilterArgs) -> Result<TransactionFilter> {
    let account_id = match args.account {
        Some(name) => Some(find_account(conn, &name)?.id),
        None => None,
    };
    Ok(TransactionFilter {
        start: args.start,
        end: args.end,
        owner: args.owner,
        account_id,
    })
}

// ============================================================================
// Commands
// ============================================================================

fn run_init(conn: &Connection, cfg: &LedgerConfig) -> Result<()> {
    println!("🗄️  Database: {}", cfg.database.path.display());

    let report = seed::seed_defaults(conn, &cfg.reserved_names())?;
    println!("✓ Accounts added: {}", report.accounts_added);
    println!("✓ Categories added: {}", report.categories_added);

    let reserved = ReservedCategories::resolve(conn, &cfg.reserved_names())?;
    for problem in reserved.missing() {
        println!("⚠️  {}", problem);
    }
    Ok(())
}

fn run_account(conn: &Connection, cmd: AccountCommand) -> Result<()> {
    match cmd {
        AccountCommand::Add {
            name,
            owner,
            account_type,
            initial_balance,
        } => {
            let id = seed::create_account(conn, &name, owner, account_type, initial_balance)?;
            println!("✓ Account created (#{})", id);
        }
        AccountCommand::List => {
            for account in seed::accounts(conn)? {
                let balance = transactions::balance(conn, account.id)?;
                println!(
                    "{:>4}  {:<28} {:<9} {:<8} {:>12.2}",
                    account.id, account.name, account.account_type, account.owner, balance
                );
            }
        }
    }
    Ok(())
}

fn run_category(conn: &Connection, cmd: CategoryCommand) -> Result<()> {
    match cmd {
        CategoryCommand::Add {
            name,
            category_type,
        } => {
            let id = seed::create_category(conn, &name, category_type)?;
            println!("✓ Category created (#{})", id);
        }
        CategoryCommand::List => {
            for category in seed::categories(conn)? {
                println!("{:>4}  {:<28} {}", category.id, category.name, category.category_type);
            }
        }
    }
    Ok(())
}

fn run_tx(conn: &Connection, cfg: &LedgerConfig, cmd: TxCommand) -> Result<()> {
    match cmd {
        TxCommand::Add(args) => add_transaction(conn, cfg, args),
        TxCommand::Update(args) => {
            let account_id = match args.account.as_deref() {
                Some(name) => Some(find_account(conn, name)?.id),
                None => None,
            };
            let category_id = match args.category.as_deref() {
                Some(name) => Some(find_category(conn, name)?.id),
                None => None,
            };
            let patch = TransactionPatch {
                date: args.date,
                amount: args.amount.map(round_amount),
                description: args.description,
                account_id,
                category_id,
                owner: args.owner,
                paid_by: args.paid_by,
                split_mode: args.split,
                card_label: args
                    .card
                    .map(|c| Some(c.trim().to_string()).filter(|c| !c.is_empty())),
            };
            if patch.is_empty() {
                bail!("Nothing to update");
            }
            if transactions::update(conn, args.id, &patch)? {
                println!("✓ Transaction #{} updated", args.id);
            } else {
                println!("Transaction #{} not found, nothing changed", args.id);
            }
            Ok(())
        }
        TxCommand::Delete { id } => {
            if transactions::delete(conn, id)? {
                println!("✓ Transaction #{} deleted", id);
            } else {
                println!("Transaction #{} not found, nothing changed", id);
            }
            Ok(())
        }
        TxCommand::List { filter } => {
            let filter = build_filter(conn, filter)?;
            print_rows(&transactions::list(conn, &filter)?);
            Ok(())
        }
    }
}

fn add_transaction(conn: &Connection, cfg: &LedgerConfig, args: AddTxArgs) -> Result<()> {
    let last = EntryDefaults::load(&cfg.defaults.path);

    let kind = args.kind.unwrap_or(last.kind);
    let account_name = args
        .account
        .or(last.account.clone())
        .context("No account given (use --account)")?;
    let category_name = args
        .category
        .or(last.category.clone())
        .context("No category given (use --category)")?;
    let account = find_account(conn, &account_name)?;
    let category = find_category(conn, &category_name)?;

    let card = args.card.or_else(|| Some(last.card_label.clone()));
    let card_label = normalize_card_label(account.account_type, card.as_deref());

    let base = NewTransaction::new(
        args.date.unwrap_or_else(today),
        kind.signed(round_amount(args.amount)),
        args.description.trim(),
        account.id,
        category.id,
    )
    .with_owner(args.owner.unwrap_or(last.owner))
    .with_paid_by(args.paid_by.unwrap_or(last.paid_by))
    .with_split_mode(args.split.unwrap_or(last.split_mode))
    .with_card_label(card_label.clone());

    match args.installments {
        Some(plan) => {
            let ids = installments::create_installments(conn, &base, plan.current(), plan.total())?;
            println!(
                "✓ Installments created: {} transactions ({}/{} to {}/{})",
                ids.len(),
                plan.current(),
                plan.total(),
                plan.total(),
                plan.total()
            );
        }
        None => {
            let id = transactions::create(conn, &base)?;
            println!("✓ Transaction saved (#{})", id);
        }
    }

    let next = EntryDefaults {
        kind,
        owner: base.owner,
        paid_by: base.paid_by,
        split_mode: base.split_mode,
        account: Some(account.name),
        category: Some(category.name),
        card_label: card_label.unwrap_or_default(),
    };
    if let Err(e) = next.save(&cfg.defaults.path) {
        tracing::warn!(error = %e, "could not save entry defaults");
    }
    Ok(())
}

fn run_balances(conn: &Connection, as_of: NaiveDate) -> Result<()> {
    println!("💰 Cash (as of {})", as_of);
    for b in balances::balances_by_account(conn, false, Some(as_of))? {
        println!("   {:<28} {:>12.2}", b.account, b.balance);
    }
    println!("   {:<28} {:>12.2}", "Total", balances::cash_total_balance(conn, Some(as_of))?);

    let credit = balances::credit_outstanding_by_account(conn, Some(as_of))?;
    println!("\n💳 Credit cards");
    if credit.is_empty() {
        println!("   No credit accounts");
    }
    for c in &credit {
        println!("   {:<28} owed {:>10.2}  in credit {:>10.2}", c.account, c.owed, c.in_credit);
    }
    println!(
        "   {:<28} owed {:>10.2}",
        "Total",
        balances::total_credit_outstanding(conn, Some(as_of))?
    );
    Ok(())
}

fn print_rows(rows: &[TransactionRow]) {
    if rows.is_empty() {
        println!("No transactions in the period");
        return;
    }
    for r in rows {
        println!(
            "{:>5}  {}  {:>11.2}  {:<32} {:<20} {:<18} {}",
            r.id,
            r.date,
            r.amount,
            r.description,
            r.account,
            r.category,
            r.card_label.as_deref().unwrap_or("")
        );
    }
}

fn print_summary(s: &summary::PeriodSummary) {
    if s.transaction_count == 0 {
        println!("No transactions in the period");
        return;
    }
    println!("📊 Income   {:>12.2}", s.income);
    println!("   Expense  {:>12.2}", s.expense);
    println!("   Net      {:>12.2}", s.net);

    if s.by_category.is_empty() {
        println!("\nNo spending (excluding transfers) in the period");
        return;
    }
    println!("\nSpending by category");
    for c in &s.by_category {
        println!("   {:<28} {:>12.2}", c.category, c.amount);
    }
}
