// 🧾 Invoice Settlement - paying a credit card invoice from a bank account
//
// One payment = two transactions under the reserved "invoice payment"
// category: -amount on the origin (cash) account, +amount on the destination
// (credit) account. The pair carries no link id; it shares date, description
// and category. Both legs are written in one atomic batch.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db;
use crate::entities::{round_amount, NewTransaction, Owner, Payer, SplitMode};
use crate::error::{LedgerError, LedgerResult};
use crate::seed::ReservedCategories;
use crate::transactions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoicePayment {
    pub origin_account_id: i64,
    pub destination_account_id: i64,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: String,
}

/// Ids of the two legs written for one payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSettlement {
    pub debit_id: i64,
    pub credit_id: i64,
}

/// Check origin is a cash account and destination a credit account
fn check_accounts(conn: &Connection, payment: &InvoicePayment) -> LedgerResult<()> {
    let origin = db::get_account(conn, payment.origin_account_id)?.ok_or(
        LedgerError::Reference {
            kind: "account",
            id: payment.origin_account_id,
        },
    )?;
    if origin.is_credit() {
        return Err(LedgerError::validation("origin account", origin.name));
    }

    let destination = db::get_account(conn, payment.destination_account_id)?.ok_or(
        LedgerError::Reference {
            kind: "account",
            id: payment.destination_account_id,
        },
    )?;
    if !destination.is_credit() {
        return Err(LedgerError::validation("destination account", destination.name));
    }

    Ok(())
}

/// Debit the origin and credit the destination by `payment.amount`.
///
/// Rejects amounts that round to zero or below and a missing reserved category before
/// anything is written.
pub fn settle_invoice(
    conn: &Connection,
    payment: &InvoicePayment,
    reserved: &ReservedCategories,
) -> LedgerResult<InvoiceSettlement> {
    let amount = round_amount(payment.amount);
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(payment.amount));
    }
    let category_id = reserved.invoice()?;
    check_accounts(conn, payment)?;

    let leg = |account_id: i64, signed: Decimal| {
        NewTransaction::new(payment.date, signed, &payment.description, account_id, category_id)
            .with_owner(Owner::Primary)
            .with_paid_by(Payer::Primary)
            .with_split_mode(SplitMode::None)
    };

    let ids = transactions::create_batch(
        conn,
        &[
            leg(payment.origin_account_id, -amount),
            leg(payment.destination_account_id, amount),
        ],
    )?;

    let settlement = InvoiceSettlement {
        debit_id: ids[0],
        credit_id: ids[1],
    };
    tracing::info!(
        amount = %amount,
        origin = payment.origin_account_id,
        destination = payment.destination_account_id,
        "invoice payment settled"
    );
    Ok(settlement)
}
