// 📅 Installment Expander
//
// A purchase paid in N monthly installments, entered at installment n, becomes
// N-n+1 transactions: installment k lands on day 1 of (base month + k-n).
// Members share amount/account/category/owner/payer/split/card label and are
// told apart only by the " (k/N)" description suffix. No group id is stored.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::entities::NewTransaction;
use crate::error::{LedgerError, LedgerResult};
use crate::temporal::installment_dates;
use crate::transactions;

/// Longest plan accepted: 50 years of monthly payments
pub const MAX_INSTALLMENTS: u32 = 600;

/// Current installment `current` of `total` (both 1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentPlan {
    current: u32,
    total: u32,
}

impl InstallmentPlan {
    /// Fails with `Sequencing` unless 1 <= current <= total, and with
    /// `Validation` when total exceeds [`MAX_INSTALLMENTS`]
    pub fn new(current: u32, total: u32) -> LedgerResult<Self> {
        if current == 0 || total == 0 || current > total {
            return Err(LedgerError::Sequencing { current, total });
        }
        if total > MAX_INSTALLMENTS {
            return Err(LedgerError::validation("installment count", total.to_string()));
        }
        Ok(InstallmentPlan { current, total })
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn total(&self) -> u32 {
        self.total
    }
}

impl fmt::Display for InstallmentPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.current, self.total)
    }
}

impl FromStr for InstallmentPlan {
    type Err = LedgerError;

    /// Parses "n/N"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LedgerError::validation("installments", s);
        let (n, total) = s.trim().split_once('/').ok_or_else(invalid)?;
        let n = n.trim().parse().map_err(|_| invalid())?;
        let total = total.trim().parse().map_err(|_| invalid())?;
        InstallmentPlan::new(n, total)
    }
}

/// Expand `base` into one transaction per remaining installment
pub fn expand(base: &NewTransaction, plan: InstallmentPlan) -> Vec<NewTransaction> {
    let description = base.description.trim();

    installment_dates(base.date, plan.current, plan.total)
        .into_iter()
        .zip(plan.current..=plan.total)
        .map(|(date, k)| NewTransaction {
            date,
            description: format!("{description} ({k}/{})", plan.total)
                .trim()
                .to_string(),
            ..base.clone()
        })
        .collect()
}

/// Validate, expand and write an installment batch atomically.
///
/// `current > total` is rejected before any write.
pub fn create_installments(
    conn: &Connection,
    base: &NewTransaction,
    current: u32,
    total: u32,
) -> LedgerResult<Vec<i64>> {
    let plan = InstallmentPlan::new(current, total)?;
    let batch = expand(base, plan);
    let ids = transactions::create_batch(conn, &batch)?;

    tracing::info!(
        plan = %plan,
        created = ids.len(),
        description = %base.description,
        "installment batch created"
    );
    Ok(ids)
}
