// ⏳ Calendar arithmetic
//
// Two month-shifting rules live side by side:
// - add_months keeps the day-of-month, clamped to the last valid day
// - installment dates are anchored on month_first before shifting, so they
//   always land on day 1
// Keep both; they are not interchangeable.

use chrono::{Datelike, NaiveDate};

/// First day of the month containing `date`
pub fn month_first(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Number of days in the given month (1-based)
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// Shift `date` by `months`, clamping the day to the target month's length.
///
/// Jan 31 + 1 month → Feb 28 (or 29 in leap years), never Mar 3.
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let total = date.year() * 12 + date.month0() as i32 + months;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));

    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(date)
}

/// Dates for installments `current..=total`, one per month starting at the
/// month of `base` (day normalized to 1).
pub fn installment_dates(base: NaiveDate, current: u32, total: u32) -> Vec<NaiveDate> {
    let anchor = month_first(base);
    (current..=total)
        .map(|k| add_months(anchor, (k - current) as i32))
        .collect()
}
