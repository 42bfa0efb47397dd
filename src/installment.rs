use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::FundDate;
use crate::decimal::Money;

/// fixed monthly installment: floor(principal / term)
///
/// a term below one month is treated as one. the division remainder is not
/// tracked separately; it is absorbed into the last cycle implicitly.
pub fn monthly_installment(principal: Money, term_months: u32) -> Money {
    principal.div_floor(term_months)
}

/// one cell of the due schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueInstallment {
    /// 1-based month number within the term
    pub month_index: u32,
    pub due_date: FundDate,
}

/// due dates for every month of the term
///
/// month k falls k calendar months after the disbursement date, with the
/// day-of-month capped at 30 (see [`FundDate::add_months`]).
pub fn due_schedule(disbursement: FundDate, term_months: u32) -> Vec<DueInstallment> {
    (1..=term_months.max(1))
        .map(|month_index| DueInstallment {
            month_index,
            due_date: disbursement.add_months(month_index),
        })
        .collect()
}

/// watermark paid-status for month k
///
/// paid iff the cumulative repaid so far reaches k installments. no
/// per-installment flags exist; which specific payment covered which
/// month is not tracked.
pub fn is_month_paid(month_index: u32, cumulative_repaid: Money, installment: Money) -> bool {
    let threshold = Money::from_decimal(installment.as_decimal() * Decimal::from(month_index));
    cumulative_repaid >= threshold
}

/// a due-schedule cell annotated with its watermark status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentStatus {
    pub month_index: u32,
    pub due_date: FundDate,
    pub paid: bool,
}

/// the full schedule with per-month paid status derived from the total repaid
pub fn schedule_with_status(
    disbursement: FundDate,
    term_months: u32,
    cumulative_repaid: Money,
    installment: Money,
) -> Vec<InstallmentStatus> {
    due_schedule(disbursement, term_months)
        .into_iter()
        .map(|cell| InstallmentStatus {
            month_index: cell.month_index,
            due_date: cell.due_date,
            paid: is_month_paid(cell.month_index, cumulative_repaid, installment),
        })
        .collect()
}
