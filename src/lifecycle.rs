use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::FundDate;
use crate::decimal::Money;
use crate::errors::{FundError, Result};
use crate::installment::{self, InstallmentStatus};
use crate::state::{Loan, Member, Payment};
use crate::types::{LoanStatus, MemberId, PaymentType};

/// whether the member currently holds an active loan
///
/// a loan with a missing status counts as active; legacy rows predate the
/// status field and must not open the door to a second disbursal.
pub fn has_active_loan(member_id: MemberId, loans: &[Loan]) -> bool {
    loans
        .iter()
        .any(|l| l.member_id == member_id && l.is_active())
}

/// disbursal gate: one active loan per member and room under the ceiling
pub fn can_disburse(
    member_id: MemberId,
    loans: &[Loan],
    amount: Money,
    lending_ceiling: Money,
) -> bool {
    !has_active_loan(member_id, loans) && amount.is_positive() && amount <= lending_ceiling
}

/// a requested disbursal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub member_id: MemberId,
    pub amount: Money,
    pub date: FundDate,
    pub due_months: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// result of a disbursal: the new loan and the updated member snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Disbursal {
    pub loan: Loan,
    pub member: Member,
}

/// create an active loan and move the member's balances
///
/// the member's loan_balance grows by the principal and becomes the
/// authoritative remaining figure from here on; loan_amount is the
/// informational lifetime counter.
pub fn disburse(
    member: Member,
    application: LoanApplication,
    existing_loans: &[Loan],
    lending_ceiling: Money,
    now: DateTime<Utc>,
) -> Result<Disbursal> {
    if !application.amount.is_positive() {
        return Err(FundError::InvalidPaymentAmount {
            amount: application.amount,
        });
    }
    if application.amount > lending_ceiling {
        return Err(FundError::LendingCeilingExceeded {
            ceiling: lending_ceiling,
            requested: application.amount,
        });
    }
    if has_active_loan(member.id, existing_loans) {
        return Err(FundError::MemberHasActiveLoan);
    }

    let loan = Loan {
        id: Uuid::new_v4(),
        member_id: member.id,
        amount: application.amount,
        date: application.date,
        due_months: application.due_months.max(1),
        status: Some(LoanStatus::Active),
        note: application
            .note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        created_at: now,
    };

    let mut member = member;
    member.loan_amount += application.amount;
    member.loan_balance += application.amount;

    Ok(Disbursal { loan, member })
}

/// one-way active → settled transition
///
/// settlement is an administrative assertion; it does not check that the
/// balance reached zero, since the process allows manual write-off.
pub fn settle(loan: Loan) -> Result<Loan> {
    if loan.status == Some(LoanStatus::Settled) {
        return Err(FundError::LoanAlreadySettled);
    }
    let mut loan = loan;
    loan.status = Some(LoanStatus::Settled);
    Ok(loan)
}

/// derived view of a loan's repayment progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanProgress {
    pub installment: Money,
    pub total_repaid: Money,
    /// the member's tracked balance, the authoritative remaining figure
    pub remaining: Money,
    pub first_due: FundDate,
    pub last_due: FundDate,
    pub schedule: Vec<InstallmentStatus>,
}

impl LoanProgress {
    /// derive from the loan, the member snapshot and the member's payments
    pub fn derive(loan: &Loan, member: &Member, payments: &[Payment]) -> Self {
        let installment = loan.monthly_installment();
        let total_repaid = payments
            .iter()
            .filter(|p| p.member_id == loan.member_id && p.payment_type == PaymentType::Repayment)
            .fold(Money::ZERO, |acc, p| acc + p.amount);
        Self {
            installment,
            total_repaid,
            remaining: member.loan_balance,
            first_due: loan.date.add_months(1),
            last_due: loan.date.add_months(loan.due_months),
            schedule: installment::schedule_with_status(
                loan.date,
                loan.due_months,
                total_repaid,
                installment,
            ),
        }
    }
}
