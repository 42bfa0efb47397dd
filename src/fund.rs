use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::state::{Loan, Member, Payment};
use crate::types::{LoanStatus, PaymentType};

/// fund-wide lending ceiling: pooled deposits minus outstanding balances,
/// clamped at zero; caps every new disbursal
pub fn lending_ceiling(members: &[Member]) -> Money {
    let total_deposits = members
        .iter()
        .fold(Money::ZERO, |acc, m| acc + m.deposit);
    let total_outstanding = members
        .iter()
        .fold(Money::ZERO, |acc, m| acc + m.loan_balance);
    total_deposits.saturating_sub(total_outstanding)
}

/// the fund page's approximate cashflow summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundSummary {
    /// contribution-typed payments in
    pub total_contributions: Money,
    /// repayment-typed payments in
    pub total_repayments: Money,
    /// principal of loans currently marked active
    pub active_loan_principal: Money,
    /// contributions + repayments − active principal
    pub balance: Money,
}

impl FundSummary {
    pub fn compute(payments: &[Payment], loans: &[Loan]) -> Self {
        let total_contributions = payments
            .iter()
            .filter(|p| p.payment_type == PaymentType::Contribution)
            .fold(Money::ZERO, |acc, p| acc + p.amount);
        let total_repayments = payments
            .iter()
            .filter(|p| p.payment_type == PaymentType::Repayment)
            .fold(Money::ZERO, |acc, p| acc + p.amount);
        let active_loan_principal = loans
            .iter()
            .filter(|l| l.status == Some(LoanStatus::Active))
            .fold(Money::ZERO, |acc, l| acc + l.amount);
        let balance =
            total_contributions + total_repayments - active_loan_principal;
        Self {
            total_contributions,
            total_repayments,
            active_loan_principal,
            balance,
        }
    }
}
