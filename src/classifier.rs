use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{FundError, Result};
use crate::state::Loan;
use crate::types::PaymentIntent;

/// outcome of classifying an incoming payment against the member's loan state
///
/// classification is a pure function of (active loan, loan balance, amount,
/// intent); it never touches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    /// pure deposit contribution; only possible with no active loan
    Contribution { amount: Money },
    /// pure repayment at or under the installment
    ///
    /// `shortfall` carries the non-blocking warning when the amount is
    /// below the installment: the gap to the expected monthly cell.
    Repayment {
        amount: Money,
        shortfall: Option<Money>,
    },
    /// repayment intent over the installment: the repayment leg is capped
    /// at the current loan balance and the rest goes to the deposit
    RepaymentWithSurplus { repayment: Money, surplus: Money },
    /// combined intent: exactly one installment is repaid regardless of
    /// the remaining balance, everything above it goes to the deposit
    InstallmentWithDeposit { installment: Money, deposit: Money },
}

impl Classification {
    /// split paths must be shown to the operator before posting
    pub fn requires_confirmation(&self) -> bool {
        matches!(
            self,
            Classification::RepaymentWithSurplus { .. }
                | Classification::InstallmentWithDeposit { .. }
        )
    }

    /// portion that decreases the loan balance
    pub fn repayment_portion(&self) -> Money {
        match *self {
            Classification::Contribution { .. } => Money::ZERO,
            Classification::Repayment { amount, .. } => amount,
            Classification::RepaymentWithSurplus { repayment, .. } => repayment,
            Classification::InstallmentWithDeposit { installment, .. } => installment,
        }
    }

    /// portion that increases the deposit
    pub fn contribution_portion(&self) -> Money {
        match *self {
            Classification::Contribution { amount } => amount,
            Classification::Repayment { .. } => Money::ZERO,
            Classification::RepaymentWithSurplus { surplus, .. } => surplus,
            Classification::InstallmentWithDeposit { deposit, .. } => deposit,
        }
    }

    pub fn total(&self) -> Money {
        self.repayment_portion() + self.contribution_portion()
    }

    /// under-installment warning, when any
    pub fn shortfall(&self) -> Option<Money> {
        match *self {
            Classification::Repayment { shortfall, .. } => shortfall,
            _ => None,
        }
    }
}

/// classify a payment request
///
/// `active_loan` is the member's single active loan, if any; `loan_balance`
/// is the member's current remaining balance. rejections are validation
/// errors raised strictly before any write.
pub fn classify(
    active_loan: Option<&Loan>,
    loan_balance: Money,
    amount: Money,
    intent: PaymentIntent,
) -> Result<Classification> {
    if !amount.is_positive() {
        return Err(FundError::InvalidPaymentAmount { amount });
    }

    let installment = active_loan
        .map(Loan::monthly_installment)
        .unwrap_or(Money::ZERO);

    match intent {
        PaymentIntent::Contribution => {
            if active_loan.is_some() {
                // over-installment amounts get pointed at the combined type,
                // anything else just asks for a type change
                if amount > installment && installment.is_positive() {
                    return Err(FundError::SwitchToCombined);
                }
                return Err(FundError::UnsettledLoan);
            }
            Ok(Classification::Contribution { amount })
        }
        PaymentIntent::Repayment => {
            if active_loan.is_none() {
                return Err(FundError::NoActiveLoan);
            }
            if amount > installment && installment.is_positive() {
                // cap the repayment leg at the tracked balance so a large
                // overpayment routes the full excess to the deposit
                let repayment = amount.min(loan_balance);
                return Ok(Classification::RepaymentWithSurplus {
                    repayment,
                    surplus: amount - repayment,
                });
            }
            let shortfall = if amount < installment && installment.is_positive() {
                Some(installment - amount)
            } else {
                None
            };
            Ok(Classification::Repayment { amount, shortfall })
        }
        PaymentIntent::ContributionRepayment => {
            if active_loan.is_none() {
                return Err(FundError::NoActiveLoan);
            }
            if amount < installment {
                return Err(FundError::AmountBelowInstallment { installment, amount });
            }
            // always one fixed installment to the loan, the rest to deposit
            Ok(Classification::InstallmentWithDeposit {
                installment,
                deposit: amount - installment,
            })
        }
    }
}
