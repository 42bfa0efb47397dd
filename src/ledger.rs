use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::calendar::FundDate;
use crate::classifier::Classification;
use crate::config::NoteTemplates;
use crate::decimal::Money;
use crate::errors::{FundError, Result};
use crate::state::{FundLogEntry, Member, Payment};
use crate::types::{FundFlow, PaymentType, WithdrawalMode};

/// ref_type stamped onto fund-log entries written by transfer withdrawals
pub const REF_WITHDRAWAL_TRANSFER: &str = "withdrawal_transfer";

/// one logical posting: the updated member snapshot plus every record it
/// produced, to be committed together or not at all
#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    pub member: Member,
    pub payments: Vec<Payment>,
    pub fund_log: Vec<FundLogEntry>,
}

impl Posting {
    fn new(member: Member) -> Self {
        Self {
            member,
            payments: Vec::new(),
            fund_log: Vec::new(),
        }
    }

    /// sum of all posted payment records
    pub fn total_posted(&self) -> Money {
        self.payments
            .iter()
            .fold(Money::ZERO, |acc, p| acc + p.amount)
    }
}

fn payment_record(
    member: &Member,
    amount: Money,
    date: FundDate,
    payment_type: PaymentType,
    note: Option<String>,
    receipt_image_path: Option<String>,
    now: DateTime<Utc>,
) -> Payment {
    Payment {
        id: Uuid::new_v4(),
        member_id: member.id,
        amount,
        date,
        payment_type,
        note,
        created_at: now,
        receipt_image_path,
    }
}

/// post a pure deposit contribution: deposit grows by the amount
pub fn post_contribution(
    member: Member,
    amount: Money,
    date: FundDate,
    note: Option<String>,
    now: DateTime<Utc>,
) -> Result<Posting> {
    if !amount.is_positive() {
        return Err(FundError::InvalidPaymentAmount { amount });
    }
    let mut posting = Posting::new(member);
    posting.member.deposit += amount;
    let record = payment_record(
        &posting.member,
        amount,
        date,
        PaymentType::Contribution,
        note,
        None,
        now,
    );
    posting.payments.push(record);
    Ok(posting)
}

/// post a pure repayment: the loan balance shrinks, clamped at zero
///
/// the clamp silently absorbs an overpayment beyond the tracked balance;
/// the classifier caps the repayment leg at the balance on the paths where
/// that matters, so the clamp never masks a split error.
pub fn post_repayment(
    member: Member,
    amount: Money,
    date: FundDate,
    note: Option<String>,
    now: DateTime<Utc>,
) -> Result<Posting> {
    if !amount.is_positive() {
        return Err(FundError::InvalidPaymentAmount { amount });
    }
    let mut posting = Posting::new(member);
    posting.member.loan_balance = posting.member.loan_balance.saturating_sub(amount);
    let record = payment_record(
        &posting.member,
        amount,
        date,
        PaymentType::Repayment,
        note,
        None,
        now,
    );
    posting.payments.push(record);
    Ok(posting)
}

/// notes for the two legs of a split posting
#[derive(Debug, Clone)]
pub struct SplitNotes {
    pub repayment: String,
    pub contribution: String,
}

/// post a split payment: a repayment leg and a contribution leg in one unit
///
/// a leg with a non-positive amount is applied as zero and posts no record,
/// so a fully-consumed split still yields a single payment.
pub fn post_split(
    member: Member,
    repayment_amount: Money,
    contribution_amount: Money,
    date: FundDate,
    notes: SplitNotes,
    receipt_image_path: Option<String>,
    now: DateTime<Utc>,
) -> Result<Posting> {
    let total = repayment_amount + contribution_amount;
    if !total.is_positive() || repayment_amount.is_negative() || contribution_amount.is_negative()
    {
        return Err(FundError::InvalidPaymentAmount { amount: total });
    }

    let mut posting = Posting::new(member);
    if repayment_amount.is_positive() {
        posting.member.loan_balance =
            posting.member.loan_balance.saturating_sub(repayment_amount);
        let record = payment_record(
            &posting.member,
            repayment_amount,
            date,
            PaymentType::Repayment,
            Some(notes.repayment),
            receipt_image_path.clone(),
            now,
        );
        posting.payments.push(record);
    }
    if contribution_amount.is_positive() {
        posting.member.deposit += contribution_amount;
        let record = payment_record(
            &posting.member,
            contribution_amount,
            date,
            PaymentType::Contribution,
            Some(notes.contribution),
            receipt_image_path,
            now,
        );
        posting.payments.push(record);
    }
    Ok(posting)
}

/// post a classified payment, resolving leg notes from the templates
///
/// pure-contribution and pure-repayment outcomes carry the operator note
/// as-is; split legs get the tagged template notes the display grouping
/// relies on.
pub fn post_classified(
    member: Member,
    classification: &Classification,
    date: FundDate,
    operator_note: Option<&str>,
    notes: &NoteTemplates,
    receipt_image_path: Option<String>,
    now: DateTime<Utc>,
) -> Result<Posting> {
    let operator_note = operator_note
        .map(str::trim)
        .filter(|n| !n.is_empty());

    match *classification {
        Classification::Contribution { amount } => {
            let mut posting =
                post_contribution(member, amount, date, operator_note.map(String::from), now)?;
            if let Some(path) = receipt_image_path {
                for p in &mut posting.payments {
                    p.receipt_image_path = Some(path.clone());
                }
            }
            Ok(posting)
        }
        Classification::Repayment { amount, .. } => {
            let mut posting =
                post_repayment(member, amount, date, operator_note.map(String::from), now)?;
            if let Some(path) = receipt_image_path {
                for p in &mut posting.payments {
                    p.receipt_image_path = Some(path.clone());
                }
            }
            Ok(posting)
        }
        Classification::RepaymentWithSurplus { repayment, surplus } => post_split(
            member,
            repayment,
            surplus,
            date,
            SplitNotes {
                repayment: notes.repayment_leg(operator_note, surplus.is_positive()),
                contribution: notes.surplus_leg(operator_note),
            },
            receipt_image_path,
            now,
        ),
        Classification::InstallmentWithDeposit {
            installment,
            deposit,
        } => post_split(
            member,
            installment,
            deposit,
            date,
            SplitNotes {
                repayment: notes.installment_leg(operator_note),
                contribution: notes.deposit_leg(operator_note),
            },
            receipt_image_path,
            now,
        ),
    }
}

/// post a deposit withdrawal in the requested mode
///
/// deduct-from-loan decreases both balances and records the deduction as a
/// repayment so it shows up in the installment history; a card transfer
/// decreases the deposit only and records a fund-log outflow instead.
pub fn post_withdrawal(
    member: Member,
    amount: Money,
    mode: &WithdrawalMode,
    date: FundDate,
    notes: &NoteTemplates,
    now: DateTime<Utc>,
) -> Result<Posting> {
    if !amount.is_positive() {
        return Err(FundError::InvalidPaymentAmount { amount });
    }
    if amount > member.deposit {
        return Err(FundError::DepositExceeded {
            available: member.deposit,
            requested: amount,
        });
    }

    match mode {
        WithdrawalMode::DeductLoan => {
            if amount > member.loan_balance {
                return Err(FundError::LoanBalanceExceeded {
                    available: member.loan_balance,
                    requested: amount,
                });
            }
            let mut posting = Posting::new(member);
            posting.member.deposit -= amount;
            posting.member.loan_balance -= amount;
            let record = payment_record(
                &posting.member,
                amount,
                date,
                PaymentType::Repayment,
                Some(notes.withdrawal_deduct_loan.clone()),
                None,
                now,
            );
            posting.payments.push(record);
            Ok(posting)
        }
        WithdrawalMode::Transfer { card_number } => {
            if card_number.trim().is_empty() {
                return Err(FundError::MissingCardNumber);
            }
            let mut posting = Posting::new(member);
            posting.member.deposit -= amount;
            let entry = FundLogEntry {
                id: Uuid::new_v4(),
                flow: FundFlow::Out,
                amount,
                member_id: Some(posting.member.id),
                ref_type: REF_WITHDRAWAL_TRANSFER.to_string(),
                ref_id: None,
                date,
                note: Some(notes.transfer_outflow(card_number.trim(), amount)),
                created_at: now,
            };
            posting.fund_log.push(entry);
            Ok(posting)
        }
    }
}
