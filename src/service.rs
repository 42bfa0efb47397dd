use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::FundDate;
use crate::classifier::{self, Classification};
use crate::config::FundConfig;
use crate::decimal::Money;
use crate::errors::{FundError, Result, StoreError};
use crate::events::{Event, EventStore};
use crate::fund::{self, FundSummary};
use crate::history::{self, PaymentRow};
use crate::ledger::{self, Posting};
use crate::lifecycle::{self, Disbursal, LoanApplication, LoanProgress};
use crate::state::{FundLogEntry, Loan, LoanRequest, Member, Payment, ReceiptSubmission};
use crate::store::FundStore;
use crate::types::{
    LoanId, LoanRequestId, MemberId, PaymentIntent, ReceiptSubmissionId, RequestStatus,
    WithdrawalMode,
};

/// an incoming payment as entered by the operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub member_id: MemberId,
    pub amount: Money,
    pub date: FundDate,
    pub intent: PaymentIntent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// link back to the receipt submission a payment plan came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptRef {
    pub submission_id: ReceiptSubmissionId,
    pub image_path: String,
}

/// a classified payment awaiting posting
///
/// split plans carry the computed preview the operator must confirm; the
/// classification is re-checked against a fresh snapshot at posting time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPlan {
    pub member_id: MemberId,
    pub amount: Money,
    pub intent: PaymentIntent,
    pub date: FundDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub classification: Classification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<ReceiptRef>,
}

impl PaymentPlan {
    pub fn requires_confirmation(&self) -> bool {
        self.classification.requires_confirmation()
    }
}

/// result of submitting a payment request
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Posted(PostingReceipt),
    /// the split preview to show the operator; post via `confirm_payment`
    NeedsConfirmation(PaymentPlan),
}

/// everything a committed posting produced
#[derive(Debug, Clone, PartialEq)]
pub struct PostingReceipt {
    pub member: Member,
    pub payments: Vec<Payment>,
    pub fund_log: Vec<FundLogEntry>,
    /// non-blocking warning: gap to the expected installment, when the
    /// posted repayment fell short of it
    pub shortfall: Option<Money>,
}

/// admin-supplied details when approving a receipt submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptApproval {
    pub amount: Money,
    pub date: FundDate,
    pub intent: PaymentIntent,
}

/// the fund: orchestrates classification, posting and lifecycle against
/// the external store
pub struct Fund<S: FundStore> {
    store: S,
    config: FundConfig,
    events: EventStore,
}

impl<S: FundStore> Fund<S> {
    pub fn new(store: S, config: FundConfig) -> Self {
        Self {
            store,
            config,
            events: EventStore::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn config(&self) -> &FundConfig {
        &self.config
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    /// the member's single active loan, if any
    pub fn active_loan(&self, member_id: MemberId) -> Result<Option<Loan>> {
        let loans = self.store.loans_for_member(member_id)?;
        Ok(loans.into_iter().find(Loan::is_active))
    }

    /// classify a payment request without touching the store
    pub fn preview_payment(&self, request: &PaymentRequest) -> Result<PaymentPlan> {
        let member = self.store.member(request.member_id)?;
        let active_loan = self.active_loan(request.member_id)?;
        let classification = classifier::classify(
            active_loan.as_ref(),
            member.loan_balance,
            request.amount,
            request.intent,
        )?;
        Ok(PaymentPlan {
            member_id: request.member_id,
            amount: request.amount,
            intent: request.intent,
            date: request.date,
            note: request
                .note
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(String::from),
            classification,
            receipt: None,
        })
    }

    /// submit a payment: posts immediately, or hands back the split preview
    /// for operator confirmation
    pub fn submit_payment(
        &mut self,
        request: PaymentRequest,
        time_provider: &SafeTimeProvider,
    ) -> Result<Submission> {
        let plan = self.preview_payment(&request)?;
        if plan.requires_confirmation() {
            return Ok(Submission::NeedsConfirmation(plan));
        }
        Ok(Submission::Posted(self.post_plan(plan, time_provider)?))
    }

    /// post a previously previewed plan after operator confirmation
    pub fn confirm_payment(
        &mut self,
        plan: PaymentPlan,
        time_provider: &SafeTimeProvider,
    ) -> Result<PostingReceipt> {
        self.post_plan(plan, time_provider)
    }

    fn post_plan(
        &mut self,
        plan: PaymentPlan,
        time_provider: &SafeTimeProvider,
    ) -> Result<PostingReceipt> {
        let member = self.store.member(plan.member_id)?;
        let active_loan = self.active_loan(plan.member_id)?;

        // re-run the classification against the fresh snapshot; any drift
        // means another writer moved the balances since the preview
        let fresh = classifier::classify(
            active_loan.as_ref(),
            member.loan_balance,
            plan.amount,
            plan.intent,
        )?;
        if fresh != plan.classification {
            return Err(FundError::StaleMemberState);
        }

        let expected_version = member.version;
        let now = time_provider.now();
        let posting = ledger::post_classified(
            member,
            &plan.classification,
            plan.date,
            plan.note.as_deref(),
            &self.config.notes,
            plan.receipt.as_ref().map(|r| r.image_path.clone()),
            now,
        )?;
        let (member, payments, fund_log) = self.commit_posting(posting, expected_version)?;

        if let Some(receipt) = &plan.receipt {
            self.mark_receipt_approved(receipt.submission_id, &payments, now)?;
            self.events.emit(Event::ReceiptApproved {
                submission_id: receipt.submission_id,
                member_id: plan.member_id,
                amount: plan.amount,
                timestamp: now,
            });
        }

        for p in &payments {
            self.events.emit(Event::PaymentPosted {
                payment_id: p.id,
                member_id: p.member_id,
                amount: p.amount,
                payment_type: p.payment_type,
                timestamp: now,
            });
        }
        if payments.len() > 1 {
            self.events.emit(Event::SplitPaymentPosted {
                member_id: plan.member_id,
                repayment: plan.classification.repayment_portion(),
                contribution: plan.classification.contribution_portion(),
                timestamp: now,
            });
        }

        Ok(PostingReceipt {
            member,
            payments,
            fund_log,
            shortfall: plan.classification.shortfall(),
        })
    }

    /// withdraw from a member's deposit
    pub fn withdraw(
        &mut self,
        member_id: MemberId,
        amount: Money,
        mode: WithdrawalMode,
        date: FundDate,
        time_provider: &SafeTimeProvider,
    ) -> Result<PostingReceipt> {
        let member = self.store.member(member_id)?;
        let expected_version = member.version;
        let deducted_from_loan = matches!(mode, WithdrawalMode::DeductLoan);
        let now = time_provider.now();
        let posting =
            ledger::post_withdrawal(member, amount, &mode, date, &self.config.notes, now)?;
        let (member, payments, fund_log) = self.commit_posting(posting, expected_version)?;
        self.events.emit(Event::WithdrawalRecorded {
            member_id,
            amount,
            deducted_from_loan,
            timestamp: now,
        });
        Ok(PostingReceipt {
            member,
            payments,
            fund_log,
            shortfall: None,
        })
    }

    /// disburse a new loan, gated on the per-member rule and the ceiling
    pub fn disburse_loan(
        &mut self,
        application: LoanApplication,
        time_provider: &SafeTimeProvider,
    ) -> Result<Disbursal> {
        let member = self.store.member(application.member_id)?;
        let existing = self.store.loans_for_member(member.id)?;
        let ceiling = fund::lending_ceiling(&self.store.members()?);
        let expected_version = member.version;
        let now = time_provider.now();

        let disbursal = lifecycle::disburse(member, application, &existing, ceiling, now)?;
        let loan = self.store.insert_loan(disbursal.loan)?;
        let member = match self.store.update_member(disbursal.member, expected_version) {
            Ok(m) => m,
            Err(source) => {
                return Err(FundError::InconsistentPosting {
                    posted: vec![loan.id],
                    source,
                })
            }
        };

        self.events.emit(Event::LoanDisbursed {
            loan_id: loan.id,
            member_id: member.id,
            amount: loan.amount,
            due_months: loan.due_months,
            timestamp: now,
        });
        Ok(Disbursal { loan, member })
    }

    /// mark a loan settled
    pub fn settle_loan(
        &mut self,
        loan_id: LoanId,
        time_provider: &SafeTimeProvider,
    ) -> Result<Loan> {
        let loan = self.store.loan(loan_id)?;
        let settled = lifecycle::settle(loan)?;
        let loan = self.store.update_loan(settled)?;
        self.events.emit(Event::LoanSettled {
            loan_id: loan.id,
            member_id: loan.member_id,
            timestamp: time_provider.now(),
        });
        Ok(loan)
    }

    /// approve a receipt submission with admin-supplied amount/date/type
    ///
    /// runs the exact same classification path as a manually entered
    /// payment; approval is not a bypass. split outcomes come back as
    /// `NeedsConfirmation`, to be posted with `confirm_payment`.
    pub fn approve_receipt(
        &mut self,
        submission_id: ReceiptSubmissionId,
        approval: ReceiptApproval,
        time_provider: &SafeTimeProvider,
    ) -> Result<Submission> {
        let submission = self.store.receipt_submission(submission_id)?;
        if submission.status != RequestStatus::Pending {
            return Err(FundError::ReceiptNotPending);
        }
        let mut plan = self.preview_payment(&PaymentRequest {
            member_id: submission.member_id,
            amount: approval.amount,
            date: approval.date,
            intent: approval.intent,
            note: None,
        })?;
        plan.receipt = Some(ReceiptRef {
            submission_id,
            image_path: submission.image_path,
        });
        if plan.requires_confirmation() {
            return Ok(Submission::NeedsConfirmation(plan));
        }
        Ok(Submission::Posted(self.post_plan(plan, time_provider)?))
    }

    /// reject a receipt submission; the message travels to the member via
    /// the external bot
    pub fn reject_receipt(
        &mut self,
        submission_id: ReceiptSubmissionId,
        message: Option<&str>,
        time_provider: &SafeTimeProvider,
    ) -> Result<ReceiptSubmission> {
        let mut submission = self.store.receipt_submission(submission_id)?;
        if submission.status != RequestStatus::Pending {
            return Err(FundError::ReceiptNotPending);
        }
        submission.status = RequestStatus::Rejected;
        let submission = self.store.update_receipt_submission(submission)?;
        let message = message
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.config.default_reject_message)
            .to_string();
        self.events.emit(Event::ReceiptRejected {
            submission_id,
            member_id: submission.member_id,
            message,
            timestamp: time_provider.now(),
        });
        Ok(submission)
    }

    /// approve a member's loan request; eligibility only, no disbursal
    pub fn approve_loan_request(
        &mut self,
        request_id: LoanRequestId,
        time_provider: &SafeTimeProvider,
    ) -> Result<LoanRequest> {
        let mut request = self.store.loan_request(request_id)?;
        if request.status != RequestStatus::Pending {
            return Err(FundError::LoanRequestNotPending);
        }
        request.status = RequestStatus::Approved;
        let request = self.store.update_loan_request(request)?;
        self.events.emit(Event::LoanRequestApproved {
            request_id,
            timestamp: time_provider.now(),
        });
        Ok(request)
    }

    /// reject a member's loan request with an optional reason
    pub fn reject_loan_request(
        &mut self,
        request_id: LoanRequestId,
        reason: Option<&str>,
        time_provider: &SafeTimeProvider,
    ) -> Result<LoanRequest> {
        let mut request = self.store.loan_request(request_id)?;
        if request.status != RequestStatus::Pending {
            return Err(FundError::LoanRequestNotPending);
        }
        request.status = RequestStatus::Rejected;
        request.reject_reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(String::from);
        let request = self.store.update_loan_request(request)?;
        self.events.emit(Event::LoanRequestRejected {
            request_id,
            reason: request.reject_reason.clone(),
            timestamp: time_provider.now(),
        });
        Ok(request)
    }

    /// repayment progress of a loan, watermark-annotated
    pub fn loan_progress(&self, loan_id: LoanId) -> Result<LoanProgress> {
        let loan = self.store.loan(loan_id)?;
        let member = self.store.member(loan.member_id)?;
        let payments = self.store.payments_for_member(loan.member_id)?;
        Ok(LoanProgress::derive(&loan, &member, &payments))
    }

    /// a member's payment history grouped for display
    pub fn member_history(&self, member_id: MemberId) -> Result<Vec<PaymentRow>> {
        let payments = self.store.payments_for_member(member_id)?;
        Ok(history::member_history(
            &payments,
            self.config.notes.surplus_tag(),
        ))
    }

    /// receipt submissions awaiting a decision
    pub fn pending_receipts(&self) -> Result<Vec<ReceiptSubmission>> {
        Ok(self.store.pending_receipt_submissions()?)
    }

    /// fund-wide cashflow summary
    pub fn summary(&self) -> Result<FundSummary> {
        let payments = self.store.payments()?;
        let loans = self.store.loans()?;
        Ok(FundSummary::compute(&payments, &loans))
    }

    /// current fund-wide lending ceiling
    pub fn lending_ceiling(&self) -> Result<Money> {
        Ok(fund::lending_ceiling(&self.store.members()?))
    }

    /// write a posting as one logical unit: records first, then the
    /// conditional member snapshot
    fn commit_posting(
        &mut self,
        posting: Posting,
        expected_version: u64,
    ) -> Result<(Member, Vec<Payment>, Vec<FundLogEntry>)> {
        let mut posted: Vec<Uuid> = Vec::new();
        let mut payments = Vec::new();
        for payment in posting.payments {
            match self.store.insert_payment(payment) {
                Ok(p) => {
                    posted.push(p.id);
                    payments.push(p);
                }
                Err(source) => return Err(Self::write_failure(posted, source)),
            }
        }
        let mut fund_log = Vec::new();
        for entry in posting.fund_log {
            match self.store.insert_fund_log(entry) {
                Ok(e) => {
                    posted.push(e.id);
                    fund_log.push(e);
                }
                Err(source) => return Err(Self::write_failure(posted, source)),
            }
        }
        let member = match self.store.update_member(posting.member, expected_version) {
            Ok(m) => m,
            Err(source) => return Err(Self::write_failure(posted, source)),
        };
        Ok((member, payments, fund_log))
    }

    fn mark_receipt_approved(
        &mut self,
        submission_id: ReceiptSubmissionId,
        payments: &[Payment],
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<()> {
        let posted: Vec<Uuid> = payments.iter().map(|p| p.id).collect();
        let mut submission = self
            .store
            .receipt_submission(submission_id)
            .map_err(|source| Self::write_failure(posted.clone(), source))?;
        submission.status = RequestStatus::Approved;
        submission.approved_at = Some(now);
        self.store
            .update_receipt_submission(submission)
            .map_err(|source| Self::write_failure(posted, source))?;
        Ok(())
    }

    /// map a store failure mid-posting: a clean abort when nothing was
    /// written yet, otherwise the hard inconsistency signal for manual
    /// reconciliation
    fn write_failure(posted: Vec<Uuid>, source: StoreError) -> FundError {
        if posted.is_empty() {
            match source {
                StoreError::VersionConflict { .. } => FundError::StaleMemberState,
                other => other.into(),
            }
        } else {
            FundError::InconsistentPosting { posted, source }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Member;
    use crate::store::MemoryStore;
    use crate::types::{LoanStatus, MemberStatus};
    use chrono::Utc;
    use hourglass_rs::TimeSource;

    fn time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(Utc::now()))
    }

    fn member(deposit: i64, loan_balance: i64) -> Member {
        Member {
            id: Uuid::new_v4(),
            full_name: "زهرا موسوی".to_string(),
            phone: "09120000000".to_string(),
            national_id: None,
            join_date: "1399-01-01".parse().unwrap(),
            monthly_amount: Money::from_major(500_000),
            status: MemberStatus::Active,
            loan_amount: Money::ZERO,
            deposit: Money::from_major(deposit),
            loan_balance: Money::from_major(loan_balance),
            telegram_chat_id: None,
            created_at: Utc::now(),
            version: 0,
        }
    }

    fn active_loan(member_id: MemberId, amount: i64, due_months: u32) -> Loan {
        Loan {
            id: Uuid::new_v4(),
            member_id,
            amount: Money::from_major(amount),
            date: "1400-01-15".parse().unwrap(),
            due_months,
            status: Some(LoanStatus::Active),
            note: None,
            created_at: Utc::now(),
        }
    }

    fn fund_with(members: Vec<Member>, loans: Vec<Loan>) -> Fund<MemoryStore> {
        let mut store = MemoryStore::new();
        for m in members {
            store.put_member(m);
        }
        for l in loans {
            store.put_loan(l);
        }
        Fund::new(store, FundConfig::default())
    }

    fn request(member_id: MemberId, amount: i64, intent: PaymentIntent) -> PaymentRequest {
        PaymentRequest {
            member_id,
            amount: Money::from_major(amount),
            date: "1400-02-15".parse().unwrap(),
            intent,
            note: None,
        }
    }

    #[test]
    fn test_contribution_posts_directly() {
        let m = member(1_000_000, 0);
        let id = m.id;
        let mut fund = fund_with(vec![m], vec![]);
        let tp = time();

        let submission = fund
            .submit_payment(request(id, 250_000, PaymentIntent::Contribution), &tp)
            .unwrap();
        let receipt = match submission {
            Submission::Posted(r) => r,
            other => panic!("expected posted, got {other:?}"),
        };
        assert_eq!(receipt.member.deposit, Money::from_major(1_250_000));
        assert_eq!(receipt.member.version, 1);
        assert_eq!(receipt.payments.len(), 1);

        // the store holds the same snapshot and record
        let stored = fund.store().member(id).unwrap();
        assert_eq!(stored.deposit, Money::from_major(1_250_000));
        assert_eq!(fund.store().payments().unwrap().len(), 1);
        assert!(fund
            .events()
            .iter()
            .any(|e| matches!(e, Event::PaymentPosted { .. })));
    }

    #[test]
    fn test_over_repayment_needs_confirmation_then_splits() {
        // scenario: amount 1,500,000 / installment 1,000,000 / balance 1,200,000
        let m = member(500_000, 1_200_000);
        let id = m.id;
        let loan = active_loan(id, 12_000_000, 12);
        let mut fund = fund_with(vec![m], vec![loan]);
        let tp = time();

        let submission = fund
            .submit_payment(request(id, 1_500_000, PaymentIntent::Repayment), &tp)
            .unwrap();
        let plan = match submission {
            Submission::NeedsConfirmation(plan) => plan,
            other => panic!("expected confirmation gate, got {other:?}"),
        };
        assert_eq!(
            plan.classification,
            Classification::RepaymentWithSurplus {
                repayment: Money::from_major(1_200_000),
                surplus: Money::from_major(300_000),
            }
        );
        // nothing posted before confirmation
        assert!(fund.store().payments().unwrap().is_empty());

        let receipt = fund.confirm_payment(plan, &tp).unwrap();
        assert_eq!(receipt.payments.len(), 2);
        assert_eq!(receipt.member.loan_balance, Money::ZERO);
        assert_eq!(receipt.member.deposit, Money::from_major(800_000));
        let total = receipt
            .payments
            .iter()
            .fold(Money::ZERO, |acc, p| acc + p.amount);
        assert_eq!(total, Money::from_major(1_500_000));
        assert!(fund
            .events()
            .iter()
            .any(|e| matches!(e, Event::SplitPaymentPosted { .. })));
    }

    #[test]
    fn test_combined_intent_differs_from_over_repayment() {
        // identical financial facts, combined intent: one installment only
        let m = member(500_000, 1_200_000);
        let id = m.id;
        let loan = active_loan(id, 12_000_000, 12);
        let mut fund = fund_with(vec![m], vec![loan]);
        let tp = time();

        let submission = fund
            .submit_payment(
                request(id, 1_500_000, PaymentIntent::ContributionRepayment),
                &tp,
            )
            .unwrap();
        let plan = match submission {
            Submission::NeedsConfirmation(plan) => plan,
            other => panic!("expected confirmation gate, got {other:?}"),
        };
        assert_eq!(
            plan.classification,
            Classification::InstallmentWithDeposit {
                installment: Money::from_major(1_000_000),
                deposit: Money::from_major(500_000),
            }
        );
        let receipt = fund.confirm_payment(plan, &tp).unwrap();
        assert_eq!(receipt.member.loan_balance, Money::from_major(200_000));
        assert_eq!(receipt.member.deposit, Money::from_major(1_000_000));
    }

    #[test]
    fn test_repayment_without_loan_rejected_without_writes() {
        let m = member(500_000, 0);
        let id = m.id;
        let mut fund = fund_with(vec![m], vec![]);
        let tp = time();

        let err = fund
            .submit_payment(request(id, 100_000, PaymentIntent::Repayment), &tp)
            .unwrap_err();
        assert!(matches!(err, FundError::NoActiveLoan));
        assert!(fund.store().payments().unwrap().is_empty());
        assert_eq!(fund.store().member(id).unwrap().version, 0);
    }

    #[test]
    fn test_under_installment_repayment_warns_on_receipt() {
        let m = member(0, 1_200_000);
        let id = m.id;
        let loan = active_loan(id, 1_200_000, 12); // installment 100k
        let mut fund = fund_with(vec![m], vec![loan]);
        let tp = time();

        let submission = fund
            .submit_payment(request(id, 80_000, PaymentIntent::Repayment), &tp)
            .unwrap();
        let receipt = match submission {
            Submission::Posted(r) => r,
            other => panic!("expected posted, got {other:?}"),
        };
        assert_eq!(receipt.shortfall, Some(Money::from_major(20_000)));
        assert_eq!(receipt.member.loan_balance, Money::from_major(1_120_000));
    }

    #[test]
    fn test_confirm_with_stale_plan_rejected() {
        let m = member(0, 1_200_000);
        let id = m.id;
        let loan = active_loan(id, 12_000_000, 12);
        let mut fund = fund_with(vec![m], vec![loan]);
        let tp = time();

        let plan = match fund
            .submit_payment(request(id, 1_500_000, PaymentIntent::Repayment), &tp)
            .unwrap()
        {
            Submission::NeedsConfirmation(plan) => plan,
            other => panic!("expected confirmation gate, got {other:?}"),
        };

        // another posting moves the balance before the operator confirms
        fund.submit_payment(request(id, 1_000_000, PaymentIntent::Repayment), &tp)
            .unwrap();

        let err = fund.confirm_payment(plan, &tp).unwrap_err();
        assert!(matches!(err, FundError::StaleMemberState));
    }

    #[test]
    fn test_withdraw_transfer_records_fund_log() {
        let m = member(500_000, 0);
        let id = m.id;
        let mut fund = fund_with(vec![m], vec![]);
        let tp = time();

        let receipt = fund
            .withdraw(
                id,
                Money::from_major(200_000),
                WithdrawalMode::Transfer {
                    card_number: "6037-9911".to_string(),
                },
                "1400-05-01".parse().unwrap(),
                &tp,
            )
            .unwrap();
        assert_eq!(receipt.member.deposit, Money::from_major(300_000));
        assert!(receipt.payments.is_empty());
        assert_eq!(receipt.fund_log.len(), 1);
        assert_eq!(fund.store().fund_log().len(), 1);
    }

    #[test]
    fn test_withdraw_deduct_loan_binding_cap() {
        // scenario: deposit 500k, balance 300k, request 400k
        let m = member(500_000, 300_000);
        let id = m.id;
        let mut fund = fund_with(vec![m], vec![]);
        let tp = time();

        let err = fund
            .withdraw(
                id,
                Money::from_major(400_000),
                WithdrawalMode::DeductLoan,
                "1400-05-01".parse().unwrap(),
                &tp,
            )
            .unwrap_err();
        assert!(matches!(err, FundError::LoanBalanceExceeded { .. }));
        assert_eq!(fund.store().member(id).unwrap().deposit, Money::from_major(500_000));
    }

    #[test]
    fn test_disburse_and_settle_lifecycle() {
        let lender = member(5_000_000, 0);
        let borrower = member(1_000_000, 0);
        let borrower_id = borrower.id;
        let mut fund = fund_with(vec![lender, borrower], vec![]);
        let tp = time();

        let disbursal = fund
            .disburse_loan(
                LoanApplication {
                    member_id: borrower_id,
                    amount: Money::from_major(1_200_000),
                    date: "1400-01-15".parse().unwrap(),
                    due_months: 12,
                    note: None,
                },
                &tp,
            )
            .unwrap();
        assert_eq!(disbursal.member.loan_balance, Money::from_major(1_200_000));

        // a second disbursal is gated
        let err = fund
            .disburse_loan(
                LoanApplication {
                    member_id: borrower_id,
                    amount: Money::from_major(100_000),
                    date: "1400-02-15".parse().unwrap(),
                    due_months: 2,
                    note: None,
                },
                &tp,
            )
            .unwrap_err();
        assert!(matches!(err, FundError::MemberHasActiveLoan));

        let progress = fund.loan_progress(disbursal.loan.id).unwrap();
        assert_eq!(progress.installment, Money::from_major(100_000));
        assert_eq!(progress.remaining, Money::from_major(1_200_000));

        let settled = fund.settle_loan(disbursal.loan.id, &tp).unwrap();
        assert_eq!(settled.status, Some(LoanStatus::Settled));
        // settlement is an assertion, not a balance consequence
        assert_eq!(
            fund.store().member(borrower_id).unwrap().loan_balance,
            Money::from_major(1_200_000)
        );
    }

    #[test]
    fn test_disburse_respects_ceiling() {
        let m = member(1_000_000, 400_000);
        let id = m.id;
        let mut fund = fund_with(vec![m], vec![]);
        let tp = time();

        assert_eq!(fund.lending_ceiling().unwrap(), Money::from_major(600_000));
        let err = fund
            .disburse_loan(
                LoanApplication {
                    member_id: id,
                    amount: Money::from_major(700_000),
                    date: "1400-01-15".parse().unwrap(),
                    due_months: 7,
                    note: None,
                },
                &tp,
            )
            .unwrap_err();
        assert!(matches!(err, FundError::LendingCeilingExceeded { .. }));
    }

    #[test]
    fn test_receipt_approval_routes_through_classifier() {
        let m = member(0, 1_200_000);
        let id = m.id;
        let loan = active_loan(id, 12_000_000, 12);
        let submission = ReceiptSubmission {
            id: Uuid::new_v4(),
            member_id: id,
            member_name: "زهرا موسوی".to_string(),
            image_path: "receipts/42.jpg".to_string(),
            status: RequestStatus::Pending,
            note: None,
            created_at: Utc::now(),
            approved_at: None,
        };
        let submission_id = submission.id;
        let mut fund = fund_with(vec![m], vec![loan]);
        fund.store_mut().put_receipt_submission(submission);
        let tp = time();
        assert_eq!(fund.pending_receipts().unwrap().len(), 1);

        let outcome = fund
            .approve_receipt(
                submission_id,
                ReceiptApproval {
                    amount: Money::from_major(1_500_000),
                    date: "1400-02-15".parse().unwrap(),
                    intent: PaymentIntent::ContributionRepayment,
                },
                &tp,
            )
            .unwrap();
        let plan = match outcome {
            Submission::NeedsConfirmation(plan) => plan,
            other => panic!("expected confirmation gate, got {other:?}"),
        };
        let receipt = fund.confirm_payment(plan, &tp).unwrap();
        assert_eq!(receipt.payments.len(), 2);
        assert!(receipt
            .payments
            .iter()
            .all(|p| p.receipt_image_path.as_deref() == Some("receipts/42.jpg")));
        let stored = fund.store().receipt_submission(submission_id).unwrap();
        assert_eq!(stored.status, RequestStatus::Approved);
        assert!(stored.approved_at.is_some());
        assert!(fund.pending_receipts().unwrap().is_empty());

        // a decided submission cannot be approved again
        let err = fund
            .approve_receipt(
                submission_id,
                ReceiptApproval {
                    amount: Money::from_major(100_000),
                    date: "1400-02-16".parse().unwrap(),
                    intent: PaymentIntent::Repayment,
                },
                &tp,
            )
            .unwrap_err();
        assert!(matches!(err, FundError::ReceiptNotPending));
    }

    #[test]
    fn test_reject_receipt_uses_default_message() {
        let m = member(0, 0);
        let id = m.id;
        let submission = ReceiptSubmission {
            id: Uuid::new_v4(),
            member_id: id,
            member_name: "x".to_string(),
            image_path: "receipts/9.jpg".to_string(),
            status: RequestStatus::Pending,
            note: None,
            created_at: Utc::now(),
            approved_at: None,
        };
        let submission_id = submission.id;
        let mut fund = fund_with(vec![m], vec![]);
        fund.store_mut().put_receipt_submission(submission);
        let tp = time();

        let rejected = fund.reject_receipt(submission_id, None, &tp).unwrap();
        assert_eq!(rejected.status, RequestStatus::Rejected);
        let message = fund.events().iter().find_map(|e| match e {
            Event::ReceiptRejected { message, .. } => Some(message.clone()),
            _ => None,
        });
        assert_eq!(
            message.as_deref(),
            Some("رسید شما تأیید نشد. در صورت نیاز مجدداً ارسال کنید.")
        );
    }

    #[test]
    fn test_loan_request_transitions() {
        let mut fund = fund_with(vec![], vec![]);
        let request = LoanRequest {
            id: Uuid::new_v4(),
            telegram_chat_id: "12345".to_string(),
            user_name: "ali".to_string(),
            status: RequestStatus::Pending,
            reject_reason: None,
            created_at: Utc::now(),
        };
        let request_id = request.id;
        fund.store_mut().put_loan_request(request);
        let tp = time();

        let approved = fund.approve_loan_request(request_id, &tp).unwrap();
        assert_eq!(approved.status, RequestStatus::Approved);
        let err = fund
            .reject_loan_request(request_id, Some("دیر شد"), &tp)
            .unwrap_err();
        assert!(matches!(err, FundError::LoanRequestNotPending));
    }

    #[test]
    fn test_member_history_groups_confirmed_split() {
        let m = member(0, 1_200_000);
        let id = m.id;
        let loan = active_loan(id, 12_000_000, 12);
        let mut fund = fund_with(vec![m], vec![loan]);
        let tp = time();

        let plan = match fund
            .submit_payment(request(id, 1_500_000, PaymentIntent::Repayment), &tp)
            .unwrap()
        {
            Submission::NeedsConfirmation(plan) => plan,
            other => panic!("expected confirmation gate, got {other:?}"),
        };
        fund.confirm_payment(plan, &tp).unwrap();

        let rows = fund.member_history(id).unwrap();
        assert_eq!(rows.len(), 1);
        match &rows[0] {
            PaymentRow::Combined {
                surplus_to_deposit, ..
            } => assert!(*surplus_to_deposit),
            other => panic!("expected combined row, got {other:?}"),
        }
    }

    #[test]
    fn test_summary_over_store() {
        let m = member(0, 0);
        let id = m.id;
        let mut fund = fund_with(vec![m], vec![]);
        let tp = time();
        fund.submit_payment(request(id, 300_000, PaymentIntent::Contribution), &tp)
            .unwrap();
        let summary = fund.summary().unwrap();
        assert_eq!(summary.total_contributions, Money::from_major(300_000));
        assert_eq!(summary.balance, Money::from_major(300_000));
    }

    // store wrapper that fails member updates, for partial-failure tests
    struct FlakyStore {
        inner: MemoryStore,
        fail_member_updates: bool,
    }

    impl FundStore for FlakyStore {
        fn member(&self, id: MemberId) -> std::result::Result<Member, StoreError> {
            self.inner.member(id)
        }
        fn members(&self) -> std::result::Result<Vec<Member>, StoreError> {
            self.inner.members()
        }
        fn loan(&self, id: LoanId) -> std::result::Result<Loan, StoreError> {
            self.inner.loan(id)
        }
        fn loans(&self) -> std::result::Result<Vec<Loan>, StoreError> {
            self.inner.loans()
        }
        fn loans_for_member(
            &self,
            member_id: MemberId,
        ) -> std::result::Result<Vec<Loan>, StoreError> {
            self.inner.loans_for_member(member_id)
        }
        fn payments(&self) -> std::result::Result<Vec<Payment>, StoreError> {
            self.inner.payments()
        }
        fn payments_for_member(
            &self,
            member_id: MemberId,
        ) -> std::result::Result<Vec<Payment>, StoreError> {
            self.inner.payments_for_member(member_id)
        }
        fn insert_payment(&mut self, payment: Payment) -> std::result::Result<Payment, StoreError> {
            self.inner.insert_payment(payment)
        }
        fn insert_loan(&mut self, loan: Loan) -> std::result::Result<Loan, StoreError> {
            self.inner.insert_loan(loan)
        }
        fn update_loan(&mut self, loan: Loan) -> std::result::Result<Loan, StoreError> {
            self.inner.update_loan(loan)
        }
        fn insert_fund_log(
            &mut self,
            entry: FundLogEntry,
        ) -> std::result::Result<FundLogEntry, StoreError> {
            self.inner.insert_fund_log(entry)
        }
        fn update_member(
            &mut self,
            member: Member,
            expected_version: u64,
        ) -> std::result::Result<Member, StoreError> {
            if self.fail_member_updates {
                return Err(StoreError::Transport {
                    message: "connection reset".to_string(),
                });
            }
            self.inner.update_member(member, expected_version)
        }
        fn receipt_submission(
            &self,
            id: ReceiptSubmissionId,
        ) -> std::result::Result<ReceiptSubmission, StoreError> {
            self.inner.receipt_submission(id)
        }
        fn pending_receipt_submissions(
            &self,
        ) -> std::result::Result<Vec<ReceiptSubmission>, StoreError> {
            self.inner.pending_receipt_submissions()
        }
        fn update_receipt_submission(
            &mut self,
            submission: ReceiptSubmission,
        ) -> std::result::Result<ReceiptSubmission, StoreError> {
            self.inner.update_receipt_submission(submission)
        }
        fn loan_request(
            &self,
            id: LoanRequestId,
        ) -> std::result::Result<LoanRequest, StoreError> {
            self.inner.loan_request(id)
        }
        fn update_loan_request(
            &mut self,
            request: LoanRequest,
        ) -> std::result::Result<LoanRequest, StoreError> {
            self.inner.update_loan_request(request)
        }
    }

    #[test]
    fn test_partial_failure_surfaces_inconsistency() {
        let m = member(1_000_000, 0);
        let id = m.id;
        let mut inner = MemoryStore::new();
        inner.put_member(m);
        let mut fund = Fund::new(
            FlakyStore {
                inner,
                fail_member_updates: true,
            },
            FundConfig::default(),
        );
        let tp = time();

        let err = fund
            .submit_payment(request(id, 250_000, PaymentIntent::Contribution), &tp)
            .unwrap_err();
        match err {
            FundError::InconsistentPosting { posted, .. } => assert_eq!(posted.len(), 1),
            other => panic!("expected inconsistency signal, got {other:?}"),
        }
    }
}
