use std::collections::HashMap;

use crate::errors::StoreError;
use crate::state::{FundLogEntry, Loan, LoanRequest, Member, Payment, ReceiptSubmission};
use crate::types::{LoanId, LoanRequestId, MemberId, ReceiptSubmissionId};

/// the external persistence collaborator, seen as plain request/response
///
/// the core fetches materialized snapshots immediately before an operation
/// and writes back full snapshots. reads fail closed: a [`StoreError`]
/// aborts the operation before anything is written.
pub trait FundStore {
    fn member(&self, id: MemberId) -> Result<Member, StoreError>;
    fn members(&self) -> Result<Vec<Member>, StoreError>;

    fn loan(&self, id: LoanId) -> Result<Loan, StoreError>;
    fn loans(&self) -> Result<Vec<Loan>, StoreError>;
    fn loans_for_member(&self, member_id: MemberId) -> Result<Vec<Loan>, StoreError>;

    fn payments(&self) -> Result<Vec<Payment>, StoreError>;
    /// a member's payments, most recent first
    fn payments_for_member(&self, member_id: MemberId) -> Result<Vec<Payment>, StoreError>;

    fn insert_payment(&mut self, payment: Payment) -> Result<Payment, StoreError>;
    fn insert_loan(&mut self, loan: Loan) -> Result<Loan, StoreError>;
    fn update_loan(&mut self, loan: Loan) -> Result<Loan, StoreError>;
    fn insert_fund_log(&mut self, entry: FundLogEntry) -> Result<FundLogEntry, StoreError>;

    /// conditional full-snapshot write: succeeds only while the stored
    /// version still matches, otherwise [`StoreError::VersionConflict`]
    fn update_member(&mut self, member: Member, expected_version: u64)
        -> Result<Member, StoreError>;

    fn receipt_submission(&self, id: ReceiptSubmissionId)
        -> Result<ReceiptSubmission, StoreError>;
    fn pending_receipt_submissions(&self) -> Result<Vec<ReceiptSubmission>, StoreError>;
    fn update_receipt_submission(
        &mut self,
        submission: ReceiptSubmission,
    ) -> Result<ReceiptSubmission, StoreError>;

    fn loan_request(&self, id: LoanRequestId) -> Result<LoanRequest, StoreError>;
    fn update_loan_request(&mut self, request: LoanRequest) -> Result<LoanRequest, StoreError>;
}

/// in-memory store, used in tests and demos
#[derive(Debug, Default)]
pub struct MemoryStore {
    members: HashMap<MemberId, Member>,
    loans: Vec<Loan>,
    payments: Vec<Payment>,
    fund_log: Vec<FundLogEntry>,
    receipt_submissions: HashMap<ReceiptSubmissionId, ReceiptSubmission>,
    loan_requests: HashMap<LoanRequestId, LoanRequest>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// seed a member; the stored version stamp is taken from the record
    pub fn put_member(&mut self, member: Member) {
        self.members.insert(member.id, member);
    }

    pub fn put_loan(&mut self, loan: Loan) {
        self.loans.push(loan);
    }

    pub fn put_receipt_submission(&mut self, submission: ReceiptSubmission) {
        self.receipt_submissions.insert(submission.id, submission);
    }

    pub fn put_loan_request(&mut self, request: LoanRequest) {
        self.loan_requests.insert(request.id, request);
    }

    pub fn fund_log(&self) -> &[FundLogEntry] {
        &self.fund_log
    }
}

impl FundStore for MemoryStore {
    fn member(&self, id: MemberId) -> Result<Member, StoreError> {
        self.members
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "member", id })
    }

    fn members(&self) -> Result<Vec<Member>, StoreError> {
        Ok(self.members.values().cloned().collect())
    }

    fn loan(&self, id: LoanId) -> Result<Loan, StoreError> {
        self.loans
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "loan", id })
    }

    fn loans(&self) -> Result<Vec<Loan>, StoreError> {
        Ok(self.loans.clone())
    }

    fn loans_for_member(&self, member_id: MemberId) -> Result<Vec<Loan>, StoreError> {
        Ok(self
            .loans
            .iter()
            .filter(|l| l.member_id == member_id)
            .cloned()
            .collect())
    }

    fn payments(&self) -> Result<Vec<Payment>, StoreError> {
        Ok(self.payments.clone())
    }

    fn payments_for_member(&self, member_id: MemberId) -> Result<Vec<Payment>, StoreError> {
        let mut payments: Vec<Payment> = self
            .payments
            .iter()
            .filter(|p| p.member_id == member_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(payments)
    }

    fn insert_payment(&mut self, payment: Payment) -> Result<Payment, StoreError> {
        self.payments.push(payment.clone());
        Ok(payment)
    }

    fn insert_loan(&mut self, loan: Loan) -> Result<Loan, StoreError> {
        self.loans.push(loan.clone());
        Ok(loan)
    }

    fn update_loan(&mut self, loan: Loan) -> Result<Loan, StoreError> {
        let id = loan.id;
        match self.loans.iter_mut().find(|l| l.id == id) {
            Some(slot) => {
                *slot = loan.clone();
                Ok(loan)
            }
            None => Err(StoreError::NotFound { entity: "loan", id }),
        }
    }

    fn insert_fund_log(&mut self, entry: FundLogEntry) -> Result<FundLogEntry, StoreError> {
        self.fund_log.push(entry.clone());
        Ok(entry)
    }

    fn update_member(
        &mut self,
        member: Member,
        expected_version: u64,
    ) -> Result<Member, StoreError> {
        let id = member.id;
        let stored = self
            .members
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "member", id })?;
        if stored.version != expected_version {
            return Err(StoreError::VersionConflict {
                entity: "member",
                id,
                expected: expected_version,
                found: stored.version,
            });
        }
        let mut member = member;
        member.version = expected_version + 1;
        *stored = member.clone();
        Ok(member)
    }

    fn receipt_submission(
        &self,
        id: ReceiptSubmissionId,
    ) -> Result<ReceiptSubmission, StoreError> {
        self.receipt_submissions
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "receipt submission",
                id,
            })
    }

    fn pending_receipt_submissions(&self) -> Result<Vec<ReceiptSubmission>, StoreError> {
        let mut pending: Vec<ReceiptSubmission> = self
            .receipt_submissions
            .values()
            .filter(|s| s.status == crate::types::RequestStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pending)
    }

    fn update_receipt_submission(
        &mut self,
        submission: ReceiptSubmission,
    ) -> Result<ReceiptSubmission, StoreError> {
        let id = submission.id;
        match self.receipt_submissions.get_mut(&id) {
            Some(slot) => {
                *slot = submission.clone();
                Ok(submission)
            }
            None => Err(StoreError::NotFound {
                entity: "receipt submission",
                id,
            }),
        }
    }

    fn loan_request(&self, id: LoanRequestId) -> Result<LoanRequest, StoreError> {
        self.loan_requests
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: "loan request",
                id,
            })
    }

    fn update_loan_request(&mut self, request: LoanRequest) -> Result<LoanRequest, StoreError> {
        let id = request.id;
        match self.loan_requests.get_mut(&id) {
            Some(slot) => {
                *slot = request.clone();
                Ok(request)
            }
            None => Err(StoreError::NotFound {
                entity: "loan request",
                id,
            }),
        }
    }
}
