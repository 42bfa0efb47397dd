use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::FundDate;
use crate::decimal::Money;
use crate::types::{
    FundFlow, FundLogId, LoanId, LoanRequestId, LoanStatus, MemberId, MemberStatus, PaymentId,
    PaymentType, ReceiptSubmissionId, RequestStatus,
};

/// a fund member: identity plus running financial state
///
/// the core operates on materialized snapshots fetched right before an
/// operation and writes back full snapshots; the store owns the records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    pub full_name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,
    pub join_date: FundDate,
    /// contracted monthly share, informational only
    pub monthly_amount: Money,
    pub status: MemberStatus,
    /// cumulative principal ever disbursed, informational only
    #[serde(default)]
    pub loan_amount: Money,
    /// cumulative deposit balance, never negative
    #[serde(default)]
    pub deposit: Money,
    /// remaining amount owed on the active loan; zero when none
    #[serde(default)]
    pub loan_balance: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_chat_id: Option<String>,
    pub created_at: DateTime<Utc>,
    /// optimistic-concurrency stamp; the store bumps it on every update
    #[serde(default)]
    pub version: u64,
}

impl Member {
    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }

    /// withdrawal is only offered while there is something to withdraw
    pub fn can_withdraw(&self) -> bool {
        self.deposit.is_positive()
    }
}

/// a single loan disbursement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: LoanId,
    pub member_id: MemberId,
    /// principal
    pub amount: Money,
    /// disbursement date
    pub date: FundDate,
    /// repayment term in months, at least 1
    pub due_months: u32,
    /// legacy rows may miss the field; a missing status counts as active
    #[serde(default)]
    pub status: Option<LoanStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Loan {
    pub fn is_active(&self) -> bool {
        !matches!(self.status, Some(LoanStatus::Settled))
    }

    /// fixed monthly cell: floor(principal / term); the remainder is
    /// absorbed into the last cycle implicitly
    pub fn monthly_installment(&self) -> Money {
        crate::installment::monthly_installment(self.amount, self.due_months)
    }
}

/// an immutable posted transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub member_id: MemberId,
    pub amount: Money,
    pub date: FundDate,
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    /// provenance tag, e.g. the surplus-to-deposit marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    /// set when the payment was posted from an approved telegram receipt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_image_path: Option<String>,
}

/// a fund-level cashflow entry outside the member payment records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundLogEntry {
    pub id: FundLogId,
    #[serde(rename = "type")]
    pub flow: FundFlow,
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<MemberId>,
    /// what produced the entry, e.g. `withdrawal_transfer`
    pub ref_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<uuid::Uuid>,
    pub date: FundDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// a member-submitted request for a new loan
///
/// carries no financial effect; approval only marks the member eligible
/// for a disbursal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRequest {
    pub id: LoanRequestId,
    pub telegram_chat_id: String,
    pub user_name: String,
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reject_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// a member-submitted proof of payment awaiting classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSubmission {
    pub id: ReceiptSubmissionId,
    pub member_id: MemberId,
    pub member_name: String,
    pub image_path: String,
    pub status: RequestStatus,
    /// free text from the member, e.g. names covered by a family payment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
}
