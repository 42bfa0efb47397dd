use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// unique identifier for a fund member
pub type MemberId = Uuid;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for a posted payment
pub type PaymentId = Uuid;

/// unique identifier for a fund-log entry
pub type FundLogId = Uuid;

/// unique identifier for a member-submitted loan request
pub type LoanRequestId = Uuid;

/// unique identifier for a receipt submission awaiting approval
pub type ReceiptSubmissionId = Uuid;

/// member status; members are never deleted, only flipped inactive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Active,
    Inactive,
}

/// loan status
///
/// settlement is an explicit administrative action, never an automatic
/// consequence of the balance reaching zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Active,
    Settled,
}

/// type of a posted payment record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// increases the member's deposit balance
    Contribution,
    /// decreases the member's loan balance
    Repayment,
}

/// operator-selected intent for an incoming payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntent {
    /// pure deposit contribution
    Contribution,
    /// monthly installment
    Repayment,
    /// one amount covering the installment plus a deposit surplus
    ContributionRepayment,
}

/// approval state of a loan request or receipt submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// how a deposit withdrawal is settled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum WithdrawalMode {
    /// deduct the amount from both the deposit and the loan balance
    DeductLoan,
    /// pay the amount out to the member's card; deposit only
    Transfer { card_number: String },
}

/// direction of a fund-log cashflow entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundFlow {
    In,
    Out,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_match_store() {
        assert_eq!(
            serde_json::to_string(&PaymentType::Contribution).unwrap(),
            "\"contribution\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentIntent::ContributionRepayment).unwrap(),
            "\"contribution_repayment\""
        );
        assert_eq!(serde_json::to_string(&LoanStatus::Settled).unwrap(), "\"settled\"");
        assert_eq!(serde_json::to_string(&FundFlow::Out).unwrap(), "\"out\"");
        let mode: WithdrawalMode = serde_json::from_str(
            r#"{"mode":"transfer","card_number":"6037-99"}"#,
        )
        .unwrap();
        assert_eq!(
            mode,
            WithdrawalMode::Transfer {
                card_number: "6037-99".to_string()
            }
        );
    }
}
