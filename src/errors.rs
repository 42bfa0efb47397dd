use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;

/// transport/store failures from the external persistence collaborator
///
/// reads fail closed: any of these aborts the operation before a write.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("version conflict on {entity} {id}: expected {expected}, found {found}")]
    VersionConflict {
        entity: &'static str,
        id: Uuid,
        expected: u64,
        found: u64,
    },

    #[error("store transport failure: {message}")]
    Transport { message: String },
}

#[derive(Error, Debug)]
pub enum FundError {
    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount { amount: Money },

    #[error("invalid date: {input}")]
    InvalidDate { input: String },

    #[error("member has an unsettled loan; change the payment type")]
    UnsettledLoan,

    #[error("amount exceeds the monthly installment; select the combined deposit/installment type")]
    SwitchToCombined,

    #[error("member has no registered loan")]
    NoActiveLoan,

    #[error("amount below the monthly installment: installment {installment}, provided {amount}")]
    AmountBelowInstallment { installment: Money, amount: Money },

    #[error("amount exceeds deposit balance: available {available}, requested {requested}")]
    DepositExceeded {
        available: Money,
        requested: Money,
    },

    #[error("amount exceeds remaining loan balance: available {available}, requested {requested}")]
    LoanBalanceExceeded {
        available: Money,
        requested: Money,
    },

    #[error("amount exceeds the fund lending ceiling: ceiling {ceiling}, requested {requested}")]
    LendingCeilingExceeded {
        ceiling: Money,
        requested: Money,
    },

    #[error("member already has an active loan; settle it before a new disbursal")]
    MemberHasActiveLoan,

    #[error("loan already settled")]
    LoanAlreadySettled,

    #[error("card number is required for a transfer withdrawal")]
    MissingCardNumber,

    #[error("receipt submission is not pending")]
    ReceiptNotPending,

    #[error("loan request is not pending")]
    LoanRequestNotPending,

    #[error("stale member state, reload and retry")]
    StaleMemberState,

    /// a multi-record posting failed after some records were already written;
    /// no compensating transaction exists, the operator must reconcile manually
    #[error("inconsistent posting: store failed after records {posted:?} were written")]
    InconsistentPosting {
        posted: Vec<Uuid>,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, FundError>;
