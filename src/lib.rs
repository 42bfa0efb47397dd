pub mod calendar;
pub mod classifier;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod fund;
pub mod history;
pub mod installment;
pub mod ledger;
pub mod lifecycle;
pub mod service;
pub mod state;
pub mod store;
pub mod types;

// re-export key types
pub use calendar::FundDate;
pub use classifier::{classify, Classification};
pub use config::{FundConfig, NoteTemplates};
pub use decimal::Money;
pub use errors::{FundError, Result, StoreError};
pub use events::{Event, EventStore};
pub use fund::{lending_ceiling, FundSummary};
pub use history::{member_history, PaymentRow};
pub use installment::{
    due_schedule, is_month_paid, monthly_installment, DueInstallment, InstallmentStatus,
};
pub use ledger::{
    post_classified, post_contribution, post_repayment, post_split, post_withdrawal, Posting,
    SplitNotes,
};
pub use lifecycle::{
    can_disburse, disburse, has_active_loan, settle, Disbursal, LoanApplication, LoanProgress,
};
pub use service::{
    Fund, PaymentPlan, PaymentRequest, PostingReceipt, ReceiptApproval, ReceiptRef, Submission,
};
pub use state::{FundLogEntry, Loan, LoanRequest, Member, Payment, ReceiptSubmission};
pub use store::{FundStore, MemoryStore};
pub use types::{
    FundFlow, LoanId, LoanStatus, MemberId, MemberStatus, PaymentId, PaymentIntent, PaymentType,
    RequestStatus, WithdrawalMode,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
