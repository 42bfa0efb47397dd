use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{
    LoanId, LoanRequestId, MemberId, PaymentId, PaymentType, ReceiptSubmissionId,
};

/// all events emitted by fund operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // payment events
    PaymentPosted {
        payment_id: PaymentId,
        member_id: MemberId,
        amount: Money,
        payment_type: PaymentType,
        timestamp: DateTime<Utc>,
    },
    SplitPaymentPosted {
        member_id: MemberId,
        repayment: Money,
        contribution: Money,
        timestamp: DateTime<Utc>,
    },
    WithdrawalRecorded {
        member_id: MemberId,
        amount: Money,
        deducted_from_loan: bool,
        timestamp: DateTime<Utc>,
    },

    // loan lifecycle events
    LoanDisbursed {
        loan_id: LoanId,
        member_id: MemberId,
        amount: Money,
        due_months: u32,
        timestamp: DateTime<Utc>,
    },
    LoanSettled {
        loan_id: LoanId,
        member_id: MemberId,
        timestamp: DateTime<Utc>,
    },

    // telegram-sourced workflow events
    ReceiptApproved {
        submission_id: ReceiptSubmissionId,
        member_id: MemberId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    ReceiptRejected {
        submission_id: ReceiptSubmissionId,
        member_id: MemberId,
        message: String,
        timestamp: DateTime<Utc>,
    },
    LoanRequestApproved {
        request_id: LoanRequestId,
        timestamp: DateTime<Utc>,
    },
    LoanRequestRejected {
        request_id: LoanRequestId,
        reason: Option<String>,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
