use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{LoanId, LoanStatus, RejectionReason};

/// all events that can be emitted by a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // lifecycle events
    LoanOriginated {
        loan_id: LoanId,
        capital: Money,
        fee: Money,
        term_days: u32,
        origination_date: DateTime<Utc>,
    },
    LoanConcluded {
        loan_id: LoanId,
        final_payment: Money,
        timestamp: DateTime<Utc>,
    },

    // payment events
    PaymentRegistered {
        loan_id: LoanId,
        payment_number: usize,
        amount: Money,
        applied_to_interest: Money,
        applied_to_principal: Money,
        balance_after: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentRejected {
        loan_id: LoanId,
        amount: Money,
        date: DateTime<Utc>,
        reason: RejectionReason,
    },

    // arrears events
    InterestCapitalized {
        loan_id: LoanId,
        installment: usize,
        due_date: NaiveDate,
        amount: Money,
        new_balance: Money,
    },

    // status change events
    StatusChanged {
        loan_id: LoanId,
        old_status: LoanStatus,
        new_status: LoanStatus,
        as_of: DateTime<Utc>,
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

    pub fn events(&self) -> &[Event] {
        &self.events
    }
}
