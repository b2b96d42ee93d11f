use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::RejectionReason;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoanError {
    #[error("invalid term: {term_days} days, loans must use 15 or 30 day terms")]
    InvalidTerm {
        term_days: u32,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("payment rejected: {reason}")]
    PaymentRejected {
        reason: RejectionReason,
    },

    #[error("payment {payment_number} resolves to period {resolved_period}, behind current period {current_period}")]
    SequenceInvariantViolation {
        payment_number: usize,
        resolved_period: usize,
        current_period: usize,
    },

    #[error("as-of {as_of} is before origination {origination}")]
    AsOfBeforeOrigination {
        as_of: DateTime<Utc>,
        origination: DateTime<Utc>,
    },
}

pub type Result<T> = std::result::Result<T, LoanError>;
