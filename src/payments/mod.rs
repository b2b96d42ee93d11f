pub mod allocation;
pub mod amortization;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::types::RejectionReason;

pub use allocation::PaymentAllocation;
pub use amortization::{calculate_fee, nominal_schedule, project_schedule, ScheduleEntry};

/// a registered payment; never mutated once recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// registration order, 0-based
    pub number: usize,
    pub amount: Money,
    pub date: DateTime<Utc>,
}

/// append-only list of payments for one loan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentLedger {
    payments: Vec<Payment>,
}

impl PaymentLedger {
    pub fn new() -> Self {
        Self {
            payments: Vec::new(),
        }
    }

    /// record a payment, numbering it by registration order
    pub fn append(&mut self, amount: Money, date: DateTime<Utc>) -> Result<&Payment> {
        if !amount.is_positive() {
            return Err(LoanError::PaymentRejected {
                reason: RejectionReason::NonPositiveAmount { amount },
            });
        }

        let number = self.payments.len();
        self.payments.push(Payment {
            number,
            amount,
            date,
        });

        Ok(&self.payments[number])
    }

    /// payments in registration order
    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    /// payments by date, ties kept in registration order
    pub fn chronological(&self) -> Vec<Payment> {
        let mut sorted = self.payments.clone();
        sorted.sort_by_key(|p| (p.date, p.number));
        sorted
    }

    pub fn latest_date(&self) -> Option<DateTime<Utc>> {
        self.payments.iter().map(|p| p.date).max()
    }

    pub fn total_paid(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }

    pub fn len(&self) -> usize {
        self.payments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_ledger_numbers_by_registration() {
        let mut ledger = PaymentLedger::new();
        let d1 = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let d2 = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();

        ledger.append(Money::from_major(100), d1).unwrap();
        ledger.append(Money::from_major(50), d2).unwrap();

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.payments()[0].number, 0);
        assert_eq!(ledger.payments()[1].number, 1);
        assert_eq!(ledger.latest_date(), Some(d1));
        assert_eq!(ledger.total_paid(), Money::from_major(150));
    }

    #[test]
    fn test_chronological_keeps_ties_in_registration_order() {
        let mut ledger = PaymentLedger::new();
        let later = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let same = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();

        ledger.append(Money::from_major(1), later).unwrap();
        ledger.append(Money::from_major(2), same).unwrap();
        ledger.append(Money::from_major(3), same).unwrap();

        let numbers: Vec<_> = ledger.chronological().iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2, 0]);
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let mut ledger = PaymentLedger::new();
        let date = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();

        let err = ledger.append(Money::ZERO, date).unwrap_err();
        assert!(matches!(
            err,
            LoanError::PaymentRejected {
                reason: RejectionReason::NonPositiveAmount { .. }
            }
        ));
        assert!(ledger.is_empty());
    }
}
