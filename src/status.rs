use crate::decimal::Money;
use crate::installment::Installment;
use crate::types::{InstallmentStatus, LoanStatus};

/// derives the loan-level status from a run's output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusClassifier {
    tolerance: Money,
}

impl StatusClassifier {
    pub fn new(tolerance: Money) -> Self {
        Self { tolerance }
    }

    pub fn classify(&self, installments: &[Installment], terminal_balance: Money) -> LoanStatus {
        if terminal_balance < self.tolerance {
            return LoanStatus::Concluded;
        }

        let len = installments.len();
        if len > 1 && installments[len - 2].status == InstallmentStatus::Late {
            return LoanStatus::PaymentOverdue;
        }

        match installments.last() {
            Some(last) if last.status != InstallmentStatus::Pending => LoanStatus::PeriodSettled,
            _ => LoanStatus::PaymentPending,
        }
    }
}

impl Default for StatusClassifier {
    fn default() -> Self {
        Self::new(Money::CENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn installment(number: usize, status: InstallmentStatus) -> Installment {
        let mut i = Installment::open(
            number,
            Utc.with_ymd_and_hms(2024, 1, 16, 0, 0, 0).unwrap(),
            Money::from_major(100),
            Money::from_major(1_000),
        );
        i.status = status;
        i
    }

    #[test]
    fn test_concluded_below_tolerance() {
        let classifier = StatusClassifier::default();
        let installments = vec![installment(0, InstallmentStatus::Late)];

        assert_eq!(
            classifier.classify(&installments, Money::from_str_exact("0.009").unwrap()),
            LoanStatus::Concluded
        );
    }

    #[test]
    fn test_overdue_when_previous_late() {
        let classifier = StatusClassifier::default();
        let installments = vec![
            installment(0, InstallmentStatus::Late),
            installment(1, InstallmentStatus::Pending),
        ];

        assert_eq!(
            classifier.classify(&installments, Money::from_major(1_000)),
            LoanStatus::PaymentOverdue
        );
    }

    #[test]
    fn test_pending_and_settled() {
        let classifier = StatusClassifier::default();

        let pending = vec![
            installment(0, InstallmentStatus::Payed),
            installment(1, InstallmentStatus::Pending),
        ];
        assert_eq!(
            classifier.classify(&pending, Money::from_major(900)),
            LoanStatus::PaymentPending
        );

        let settled = vec![
            installment(0, InstallmentStatus::Mora),
            installment(1, InstallmentStatus::Payed),
        ];
        assert_eq!(
            classifier.classify(&settled, Money::from_major(900)),
            LoanStatus::PeriodSettled
        );
    }
}
