use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{LoanError, Result};

/// unique identifier for a loan
pub type LoanId = Uuid;

/// length of one installment period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum TermLength {
    /// twice a month; the declared rate is halved per period
    Fortnightly,
    Monthly,
}

impl TermLength {
    /// validate a raw term length in days
    pub fn from_days(days: u32) -> Result<Self> {
        match days {
            15 => Ok(TermLength::Fortnightly),
            30 => Ok(TermLength::Monthly),
            other => Err(LoanError::InvalidTerm { term_days: other }),
        }
    }

    pub fn days(&self) -> u32 {
        match self {
            TermLength::Fortnightly => 15,
            TermLength::Monthly => 30,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::days(self.days() as i64)
    }
}

impl TryFrom<u32> for TermLength {
    type Error = LoanError;

    fn try_from(days: u32) -> Result<Self> {
        TermLength::from_days(days)
    }
}

impl From<TermLength> for u32 {
    fn from(term: TermLength) -> u32 {
        term.days()
    }
}

impl fmt::Display for TermLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} days", self.days())
    }
}

/// installment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    /// period still open, nothing decided yet
    Pending,
    /// period closed with interest left uncovered
    Late,
    /// uncovered interest was capitalized into the balance
    Mora,
    /// interest fully covered within its own period
    Payed,
    /// interest fully covered by a payment from the following period
    LatePayment,
}

impl InstallmentStatus {
    /// interest fully covered, one way or the other
    pub fn is_settled(&self) -> bool {
        matches!(self, InstallmentStatus::Payed | InstallmentStatus::LatePayment)
    }
}

impl fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InstallmentStatus::Pending => "pending",
            InstallmentStatus::Late => "late",
            InstallmentStatus::Mora => "mora",
            InstallmentStatus::Payed => "payed",
            InstallmentStatus::LatePayment => "late payment",
        };
        f.write_str(label)
    }
}

/// loan-level status, derived from the last two installments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    /// balance paid off
    #[serde(rename = "concluido")]
    Concluded,
    /// previous period closed with interest outstanding
    #[serde(rename = "pago_atrasado")]
    PaymentOverdue,
    /// current period open and unpaid
    #[serde(rename = "pago_pendiente")]
    PaymentPending,
    /// current period already covered
    #[serde(rename = "periodo_saldado")]
    PeriodSettled,
}

impl LoanStatus {
    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::Concluded => "concluido",
            LoanStatus::PaymentOverdue => "pago_atrasado",
            LoanStatus::PaymentPending => "pago_pendiente",
            LoanStatus::PeriodSettled => "periodo_saldado",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// why a payment registration was refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    LoanConcluded,
    FutureDated {
        date: DateTime<Utc>,
        as_of: DateTime<Utc>,
    },
    NonPositiveAmount {
        amount: Money,
    },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::LoanConcluded => write!(f, "loan already concluded"),
            RejectionReason::FutureDated { date, as_of } => {
                write!(f, "payment dated {} is ahead of as-of {}", date, as_of)
            }
            RejectionReason::NonPositiveAmount { amount } => {
                write!(f, "amount must be positive, got {}", amount)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_validation() {
        assert_eq!(TermLength::from_days(15).unwrap(), TermLength::Fortnightly);
        assert_eq!(TermLength::from_days(30).unwrap(), TermLength::Monthly);
        assert!(matches!(
            TermLength::from_days(7),
            Err(LoanError::InvalidTerm { term_days: 7 })
        ));
    }

    #[test]
    fn test_status_labels_serialize() {
        let json = serde_json::to_string(&LoanStatus::PaymentOverdue).unwrap();
        assert_eq!(json, "\"pago_atrasado\"");

        let json = serde_json::to_string(&InstallmentStatus::LatePayment).unwrap();
        assert_eq!(json, "\"late_payment\"");
        assert_eq!(InstallmentStatus::LatePayment.to_string(), "late payment");
    }

    #[test]
    fn test_term_serializes_as_days() {
        let json = serde_json::to_string(&TermLength::Fortnightly).unwrap();
        assert_eq!(json, "15");
        assert!(serde_json::from_str::<TermLength>("20").is_err());
    }
}
