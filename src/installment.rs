use chrono::{DateTime, Utc};
use log::trace;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::payments::PaymentAllocation;
use crate::types::InstallmentStatus;

/// one fixed-length period of the loan, as computed by a single engine run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    /// 0-based period number
    pub number: usize,
    pub due_date: DateTime<Utc>,
    pub status: InstallmentStatus,
    /// interest owed for this period, possibly inflated by capitalized arrears
    pub interest_due: Money,
    pub interest_covered: Money,
    pub principal_covered: Money,
    /// balance when the period opened, before any capitalization
    pub opening_balance: Money,
    /// balance at the close of the period
    pub balance_after: Money,
    /// payments bucketed into this period, in processing order
    pub allocations: Vec<PaymentAllocation>,
}

impl Installment {
    pub fn open(
        number: usize,
        due_date: DateTime<Utc>,
        interest_due: Money,
        opening_balance: Money,
    ) -> Self {
        Self {
            number,
            due_date,
            status: InstallmentStatus::Pending,
            interest_due,
            interest_covered: Money::ZERO,
            principal_covered: Money::ZERO,
            opening_balance,
            balance_after: opening_balance,
            allocations: Vec::new(),
        }
    }

    pub fn interest_outstanding(&self) -> Money {
        (self.interest_due - self.interest_covered).non_negative()
    }

    pub fn is_interest_covered(&self) -> bool {
        self.interest_covered >= self.interest_due
    }

    /// commit as much of the payment's uncommitted amount as this period's
    /// outstanding interest takes; returns the amount applied
    pub fn apply_interest(&mut self, allocation: &mut PaymentAllocation) -> Money {
        if self.status.is_settled() || self.status == InstallmentStatus::Mora {
            return Money::ZERO;
        }

        let applied = self.interest_outstanding().min(allocation.uncommitted());
        self.interest_covered += applied;
        allocation.interest_portion += applied;

        if self.is_interest_covered() {
            self.status = match self.status {
                InstallmentStatus::Pending => InstallmentStatus::Payed,
                _ => InstallmentStatus::LatePayment,
            };
        }

        trace!(
            "installment {}: payment {} applied {} to interest, status {}",
            self.number,
            allocation.number,
            applied,
            self.status
        );

        applied
    }

    /// copy with every monetary field rounded for display
    pub fn rounded(&self, dp: u32) -> Self {
        Self {
            number: self.number,
            due_date: self.due_date,
            status: self.status,
            interest_due: self.interest_due.round_display(dp),
            interest_covered: self.interest_covered.round_display(dp),
            principal_covered: self.principal_covered.round_display(dp),
            opening_balance: self.opening_balance.round_display(dp),
            balance_after: self.balance_after.round_display(dp),
            allocations: self.allocations.iter().map(|a| a.rounded(dp)).collect(),
        }
    }
}
