use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::payments::Payment;

/// the effect of one payment within the installment it was bucketed into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAllocation {
    pub number: usize,
    pub date: DateTime<Utc>,
    pub gross_amount: Money,
    /// all interest retired by this payment, including `carried_interest_portion`
    pub interest_portion: Money,
    /// interest retired on the previous period's arrears
    pub carried_interest_portion: Money,
    pub principal_portion: Money,
    /// left over once interest and the whole balance are covered
    pub excess: Money,
    pub balance_after: Money,
}

impl PaymentAllocation {
    /// fresh per-run record; the ledger entry itself is never touched
    pub fn for_payment(payment: &Payment) -> Self {
        Self {
            number: payment.number,
            date: payment.date,
            gross_amount: payment.amount,
            interest_portion: Money::ZERO,
            carried_interest_portion: Money::ZERO,
            principal_portion: Money::ZERO,
            excess: Money::ZERO,
            balance_after: Money::ZERO,
        }
    }

    /// amount not yet committed to interest
    pub fn uncommitted(&self) -> Money {
        (self.gross_amount - self.interest_portion).non_negative()
    }

    /// commit what is left after interest to principal, capped at the balance
    pub fn apply_principal(&mut self, balance: Money) -> Money {
        let available = self.uncommitted();
        let principal = available.min(balance.non_negative());

        self.principal_portion = principal;
        self.excess = available - principal;
        self.balance_after = balance - principal;
        self.balance_after
    }

    /// copy with every monetary field rounded for display
    pub fn rounded(&self, dp: u32) -> Self {
        Self {
            number: self.number,
            date: self.date,
            gross_amount: self.gross_amount.round_display(dp),
            interest_portion: self.interest_portion.round_display(dp),
            carried_interest_portion: self.carried_interest_portion.round_display(dp),
            principal_portion: self.principal_portion.round_display(dp),
            excess: self.excess.round_display(dp),
            balance_after: self.balance_after.round_display(dp),
        }
    }
}
