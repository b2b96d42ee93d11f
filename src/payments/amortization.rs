use chrono::{DateTime, Utc};
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::LoanTerms;
use crate::decimal::{Money, Rate};
use crate::payments::PaymentAllocation;
use crate::schedule::InstallmentScheduler;

/// one row of an amortization table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub number: usize,
    pub date: DateTime<Utc>,
    pub amount: Money,
    pub interest_portion: Money,
    pub principal_portion: Money,
    pub balance_after: Money,
    /// synthesized rather than taken from a registered payment
    pub projected: bool,
}

impl ScheduleEntry {
    fn from_allocation(allocation: &PaymentAllocation) -> Self {
        Self {
            number: allocation.number,
            date: allocation.date,
            amount: allocation.gross_amount,
            interest_portion: allocation.interest_portion,
            principal_portion: allocation.principal_portion,
            balance_after: allocation.balance_after,
            projected: false,
        }
    }

    /// copy with every monetary field rounded for display
    pub fn rounded(&self, dp: u32) -> Self {
        Self {
            amount: self.amount.round_display(dp),
            interest_portion: self.interest_portion.round_display(dp),
            principal_portion: self.principal_portion.round_display(dp),
            balance_after: self.balance_after.round_display(dp),
            ..self.clone()
        }
    }
}

/// fixed periodic payment of an amortizing annuity
///
/// `fee = P * r * (1 + r)^n / ((1 + r)^n - 1)`, or `P / n` when `r` is zero.
/// Once `(1 + r)^n` leaves decimal range the fee has converged to `P * r`.
pub fn calculate_fee(capital: Money, period_rate: Rate, periods: u32) -> Money {
    if periods == 0 {
        return capital;
    }

    let r = period_rate.as_decimal();

    if r.is_zero() {
        return capital / Decimal::from(periods);
    }

    let base = Decimal::ONE + r;
    let mut compound = Decimal::ONE;
    for _ in 0..periods {
        compound = match compound.checked_mul(base) {
            Some(next) => next,
            None => return period_rate.interest_on(capital),
        };
    }

    let denominator = compound - Decimal::ONE;
    if denominator.is_zero() {
        // rate too small to register over n periods
        return capital / Decimal::from(periods);
    }

    let fee = capital
        .as_decimal()
        .checked_mul(r)
        .and_then(|interest| interest.checked_mul(compound))
        .and_then(|numerator| numerator.checked_div(denominator))
        .unwrap_or_else(|| capital.as_decimal() * r / (Decimal::ONE - Decimal::ONE / compound));

    Money::from_decimal(fee)
}

/// contractual table: `installment_count` rows of the nominal fee, no payments
pub fn nominal_schedule(terms: &LoanTerms) -> Vec<ScheduleEntry> {
    let scheduler = InstallmentScheduler::from_terms(terms);
    let rate = terms.effective_rate();
    let fee = terms.fee();
    let count = terms.installment_count as usize;

    let mut balance = terms.capital;
    let mut rows = Vec::with_capacity(count);

    for (i, date) in scheduler.due_dates(count).enumerate() {
        let interest = rate.interest_on(balance);
        // last row absorbs rounding so the table closes at zero
        let principal = if i + 1 == count {
            balance
        } else {
            fee - interest
        };
        balance -= principal;

        rows.push(ScheduleEntry {
            number: i + 1,
            date,
            amount: interest + principal,
            interest_portion: interest,
            principal_portion: principal,
            balance_after: balance,
            projected: true,
        });
    }

    rows
}

/// real allocations followed by a payment-free forecast of the remaining periods
///
/// `allocations` must be in chronological order. The forecast starts from the
/// last allocation's balance, or from the capital at origination when nothing
/// has been paid, and stops once the balance is within `tolerance` of zero.
pub fn project_schedule(
    terms: &LoanTerms,
    allocations: &[PaymentAllocation],
    tolerance: Money,
) -> Vec<ScheduleEntry> {
    let scheduler = InstallmentScheduler::from_terms(terms);
    let rate = terms.effective_rate();
    let fee = terms.fee();

    let mut rows: Vec<ScheduleEntry> = allocations.iter().map(ScheduleEntry::from_allocation).collect();

    let (mut balance, mut period) = match allocations.last() {
        Some(last) => (last.balance_after, scheduler.period_index_for(last.date) + 1),
        None => (terms.capital, 0),
    };
    // registration numbers need not follow date order
    let mut number = allocations.iter().map(|a| a.number + 1).max().unwrap_or(0);

    while balance > tolerance {
        let interest = rate.interest_on(balance);
        let amortizing = fee - interest;
        if !amortizing.is_positive() {
            warn!(
                "fee {} does not cover interest {} on balance {}, projection stops",
                fee, interest, balance
            );
            break;
        }

        let principal = amortizing.min(balance);
        balance -= principal;

        rows.push(ScheduleEntry {
            number,
            date: scheduler.due_date(period),
            amount: principal + interest,
            interest_portion: interest,
            principal_portion: principal,
            balance_after: balance,
            projected: true,
        });

        number += 1;
        period += 1;
    }

    rows
}
