//! Payment-allocation engine.
//!
//! A run walks installment periods in due-date order together with the
//! payments sorted by date. Each payment first retires the previous period's
//! unpaid interest, then the current period's interest, and whatever remains
//! goes to principal. A period that closes with interest outstanding is
//! `Late`; once a later period is processed, that shortfall is capitalized
//! into the balance and the period becomes `Mora`.
//!
//! The engine is a pure function of terms, payments and as-of instant. It
//! never reads a clock and never mutates the caller's payments.

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::LoanTerms;
use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::installment::Installment;
use crate::payments::{Payment, PaymentAllocation};
use crate::schedule::InstallmentScheduler;
use crate::types::InstallmentStatus;

/// unpaid interest folded into the balance when a period went to mora
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capitalization {
    pub installment: usize,
    pub due_date: DateTime<Utc>,
    pub amount: Money,
    pub new_balance: Money,
}

/// output of one engine run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineRun {
    pub as_of: DateTime<Utc>,
    /// instant the installment count was derived from: as-of or the latest payment
    pub horizon: DateTime<Utc>,
    pub installments: Vec<Installment>,
    pub terminal_balance: Money,
    pub capitalizations: Vec<Capitalization>,
}

impl EngineRun {
    /// every allocation, in processing order
    pub fn allocations(&self) -> impl Iterator<Item = &PaymentAllocation> + '_ {
        self.installments.iter().flat_map(|i| i.allocations.iter())
    }

    /// allocation for a payment by its registration number
    pub fn allocation_for(&self, payment_number: usize) -> Option<&PaymentAllocation> {
        self.allocations().find(|a| a.number == payment_number)
    }

    pub fn total_interest_paid(&self) -> Money {
        self.allocations().map(|a| a.interest_portion).sum()
    }

    pub fn total_capitalized(&self) -> Money {
        self.capitalizations.iter().map(|c| c.amount).sum()
    }
}

/// replays a payment history against the loan terms
pub struct AllocationEngine<'a> {
    terms: &'a LoanTerms,
    scheduler: InstallmentScheduler,
    rate: Rate,
}

impl<'a> AllocationEngine<'a> {
    pub fn new(terms: &'a LoanTerms) -> Self {
        Self {
            terms,
            scheduler: InstallmentScheduler::from_terms(terms),
            rate: terms.effective_rate(),
        }
    }

    /// closed run: as-of is the last payment's date, or origination without payments
    pub fn run_final(&self, payments: &[Payment]) -> Result<EngineRun> {
        let as_of = payments
            .iter()
            .map(|p| p.date)
            .max()
            .unwrap_or(self.terms.origination_date)
            .max(self.terms.origination_date);
        self.run(payments, as_of)
    }

    /// compute every installment elapsed as of `as_of`
    pub fn run(&self, payments: &[Payment], as_of: DateTime<Utc>) -> Result<EngineRun> {
        if as_of < self.terms.origination_date {
            return Err(LoanError::AsOfBeforeOrigination {
                as_of,
                origination: self.terms.origination_date,
            });
        }

        // same-date payments apply in registration order
        let mut queue = payments.to_vec();
        queue.sort_by_key(|p| (p.date, p.number));

        let horizon = queue.last().map_or(as_of, |p| p.date.max(as_of));
        let count = self.scheduler.current_installment_number(horizon);

        let mut installments: Vec<Installment> = Vec::with_capacity(count);
        let mut capitalizations = Vec::new();
        let mut balance = self.terms.capital;
        let mut cursor = 0;

        for (number, due_date) in self.scheduler.due_dates(count).enumerate() {
            let is_last = number + 1 == count;

            let start = cursor;
            while cursor < queue.len() && queue[cursor].date <= due_date {
                cursor += 1;
            }
            let bucket = &queue[start..cursor];

            for payment in bucket {
                let resolved = self.scheduler.period_index_for(payment.date);
                if resolved < number {
                    return Err(LoanError::SequenceInvariantViolation {
                        payment_number: payment.number,
                        resolved_period: resolved,
                        current_period: number,
                    });
                }
            }

            let mut allocations: Vec<PaymentAllocation> =
                bucket.iter().map(PaymentAllocation::for_payment).collect();

            let (installment, new_balance, capitalization) = self.close_period(
                number,
                due_date,
                balance,
                installments.last_mut(),
                &mut allocations,
                is_last,
            );

            balance = new_balance;
            capitalizations.extend(capitalization);
            installments.push(installment);
        }

        Ok(EngineRun {
            as_of,
            horizon,
            installments,
            terminal_balance: balance,
            capitalizations,
        })
    }

    /// one step of the fold: settle a period against its bucket of payments
    fn close_period(
        &self,
        number: usize,
        due_date: DateTime<Utc>,
        opening_balance: Money,
        previous: Option<&mut Installment>,
        allocations: &mut Vec<PaymentAllocation>,
        is_last: bool,
    ) -> (Installment, Money, Option<Capitalization>) {
        let mut balance = opening_balance;
        let mut current = Installment::open(
            number,
            due_date,
            self.rate.interest_on(balance),
            opening_balance,
        );
        let mut capitalization = None;

        if let Some(previous) = previous {
            // new money retires old interest first
            for allocation in allocations.iter_mut() {
                let carried = previous.apply_interest(allocation);
                allocation.carried_interest_portion += carried;
            }

            // the final period of a run has nothing after it to carry the cost
            if previous.status == InstallmentStatus::Late && !is_last {
                let shortfall = previous.interest_outstanding();
                previous.status = InstallmentStatus::Mora;
                balance += shortfall;
                current.interest_due = self.rate.interest_on(balance);

                debug!(
                    "installment {} due {} went to mora, capitalized {} (balance {})",
                    previous.number,
                    previous.due_date.date_naive(),
                    shortfall,
                    balance
                );

                capitalization = Some(Capitalization {
                    installment: previous.number,
                    due_date: previous.due_date,
                    amount: shortfall,
                    new_balance: balance,
                });
            }
        }

        for allocation in allocations.iter_mut() {
            current.apply_interest(allocation);
        }

        for mut allocation in allocations.drain(..) {
            balance = allocation.apply_principal(balance);
            current.principal_covered += allocation.principal_portion;
            current.allocations.push(allocation);
        }

        current.balance_after = balance;

        if !current.status.is_settled() {
            if balance.is_zero() && current.interest_due.is_zero() {
                // nothing owed at all
                current.status = InstallmentStatus::Payed;
            } else if !is_last {
                current.status = InstallmentStatus::Late;
            }
        }

        debug!(
            "installment {} due {} closed: {} interest {}/{} balance {}",
            number,
            due_date.date_naive(),
            current.status,
            current.interest_covered,
            current.interest_due,
            balance
        );

        (current, balance, capitalization)
    }
}
