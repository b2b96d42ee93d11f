use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use hourglass_rs::{SafeTimeProvider, TimeSource};
use log::{info, warn};
use uuid::Uuid;

use crate::config::{LoanPolicy, LoanTerms};
use crate::decimal::{Money, Rate};
use crate::engine::{AllocationEngine, EngineRun};
use crate::errors::{LoanError, Result};
use crate::events::{Event, EventStore};
use crate::installment::Installment;
use crate::payments::{nominal_schedule, project_schedule, Payment, PaymentAllocation, PaymentLedger, ScheduleEntry};
use crate::schedule::InstallmentScheduler;
use crate::serialization::{to_json_pretty, LoanView, Precision};
use crate::status::StatusClassifier;
use crate::types::{LoanId, LoanStatus, RejectionReason};

/// an installment loan and its payment history
///
/// Every state change re-runs the allocation engine over the whole ledger and
/// swaps in the fresh result only when the run succeeds.
#[derive(Debug)]
pub struct Loan {
    pub id: LoanId,
    terms: LoanTerms,
    policy: LoanPolicy,
    ledger: PaymentLedger,
    as_of: DateTime<Utc>,
    run: EngineRun,
    status: LoanStatus,
    reported_capitalizations: BTreeSet<usize>,
    pub events: EventStore,
}

impl Loan {
    /// originate a loan evaluated as of `as_of`
    pub fn new(terms: LoanTerms, policy: LoanPolicy, as_of: DateTime<Utc>) -> Result<Self> {
        terms.validate()?;

        let ledger = PaymentLedger::new();
        let run = AllocationEngine::new(&terms).run(ledger.payments(), as_of)?;
        let status = StatusClassifier::new(policy.settlement_tolerance)
            .classify(&run.installments, run.terminal_balance);

        let mut loan = Self {
            id: Uuid::new_v4(),
            terms,
            policy,
            ledger,
            as_of,
            run: run.clone(),
            status,
            reported_capitalizations: BTreeSet::new(),
            events: EventStore::new(),
        };

        loan.events.emit(Event::LoanOriginated {
            loan_id: loan.id,
            capital: loan.terms.capital,
            fee: loan.terms.fee(),
            term_days: loan.terms.term_days(),
            origination_date: loan.terms.origination_date,
        });
        loan.record_capitalizations(&run);

        info!(
            "loan {} originated: capital {} at {} per {}, fee {}",
            loan.id,
            loan.terms.capital,
            loan.terms.nominal_rate,
            loan.terms.term,
            loan.terms.fee()
        );

        Ok(loan)
    }

    pub fn builder() -> LoanBuilder {
        LoanBuilder::new()
    }

    pub fn terms(&self) -> &LoanTerms {
        &self.terms
    }

    pub fn policy(&self) -> &LoanPolicy {
        &self.policy
    }

    pub fn as_of(&self) -> DateTime<Utc> {
        self.as_of
    }

    pub fn status(&self) -> LoanStatus {
        self.status
    }

    pub fn fee(&self) -> Money {
        self.terms.fee()
    }

    pub fn remaining_balance(&self) -> Money {
        self.run.terminal_balance
    }

    pub fn total_paid(&self) -> Money {
        self.ledger.total_paid()
    }

    /// registered payments, in registration order
    pub fn payments(&self) -> &[Payment] {
        self.ledger.payments()
    }

    /// elapsed periods plus the one currently open
    pub fn current_installment_number(&self) -> usize {
        InstallmentScheduler::from_terms(&self.terms).current_installment_number(self.as_of)
    }

    /// register a payment and re-run the engine
    ///
    /// Returns the payment's allocation as of the loan's current as-of. The
    /// ledger is left untouched when the payment is rejected or the run fails.
    pub fn register_payment(&mut self, amount: Money, date: DateTime<Utc>) -> Result<PaymentAllocation> {
        if let Err(reason) = self.check_payment(amount, date) {
            warn!("loan {}: payment of {} on {} rejected: {}", self.id, amount, date, reason);
            self.events.emit(Event::PaymentRejected {
                loan_id: self.id,
                amount,
                date,
                reason: reason.clone(),
            });
            return Err(LoanError::PaymentRejected { reason });
        }

        let mut ledger = self.ledger.clone();
        let number = ledger.append(amount, date)?.number;

        let run = self.engine().run(ledger.payments(), self.as_of)?;
        let allocation = run.allocation_for(number).cloned().ok_or_else(|| {
            LoanError::SequenceInvariantViolation {
                payment_number: number,
                resolved_period: InstallmentScheduler::from_terms(&self.terms).period_index_for(date),
                current_period: run.installments.len(),
            }
        })?;

        self.ledger = ledger;

        self.events.emit(Event::PaymentRegistered {
            loan_id: self.id,
            payment_number: number,
            amount,
            applied_to_interest: allocation.interest_portion,
            applied_to_principal: allocation.principal_portion,
            balance_after: allocation.balance_after,
            timestamp: date,
        });
        info!(
            "loan {}: payment {} of {} registered, interest {} principal {}",
            self.id, number, amount, allocation.interest_portion, allocation.principal_portion
        );

        self.commit(run);

        if self.status == LoanStatus::Concluded {
            self.events.emit(Event::LoanConcluded {
                loan_id: self.id,
                final_payment: amount,
                timestamp: date,
            });
            info!("loan {} concluded", self.id);
        }

        Ok(allocation)
    }

    /// register a payment dated at the provider's current time
    pub fn register_payment_with_time(
        &mut self,
        amount: Money,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentAllocation> {
        self.refresh(time_provider)?;
        self.register_payment(amount, time_provider.now())
    }

    /// move as-of to the provider's current time
    pub fn refresh(&mut self, time_provider: &SafeTimeProvider) -> Result<LoanStatus> {
        self.advance_to(time_provider.now())
    }

    /// re-evaluate the loan as of another instant
    pub fn advance_to(&mut self, as_of: DateTime<Utc>) -> Result<LoanStatus> {
        let run = self.engine().run(self.ledger.payments(), as_of)?;
        self.as_of = as_of;
        self.commit(run);
        Ok(self.status)
    }

    /// installments as of the loan's current as-of
    pub fn current_schedule(&self) -> &[Installment] {
        &self.run.installments
    }

    pub fn current_run(&self) -> &EngineRun {
        &self.run
    }

    /// detailed periods at an arbitrary instant, without changing the loan
    pub fn schedule_at(&self, as_of: DateTime<Utc>) -> Result<EngineRun> {
        self.engine().run(self.ledger.payments(), as_of)
    }

    /// real allocations followed by a payment-free forecast to payoff
    pub fn projected_schedule(&self) -> Vec<ScheduleEntry> {
        let allocations: Vec<PaymentAllocation> = self.run.allocations().cloned().collect();
        project_schedule(&self.terms, &allocations, self.policy.settlement_tolerance)
    }

    /// the contractual table, ignoring payments
    pub fn full_amortization_schedule(&self) -> Vec<ScheduleEntry> {
        nominal_schedule(&self.terms)
    }

    /// rounded view for display
    pub fn view(&self) -> LoanView {
        LoanView::from_loan(self, Precision::Display(self.policy.display_decimal_places))
    }

    /// unrounded view for further computation
    pub fn precise_view(&self) -> LoanView {
        LoanView::from_loan(self, Precision::Exact)
    }

    /// get json representation of current state
    pub fn to_json_pretty(&self) -> String {
        to_json_pretty(&self.view())
    }

    /// short alias for json output
    pub fn json(&self) -> String {
        self.to_json_pretty()
    }

    fn engine(&self) -> AllocationEngine<'_> {
        AllocationEngine::new(&self.terms)
    }

    fn check_payment(&self, amount: Money, date: DateTime<Utc>) -> std::result::Result<(), RejectionReason> {
        if !amount.is_positive() {
            return Err(RejectionReason::NonPositiveAmount { amount });
        }

        if self.status == LoanStatus::Concluded {
            return Err(RejectionReason::LoanConcluded);
        }

        if date > self.as_of + self.policy.future_payment_leeway() {
            return Err(RejectionReason::FutureDated {
                date,
                as_of: self.as_of,
            });
        }

        Ok(())
    }

    fn commit(&mut self, run: EngineRun) {
        let status = StatusClassifier::new(self.policy.settlement_tolerance)
            .classify(&run.installments, run.terminal_balance);

        if status != self.status {
            self.events.emit(Event::StatusChanged {
                loan_id: self.id,
                old_status: self.status,
                new_status: status,
                as_of: run.as_of,
            });
            info!("loan {}: status {} -> {}", self.id, self.status, status);
            self.status = status;
        }

        self.record_capitalizations(&run);
        self.run = run;
    }

    fn record_capitalizations(&mut self, run: &EngineRun) {
        for capitalization in &run.capitalizations {
            if !self.reported_capitalizations.insert(capitalization.installment) {
                continue;
            }

            warn!(
                "loan {}: installment {} in mora, {} capitalized",
                self.id, capitalization.installment, capitalization.amount
            );
            self.events.emit(Event::InterestCapitalized {
                loan_id: self.id,
                installment: capitalization.installment,
                due_date: capitalization.due_date.date_naive(),
                amount: capitalization.amount,
                new_balance: capitalization.new_balance,
            });
        }
    }
}

/// builder for loans
#[derive(Debug, Default)]
pub struct LoanBuilder {
    capital: Option<Money>,
    rate: Option<Rate>,
    term_days: Option<u32>,
    installments: Option<u32>,
    origination_date: Option<DateTime<Utc>>,
    policy: LoanPolicy,
}

impl LoanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capital(mut self, capital: Money) -> Self {
        self.capital = Some(capital);
        self
    }

    /// nominal monthly rate
    pub fn rate(mut self, rate: Rate) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn term_days(mut self, days: u32) -> Self {
        self.term_days = Some(days);
        self
    }

    pub fn installments(mut self, count: u32) -> Self {
        self.installments = Some(count);
        self
    }

    pub fn origination_date(mut self, date: DateTime<Utc>) -> Self {
        self.origination_date = Some(date);
        self
    }

    pub fn policy(mut self, policy: LoanPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build evaluated at the provider's current time
    pub fn build_with_time(self, time_provider: &SafeTimeProvider) -> Result<Loan> {
        self.build_at(time_provider.now())
    }

    /// Build with system time
    pub fn build_now(self) -> Result<Loan> {
        let time = SafeTimeProvider::new(TimeSource::System);
        self.build_with_time(&time)
    }

    /// Build evaluated at an explicit instant; origination defaults to it
    pub fn build_at(self, as_of: DateTime<Utc>) -> Result<Loan> {
        let capital = self.capital.ok_or(LoanError::InvalidConfiguration {
            message: "Capital required".to_string(),
        })?;

        let rate = self.rate.ok_or(LoanError::InvalidConfiguration {
            message: "Rate required".to_string(),
        })?;

        let term_days = self.term_days.ok_or(LoanError::InvalidConfiguration {
            message: "Term required".to_string(),
        })?;

        let installments = self.installments.ok_or(LoanError::InvalidConfiguration {
            message: "Installment count required".to_string(),
        })?;

        let origination_date = self.origination_date.unwrap_or(as_of);

        let terms = LoanTerms::new(capital, rate, term_days, installments, origination_date)?;
        Loan::new(terms, self.policy, as_of)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn loan(time: &SafeTimeProvider) -> Loan {
        Loan::builder()
            .capital(Money::from_major(1_000))
            .rate(Rate::from_decimal(dec!(0.2)))
            .term_days(15)
            .installments(11)
            .build_with_time(time)
            .unwrap()
    }

    #[test]
    fn test_origination() {
        let time = SafeTimeProvider::new(TimeSource::Test(start()));
        let loan = loan(&time);

        assert_eq!(loan.status(), LoanStatus::PaymentPending);
        assert_eq!(loan.remaining_balance(), Money::from_major(1_000));
        assert_eq!(loan.terms().origination_date, start());
        assert!(matches!(loan.events.events()[0], Event::LoanOriginated { .. }));
    }

    #[test]
    fn test_invalid_term_fails_build() {
        let err = Loan::builder()
            .capital(Money::from_major(1_000))
            .rate(Rate::from_decimal(dec!(0.2)))
            .term_days(10)
            .installments(11)
            .build_at(start())
            .unwrap_err();

        assert_eq!(err, LoanError::InvalidTerm { term_days: 10 });
    }

    #[test]
    fn test_missing_capital_fails_build() {
        let err = Loan::builder()
            .rate(Rate::from_decimal(dec!(0.2)))
            .term_days(15)
            .installments(11)
            .build_at(start())
            .unwrap_err();

        assert!(matches!(err, LoanError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_status_goes_overdue_with_time() {
        let time = SafeTimeProvider::new(TimeSource::Test(start()));
        let control = time.test_control().unwrap();
        let mut loan = loan(&time);

        control.advance(Duration::days(14));
        assert_eq!(loan.refresh(&time).unwrap(), LoanStatus::PaymentPending);

        control.advance(Duration::days(1));
        assert_eq!(loan.refresh(&time).unwrap(), LoanStatus::PaymentOverdue);
        assert!(loan
            .events
            .events()
            .iter()
            .any(|e| matches!(e, Event::StatusChanged { new_status: LoanStatus::PaymentOverdue, .. })));
    }

    #[test]
    fn test_register_payment_settles_period() {
        let time = SafeTimeProvider::new(TimeSource::Test(start()));
        let control = time.test_control().unwrap();
        let mut loan = loan(&time);

        control.advance(Duration::days(5));
        let allocation = loan
            .register_payment_with_time(Money::from_major(200), &time)
            .unwrap();

        assert_eq!(allocation.interest_portion, Money::from_major(100));
        assert_eq!(allocation.principal_portion, Money::from_major(100));
        assert_eq!(loan.remaining_balance(), Money::from_major(900));
        assert_eq!(loan.status(), LoanStatus::PeriodSettled);
        assert_eq!(loan.payments().len(), 1);
    }

    #[test]
    fn test_future_payment_rejected_and_ledger_unchanged() {
        let time = SafeTimeProvider::new(TimeSource::Test(start()));
        let mut loan = loan(&time);

        let err = loan
            .register_payment(Money::from_major(100), start() + Duration::days(2))
            .unwrap_err();

        assert!(matches!(
            err,
            LoanError::PaymentRejected {
                reason: RejectionReason::FutureDated { .. }
            }
        ));
        assert!(loan.payments().is_empty());
        assert!(loan
            .events
            .events()
            .iter()
            .any(|e| matches!(e, Event::PaymentRejected { .. })));
    }

    #[test]
    fn test_payment_within_leeway_accepted() {
        let time = SafeTimeProvider::new(TimeSource::Test(start()));
        let mut loan = loan(&time);

        let allocation = loan
            .register_payment(Money::from_major(100), start() + Duration::days(1))
            .unwrap();
        assert_eq!(allocation.interest_portion, Money::from_major(100));
    }

    #[test]
    fn test_concluded_loan_rejects_payments() {
        let time = SafeTimeProvider::new(TimeSource::Test(start()));
        let mut loan = loan(&time);

        loan.register_payment(Money::from_major(1_100), start()).unwrap();
        assert_eq!(loan.status(), LoanStatus::Concluded);
        assert!(loan
            .events
            .events()
            .iter()
            .any(|e| matches!(e, Event::LoanConcluded { .. })));

        let err = loan.register_payment(Money::from_major(10), start()).unwrap_err();
        assert_eq!(
            err,
            LoanError::PaymentRejected {
                reason: RejectionReason::LoanConcluded
            }
        );
        assert_eq!(loan.payments().len(), 1);
    }

    #[test]
    fn test_capitalization_reported_once() {
        let time = SafeTimeProvider::new(TimeSource::Test(start()));
        let control = time.test_control().unwrap();
        let mut loan = loan(&time);

        control.advance(Duration::days(31));
        loan.refresh(&time).unwrap();
        control.advance(Duration::days(1));
        loan.refresh(&time).unwrap();

        let capitalized: Vec<_> = loan
            .events
            .events()
            .iter()
            .filter(|e| matches!(e, Event::InterestCapitalized { installment: 0, .. }))
            .collect();
        assert_eq!(capitalized.len(), 1);
    }

    #[test]
    fn test_schedule_at_does_not_move_loan() {
        let time = SafeTimeProvider::new(TimeSource::Test(start()));
        let loan = loan(&time);

        let later = loan.schedule_at(start() + Duration::days(50)).unwrap();
        assert_eq!(later.installments.len(), 4);
        assert_eq!(loan.current_schedule().len(), 1);
        assert_eq!(loan.as_of(), start());
    }

    #[test]
    fn test_json_view_is_rounded() {
        let time = SafeTimeProvider::new(TimeSource::Test(start()));
        let mut loan = Loan::builder()
            .capital(Money::from_major(1_000))
            .rate(Rate::from_decimal(dec!(0.2)))
            .term_days(15)
            .installments(3)
            .build_with_time(&time)
            .unwrap();
        loan.register_payment(Money::from_str_exact("333.333").unwrap(), start())
            .unwrap();

        let view = loan.view();
        assert_eq!(view.installments[0].payments[0].amount, Money::from_str_exact("333.33").unwrap());
        assert_eq!(
            loan.precise_view().installments[0].payments[0].amount,
            Money::from_str_exact("333.333").unwrap()
        );
        assert_eq!(view.total_paid, Money::from_str_exact("333.33").unwrap());
        assert_eq!(view.total_capitalized, Money::ZERO);
        assert!(loan.json().contains("\"status\": \"periodo_saldado\""));
    }
}
