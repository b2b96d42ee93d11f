use chrono::{DateTime, Utc};

use crate::config::LoanTerms;
use crate::types::TermLength;

/// derives installment due dates from the origination date and term length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallmentScheduler {
    origination: DateTime<Utc>,
    term: TermLength,
}

impl InstallmentScheduler {
    pub fn new(origination: DateTime<Utc>, term: TermLength) -> Self {
        Self { origination, term }
    }

    pub fn from_terms(terms: &LoanTerms) -> Self {
        Self::new(terms.origination_date, terms.term)
    }

    /// whole periods between origination and `as_of`
    pub fn installments_elapsed(&self, as_of: DateTime<Utc>) -> usize {
        if as_of <= self.origination {
            return 0;
        }
        let days = (as_of - self.origination).num_days();
        (days / self.term.days() as i64) as usize
    }

    /// elapsed periods plus the one currently open
    pub fn current_installment_number(&self, as_of: DateTime<Utc>) -> usize {
        self.installments_elapsed(as_of) + 1
    }

    /// due date of the 0-based installment `number`
    pub fn due_date(&self, number: usize) -> DateTime<Utc> {
        self.origination + self.term.duration() * (number as i32 + 1)
    }

    /// restartable sequence of the first `count` due dates
    pub fn due_dates(&self, count: usize) -> DueDates {
        DueDates {
            scheduler: *self,
            next: 0,
            count,
        }
    }

    /// index of the period a date falls in: the first due date on or after it
    pub fn period_index_for(&self, date: DateTime<Utc>) -> usize {
        let mut index = self.installments_elapsed(date).saturating_sub(1);
        while self.due_date(index) < date {
            index += 1;
        }
        index
    }

    /// due date of the period a date falls in
    pub fn due_date_for(&self, date: DateTime<Utc>) -> DateTime<Utc> {
        self.due_date(self.period_index_for(date))
    }
}

/// iterator over installment due dates
#[derive(Debug, Clone)]
pub struct DueDates {
    scheduler: InstallmentScheduler,
    next: usize,
    count: usize,
}

impl Iterator for DueDates {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let date = self.scheduler.due_date(self.next);
        self.next += 1;
        Some(date)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DueDates {}
