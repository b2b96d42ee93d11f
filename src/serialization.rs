/// serialization support for loans
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::installment::Installment;
use crate::loan::Loan;
use crate::payments::{PaymentAllocation, ScheduleEntry};
use crate::types::{InstallmentStatus, LoanId, LoanStatus};

/// how monetary fields are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// rounded half away from zero to the given decimal places
    Display(u32),
    /// full working precision, for further computation
    Exact,
}

impl Precision {
    fn apply(&self, amount: Money) -> Money {
        match self {
            Precision::Display(dp) => amount.round_display(*dp),
            Precision::Exact => amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationView {
    pub number: usize,
    pub date: NaiveDate,
    pub amount: Money,
    pub interest_paid: Money,
    pub carried_interest: Money,
    pub principal_paid: Money,
    pub excess: Money,
    pub remaining_balance: Money,
}

impl AllocationView {
    pub fn from_allocation(allocation: &PaymentAllocation, precision: Precision) -> Self {
        Self {
            number: allocation.number,
            date: allocation.date.date_naive(),
            amount: precision.apply(allocation.gross_amount),
            interest_paid: precision.apply(allocation.interest_portion),
            carried_interest: precision.apply(allocation.carried_interest_portion),
            principal_paid: precision.apply(allocation.principal_portion),
            excess: precision.apply(allocation.excess),
            remaining_balance: precision.apply(allocation.balance_after),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentView {
    pub number: usize,
    pub due_date: NaiveDate,
    pub status: InstallmentStatus,
    pub interest: Money,
    pub interest_covered: Money,
    pub principal_covered: Money,
    pub remaining_balance: Money,
    pub payments: Vec<AllocationView>,
}

impl InstallmentView {
    pub fn from_installment(installment: &Installment, precision: Precision) -> Self {
        Self {
            number: installment.number,
            due_date: installment.due_date.date_naive(),
            status: installment.status,
            interest: precision.apply(installment.interest_due),
            interest_covered: precision.apply(installment.interest_covered),
            principal_covered: precision.apply(installment.principal_covered),
            remaining_balance: precision.apply(installment.balance_after),
            payments: installment
                .allocations
                .iter()
                .map(|a| AllocationView::from_allocation(a, precision))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntryView {
    pub number: usize,
    pub date: NaiveDate,
    pub amount: Money,
    pub interest_paid: Money,
    pub principal_paid: Money,
    pub remaining_balance: Money,
    pub projected: bool,
}

impl ScheduleEntryView {
    pub fn from_entry(entry: &ScheduleEntry, precision: Precision) -> Self {
        Self {
            number: entry.number,
            date: entry.date.date_naive(),
            amount: precision.apply(entry.amount),
            interest_paid: precision.apply(entry.interest_portion),
            principal_paid: precision.apply(entry.principal_portion),
            remaining_balance: precision.apply(entry.balance_after),
            projected: entry.projected,
        }
    }
}

/// serializable view of a loan's current state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanView {
    pub id: LoanId,
    pub origination_date: NaiveDate,
    pub as_of: NaiveDate,
    pub fee: Money,
    pub remaining_balance: Money,
    pub total_paid: Money,
    pub total_interest_paid: Money,
    pub total_capitalized: Money,
    pub status: LoanStatus,
    pub installments: Vec<InstallmentView>,
}

impl LoanView {
    pub fn from_loan(loan: &Loan, precision: Precision) -> Self {
        Self {
            id: loan.id,
            origination_date: loan.terms().origination_date.date_naive(),
            as_of: loan.as_of().date_naive(),
            fee: precision.apply(loan.fee()),
            remaining_balance: precision.apply(loan.remaining_balance()),
            total_paid: precision.apply(loan.total_paid()),
            total_interest_paid: precision.apply(loan.current_run().total_interest_paid()),
            total_capitalized: precision.apply(loan.current_run().total_capitalized()),
            status: loan.status(),
            installments: loan
                .current_schedule()
                .iter()
                .map(|i| InstallmentView::from_installment(i, precision))
                .collect(),
        }
    }
}

/// render any view as pretty json
pub fn to_json_pretty<T: Serialize>(view: &T) -> String {
    serde_json::to_string_pretty(view).unwrap_or_else(|e| format!("JSON error: {}", e))
}
