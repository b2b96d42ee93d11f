use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::payments::amortization::calculate_fee;
use crate::types::TermLength;

/// immutable contract parameters of an installment loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTerms")]
pub struct LoanTerms {
    pub capital: Money,
    /// rate as declared on the contract, per month
    pub nominal_rate: Rate,
    #[serde(rename = "term_days")]
    pub term: TermLength,
    /// nominal number of periods; only feeds the fee formula
    pub installment_count: u32,
    pub origination_date: DateTime<Utc>,
}

impl LoanTerms {
    pub fn new(
        capital: Money,
        nominal_rate: Rate,
        term_days: u32,
        installment_count: u32,
        origination_date: DateTime<Utc>,
    ) -> Result<Self> {
        let terms = Self {
            capital,
            nominal_rate,
            term: TermLength::from_days(term_days)?,
            installment_count,
            origination_date,
        };
        terms.validate()?;
        Ok(terms)
    }

    /// parse terms from a json document and validate them
    ///
    /// ```json
    /// {"capital": "1000", "rate": "0.2", "term_days": 15,
    ///  "installments": 11, "origination_date": "2024-01-01T00:00:00Z"}
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: TermsDocument =
            serde_json::from_str(json).map_err(|e| LoanError::InvalidConfiguration {
                message: format!("malformed loan terms: {}", e),
            })?;

        Self::new(
            doc.capital,
            doc.rate,
            doc.term_days,
            doc.installments,
            doc.origination_date,
        )
    }

    pub fn validate(&self) -> Result<()> {
        if !self.capital.is_positive() {
            return Err(LoanError::InvalidConfiguration {
                message: format!("capital must be positive, got {}", self.capital),
            });
        }

        if self.installment_count == 0 {
            return Err(LoanError::InvalidConfiguration {
                message: "installment count must be at least 1".to_string(),
            });
        }

        if self.nominal_rate.is_negative() {
            return Err(LoanError::InvalidConfiguration {
                message: format!("rate must not be negative, got {}", self.nominal_rate),
            });
        }

        Ok(())
    }

    pub fn term_days(&self) -> u32 {
        self.term.days()
    }

    /// rate charged per elapsed period
    pub fn effective_rate(&self) -> Rate {
        match self.term {
            TermLength::Monthly => self.nominal_rate,
            TermLength::Fortnightly => self.nominal_rate.halved(),
        }
    }

    /// nominal fixed installment amount
    pub fn fee(&self) -> Money {
        calculate_fee(self.capital, self.effective_rate(), self.installment_count)
    }
}

/// serialized shape of `LoanTerms`, validated on the way in
#[derive(Debug, Deserialize)]
struct RawTerms {
    capital: Money,
    nominal_rate: Rate,
    #[serde(rename = "term_days")]
    term: TermLength,
    installment_count: u32,
    origination_date: DateTime<Utc>,
}

impl TryFrom<RawTerms> for LoanTerms {
    type Error = LoanError;

    fn try_from(raw: RawTerms) -> Result<Self> {
        let terms = Self {
            capital: raw.capital,
            nominal_rate: raw.nominal_rate,
            term: raw.term,
            installment_count: raw.installment_count,
            origination_date: raw.origination_date,
        };
        terms.validate()?;
        Ok(terms)
    }
}

#[derive(Debug, Deserialize)]
struct TermsDocument {
    capital: Money,
    rate: Rate,
    term_days: u32,
    installments: u32,
    origination_date: DateTime<Utc>,
}

/// engine tolerances and registration rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanPolicy {
    /// balances below this count as paid off
    pub settlement_tolerance: Money,
    /// how far past as-of a payment may be dated
    pub future_payment_leeway_days: i64,
    pub display_decimal_places: u32,
}

impl LoanPolicy {
    pub fn future_payment_leeway(&self) -> Duration {
        Duration::days(self.future_payment_leeway_days)
    }
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self {
            settlement_tolerance: Money::CENT,
            future_payment_leeway_days: 1,
            display_decimal_places: 2,
        }
    }
}
