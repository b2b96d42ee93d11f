pub mod config;
pub mod decimal;
pub mod engine;
pub mod errors;
pub mod events;
pub mod installment;
pub mod loan;
pub mod payments;
pub mod schedule;
pub mod serialization;
pub mod status;
pub mod types;

// re-export key types
pub use config::{LoanPolicy, LoanTerms};
pub use decimal::{Money, Rate};
pub use engine::{AllocationEngine, Capitalization, EngineRun};
pub use errors::{LoanError, Result};
pub use events::{Event, EventStore};
pub use installment::Installment;
pub use loan::{Loan, LoanBuilder};
pub use payments::{Payment, PaymentAllocation, PaymentLedger, ScheduleEntry};
pub use schedule::InstallmentScheduler;
pub use serialization::{AllocationView, InstallmentView, LoanView, Precision, ScheduleEntryView};
pub use status::StatusClassifier;
pub use types::{InstallmentStatus, LoanId, LoanStatus, RejectionReason, TermLength};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
