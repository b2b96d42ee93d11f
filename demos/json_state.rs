/// json state - terms loaded from json, views rounded and precise
use chrono::{Duration, TimeZone, Utc};
use installment_loan_rs::serialization::{to_json_pretty, Precision, ScheduleEntryView};
use installment_loan_rs::{Loan, LoanPolicy, LoanTerms, Money};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== json state serialization ===\n");

    let terms = LoanTerms::from_json(
        r#"{
            "capital": "1000",
            "rate": "0.2",
            "term_days": 15,
            "installments": 2,
            "origination_date": "2024-01-01T00:00:00Z"
        }"#,
    )?;
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    let mut loan = Loan::new(terms, LoanPolicy::default(), start)?;
    loan.register_payment(Money::from_major(200), start)?;

    println!("rounded view");
    println!("------------");
    println!("{}\n", loan.json());

    println!("precise view");
    println!("------------");
    println!("{}\n", to_json_pretty(&loan.precise_view()));

    let projected: Vec<ScheduleEntryView> = loan
        .projected_schedule()
        .iter()
        .map(|e| ScheduleEntryView::from_entry(e, Precision::Display(2)))
        .collect();
    println!("projected schedule");
    println!("------------------");
    println!("{}\n", to_json_pretty(&projected));

    // what the loan looks like a month on with nothing else paid
    let later = loan.schedule_at(start + Duration::days(31))?;
    println!("installments a month on: {}", later.installments.len());

    Ok(())
}
