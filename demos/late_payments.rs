/// late payments - missed periods, mora and capitalization with controlled time
use chrono::{Duration, TimeZone, Utc};
use installment_loan_rs::{Event, Loan, Money, Rate, SafeTimeProvider, TimeSource};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== late payments example ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();

    let mut loan = Loan::builder()
        .capital(Money::from_major(1_000))
        .rate(Rate::from_decimal(dec!(0.2)))
        .term_days(15)
        .installments(11)
        .build_with_time(&time)?;

    println!("originated on {}, fee {}", time.now().format("%Y-%m-%d"), loan.fee().round_display(2));
    println!("status: {}", loan.status());

    // skip two periods
    controller.advance(Duration::days(31));
    println!("\nadvanced to {}: {}", time.now().format("%Y-%m-%d"), loan.refresh(&time)?);

    let allocation = loan.register_payment_with_time(Money::from_major(300), &time)?;
    println!(
        "paid 300: interest {} (of which {} arrears), principal {}, balance {}",
        allocation.interest_portion.round_display(2),
        allocation.carried_interest_portion.round_display(2),
        allocation.principal_portion.round_display(2),
        allocation.balance_after.round_display(2),
    );

    println!("\ninstallments:");
    for installment in loan.current_schedule() {
        println!(
            "  #{} due {} {:<12} interest {}",
            installment.number,
            installment.due_date.format("%Y-%m-%d"),
            installment.status.to_string(),
            installment.interest_due.round_display(2),
        );
    }

    println!("\nevents:");
    for event in loan.events.events() {
        if let Event::InterestCapitalized { installment, amount, .. } = event {
            println!("  installment {} capitalized {}", installment, amount.round_display(2));
        }
    }

    println!("\nprojected payoff:");
    for row in loan.projected_schedule() {
        let row = row.rounded(2);
        println!(
            "  {} {} {} (balance {}){}",
            row.number,
            row.date.format("%Y-%m-%d"),
            row.amount,
            row.balance_after,
            if row.projected { " *" } else { "" },
        );
    }

    Ok(())
}
