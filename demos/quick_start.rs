/// quick start - minimal example to get started
use installment_loan_rs::{Loan, Money, Rate};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 15,000 at 10% a month, paid fortnightly over 5 periods
    let mut loan = Loan::builder()
        .capital(Money::from_major(15_000))
        .rate(Rate::from_decimal(dec!(0.1)))
        .term_days(15)
        .installments(5)
        .build_now()?;

    println!("fee: {}", loan.fee().round_display(2));

    // pay today
    loan.register_payment(Money::from_major(4_000), loan.as_of())?;

    // print current state
    println!("{}", loan.json());

    Ok(())
}
