use chrono::{DateTime, Duration, TimeZone, Utc};
use installment_loan_rs::{AllocationEngine, InstallmentStatus, LoanTerms, Money, Payment, Rate};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn origination() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn terms(term_days: u32, rate_bps: u32) -> LoanTerms {
    LoanTerms::new(
        Money::from_major(1_000),
        Rate::from_bps(rate_bps),
        term_days,
        11,
        origination(),
    )
    .unwrap()
}

fn payments(raw: &[(i64, i64)]) -> Vec<Payment> {
    raw.iter()
        .enumerate()
        .map(|(number, &(amount, day))| Payment {
            number,
            amount: Money::from_major(amount),
            date: origination() + Duration::days(day),
        })
        .collect()
}

fn term_strategy() -> impl Strategy<Value = u32> {
    prop_oneof![Just(15u32), Just(30u32)]
}

proptest! {
    #[test]
    fn runs_are_idempotent(
        term_days in term_strategy(),
        rate_bps in 0u32..3_000,
        raw in prop::collection::vec((1i64..2_000, 0i64..120), 0..8),
        extra_days in 0i64..60,
    ) {
        let t = terms(term_days, rate_bps);
        let p = payments(&raw);
        let engine = AllocationEngine::new(&t);
        let as_of = origination() + Duration::days(120 + extra_days);

        let first = engine.run(&p, as_of).unwrap();
        let second = engine.run(&p, as_of).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn balance_never_negative_and_allocations_add_up(
        term_days in term_strategy(),
        rate_bps in 0u32..3_000,
        raw in prop::collection::vec((1i64..2_000, 0i64..120), 0..8),
    ) {
        let t = terms(term_days, rate_bps);
        let run = AllocationEngine::new(&t)
            .run(&payments(&raw), origination() + Duration::days(120))
            .unwrap();

        for allocation in run.allocations() {
            prop_assert!(!allocation.balance_after.is_negative());
            prop_assert_eq!(
                allocation.interest_portion + allocation.principal_portion + allocation.excess,
                allocation.gross_amount
            );
        }
        prop_assert!(!run.terminal_balance.is_negative());
    }

    #[test]
    fn balance_moves_only_by_principal_and_capitalization(
        term_days in term_strategy(),
        rate_bps in 0u32..3_000,
        raw in prop::collection::vec((1i64..2_000, 0i64..120), 0..8),
    ) {
        let t = terms(term_days, rate_bps);
        let run = AllocationEngine::new(&t)
            .run(&payments(&raw), origination() + Duration::days(120))
            .unwrap();

        let principal: Money = run.allocations().map(|a| a.principal_portion).sum();
        prop_assert_eq!(
            run.terminal_balance,
            t.capital + run.total_capitalized() - principal
        );

        // every capitalization belongs to a period now in mora, once
        let mora = run
            .installments
            .iter()
            .filter(|i| i.status == InstallmentStatus::Mora)
            .count();
        prop_assert_eq!(mora, run.capitalizations.len());
    }

    #[test]
    fn zero_rate_fee_is_straight_division(installments in 1u32..60) {
        let t = LoanTerms::new(
            Money::from_major(1_000),
            Rate::ZERO,
            30,
            installments,
            origination(),
        )
        .unwrap();

        let expected = Money::from_major(1_000) / Decimal::from(installments);
        prop_assert_eq!(t.fee().round_display(2), expected.round_display(2));
    }
}
