use homecalc_core::loan::{amortization, payment};
use homecalc_core::CalcError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// Running values keep 28 significant digits, so sums can differ in the last place
const EPS: Decimal = dec!(0.000001);

// ===========================================================================
// Level payment
// ===========================================================================

#[test]
fn test_zero_rate_payment_is_exact_division() {
    for (principal, term) in [
        (dec!(500_000), 36),
        (dec!(1_000_000), 7),
        (dec!(123_456.78), 240),
        (dec!(1), 3),
    ] {
        let pmt = payment::calculate_loan_payment(principal, Decimal::ZERO, term).unwrap();
        assert_eq!(pmt, principal / Decimal::from(term));
    }
}

#[test]
fn test_reference_loan_payment() {
    // 1,000,000 at 15% over 60 months
    let pmt = payment::calculate_loan_payment(dec!(1_000_000), dec!(15), 60).unwrap();
    assert!((pmt - dec!(23_789.93)).abs() < dec!(1), "got {pmt}");
}

#[test]
fn test_payment_rises_with_rate() {
    let mut previous = Decimal::ZERO;
    for rate in [dec!(0), dec!(5), dec!(10), dec!(15), dec!(25), dec!(40)] {
        let pmt = payment::calculate_loan_payment(dec!(2_000_000), rate, 120).unwrap();
        assert!(pmt > previous, "payment at {rate}% did not rise");
        previous = pmt;
    }
}

#[test]
fn test_invalid_loan_terms() {
    let cases = [
        (dec!(0), dec!(10), 12, "principal"),
        (dec!(-5), dec!(10), 12, "principal"),
        (dec!(1000), dec!(-1), 12, "annual_interest_rate_pct"),
        (dec!(1000), dec!(10), 0, "term_months"),
    ];
    for (principal, rate, term, expected_field) in cases {
        match payment::calculate_loan_payment(principal, rate, term) {
            Err(CalcError::InvalidInput { field, .. }) => assert_eq!(field, expected_field),
            other => panic!("expected InvalidInput for {expected_field}, got {other:?}"),
        }
    }
}

// ===========================================================================
// Amortization schedule
// ===========================================================================

#[test]
fn test_reference_loan_schedule() {
    let r = amortization::generate_amortization_schedule(dec!(1_000_000), dec!(15), 60, dec!(0))
        .unwrap();
    assert_eq!(r.actual_term_months, 60);
    assert_eq!(r.schedule.len(), 60);
    assert!((r.base_payment - dec!(23_789.93)).abs() < dec!(1));
    // Exact formula value; sits just outside the commonly quoted 427,340
    assert!((r.total_interest - dec!(427_395.81)).abs() < dec!(1), "got {}", r.total_interest);
    assert_eq!(r.months_saved, 0);
    assert_eq!(r.interest_saved, Decimal::ZERO);
}

#[test]
fn test_zero_rate_schedule_has_no_interest() {
    let r = amortization::generate_amortization_schedule(dec!(500_000), dec!(0), 36, dec!(0))
        .unwrap();
    assert_eq!(r.base_payment, dec!(500_000) / dec!(36));
    assert_eq!(r.total_interest, Decimal::ZERO);
    assert_eq!(r.schedule.last().unwrap().balance, Decimal::ZERO);
}

#[test]
fn test_one_month_term_retires_principal() {
    let r = amortization::generate_amortization_schedule(dec!(80_000), dec!(12), 1, dec!(0))
        .unwrap();
    assert_eq!(r.schedule.len(), 1);
    let only = &r.schedule[0];
    assert_eq!(only.interest, dec!(80_000) * dec!(0.01));
    assert_eq!(only.principal, dec!(80_000));
    assert_eq!(only.balance, Decimal::ZERO);
    assert_eq!(only.payment, dec!(80_800));
}

#[test]
fn test_principal_parts_sum_to_principal() {
    let loans = [
        (dec!(1_000_000), dec!(15), 60),
        (dec!(250_000), dec!(12.5), 240),
        (dec!(7_500_000), dec!(13.25), 300),
        (dec!(40_000), dec!(0), 18),
        (dec!(99_999.99), dec!(36), 11),
    ];
    for (principal, rate, term) in loans {
        let r = amortization::generate_amortization_schedule(principal, rate, term, dec!(0))
            .unwrap();
        let repaid: Decimal = r.schedule.iter().map(|p| p.principal).sum();
        assert!((repaid - principal).abs() < EPS, "loan {principal} at {rate}% over {term}");
        assert_eq!(r.schedule.last().unwrap().balance, Decimal::ZERO);
    }
}

#[test]
fn test_totals_reconcile() {
    for extra in [dec!(0), dec!(1_500), dec!(20_000)] {
        let r = amortization::generate_amortization_schedule(
            dec!(3_200_000),
            dec!(14),
            180,
            extra,
        )
        .unwrap();
        assert!((r.total_payment - (r.total_interest + r.principal)).abs() < EPS);
        let paid: Decimal = r.schedule.iter().map(|p| p.payment).sum();
        assert!((paid - r.total_payment).abs() < EPS);
        let last = r.schedule.last().unwrap();
        assert!((last.cumulative_principal - r.principal).abs() < EPS);
        assert_eq!(last.cumulative_interest, r.total_interest);
    }
}

#[test]
fn test_each_period_splits_payment() {
    let r = amortization::generate_amortization_schedule(dec!(600_000), dec!(18), 48, dec!(2_000))
        .unwrap();
    let mut previous_balance = r.principal;
    for period in &r.schedule {
        assert_eq!(period.principal + period.interest, period.payment);
        assert!(period.balance < previous_balance, "month {}", period.month);
        assert!(period.balance >= Decimal::ZERO);
        previous_balance = period.balance;
    }
}

#[test]
fn test_extra_payment_never_lengthens_or_costs_more() {
    let mut previous: Option<(u32, Decimal)> = None;
    let mut extra = Decimal::ZERO;
    while extra <= dec!(1_000_000) {
        let r = amortization::generate_amortization_schedule(dec!(1_000_000), dec!(15), 60, extra)
            .unwrap();
        if let Some((months, interest)) = previous {
            assert!(r.actual_term_months <= months, "term rose at extra {extra}");
            assert!(r.total_interest <= interest, "interest rose at extra {extra}");
        }
        previous = Some((r.actual_term_months, r.total_interest));
        extra += dec!(2_500);
    }
}

#[test]
fn test_extra_payment_savings_reported() {
    let base = amortization::generate_amortization_schedule(dec!(1_000_000), dec!(15), 60, dec!(0))
        .unwrap();
    let r = amortization::generate_amortization_schedule(dec!(1_000_000), dec!(15), 60, dec!(5_000))
        .unwrap();
    assert_eq!(r.actual_term_months, 46);
    assert_eq!(r.months_saved, 14);
    assert!((r.interest_saved - (base.total_interest - r.total_interest)).abs() < EPS);
    assert_eq!(r.effective_payment, r.base_payment + dec!(5_000));
}

#[test]
fn test_amortize_is_idempotent() {
    let input = payment::LoanParameters {
        principal: dec!(2_750_000),
        annual_interest_rate_pct: dec!(13.9),
        term_months: 144,
        extra_monthly_payment: dec!(3_000),
    };
    let first = amortization::amortize(&input).unwrap();
    let second = amortization::amortize(&input).unwrap();
    assert_eq!(first.result, second.result);
    assert_eq!(first.warnings, second.warnings);
}

#[test]
fn test_loan_summary_matches_schedule() {
    let input = payment::LoanParameters {
        principal: dec!(1_000_000),
        annual_interest_rate_pct: dec!(15),
        term_months: 60,
        extra_monthly_payment: dec!(0),
    };
    let summary = payment::summarize_loan(&input).unwrap().result;
    assert_eq!(summary.total_payment, summary.monthly_payment * dec!(60));
    assert_eq!(summary.total_interest, summary.total_payment - summary.principal);
    assert_eq!(summary.schedule.len(), 60);
}

#[test]
fn test_rounded_schedule_for_display() {
    let r = amortization::generate_amortization_schedule(dec!(1_000_000), dec!(15), 60, dec!(0))
        .unwrap()
        .rounded(2);
    assert_eq!(r.base_payment.scale(), 2);
    assert!(r.schedule.iter().all(|p| p.balance.scale() <= 2));
    assert_eq!(r.schedule.last().unwrap().balance, Decimal::ZERO);
}

#[test]
fn test_parameters_from_json() {
    let input: payment::LoanParameters = serde_json::from_str(
        r#"{"principal": "1000000", "annual_interest_rate_pct": "15", "term_months": 60}"#,
    )
    .unwrap();
    assert_eq!(input.extra_monthly_payment, Decimal::ZERO);
    let out = amortization::amortize(&input).unwrap();
    assert_eq!(out.result.actual_term_months, 60);
}
