use deal_analyzer_core::deal::{bulk_units, DealInput, LoanTerms, OperatingExpenses, RentUnit};
use deal_analyzer_core::sensitivity::{
    apply_adjustments, preview, rent_price_grid, Adjustments, GridSpec, Knob,
};
use proptest::prelude::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn base_deal() -> DealInput {
    DealInput {
        property_type: Default::default(),
        purchase_price: dec!(3200000),
        number_of_units: 16,
        rent_roll: bulk_units(
            &RentUnit {
                monthly_rent: dec!(2100),
                ..RentUnit::standard(1)
            },
            16,
            1,
        ),
        vacancy_rate: dec!(6),
        operating_expenses: OperatingExpenses {
            property_tax: dec!(48000),
            insurance: dec!(14000),
            utilities: dec!(9000),
            maintenance: dec!(16000),
            property_management: dec!(19000),
            other: dec!(4000),
            total: Decimal::ZERO,
        }
        .with_recomputed_total(),
        capex_budget: dec!(120000),
        loan_terms: LoanTerms {
            ltv: dec!(70),
            interest_rate: dec!(6.25),
            ..LoanTerms::default()
        },
        exit_assumptions: Default::default(),
    }
}

/// Any value inside a knob's slider range, in hundredths.
fn knob_value(knob: Knob) -> impl Strategy<Value = Decimal> {
    let (lo, hi) = knob.bounds();
    let lo = (lo * dec!(100)).to_i64().unwrap();
    let hi = (hi * dec!(100)).to_i64().unwrap();
    (lo..=hi).prop_map(|v| Decimal::new(v, 2))
}

#[test]
fn test_zero_adjustments_deep_equal() {
    let base = base_deal();
    let adj = Adjustments::default();
    assert!(adj.is_zero());
    assert_eq!(apply_adjustments(&base, &adj).unwrap(), base);
}

#[test]
fn test_preview_leaves_base_metrics_for_zero() {
    let out = preview(&base_deal(), &Adjustments::default()).unwrap();
    assert_eq!(out.adjusted_input, base_deal());
    assert_eq!(out.changes.cap_rate, Decimal::ZERO);
}

#[test]
fn test_grid_default_is_five_by_five() {
    let out = rent_price_grid(&base_deal(), &GridSpec::default()).unwrap();
    assert_eq!(out.result.matrix.len(), 5);
    assert_eq!(out.result.base_case_position, (2, 2));
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(128))]

    #[test]
    fn prop_vacancy_clamp_stays_in_band(
        base_vacancy_bp in 0i64..10_000,
        adj in knob_value(Knob::VacancyRate),
        rent in knob_value(Knob::MonthlyRent),
    ) {
        let mut base = base_deal();
        base.vacancy_rate = Decimal::new(base_vacancy_bp, 2);
        let adjustments = Adjustments::default()
            .set(Knob::VacancyRate, adj)
            .set(Knob::MonthlyRent, rent);
        prop_assume!(!adjustments.is_zero());

        let out = apply_adjustments(&base, &adjustments).unwrap();
        prop_assert!(out.vacancy_rate >= Decimal::ZERO);
        prop_assert!(out.vacancy_rate <= dec!(50));
    }

    #[test]
    fn prop_rate_clamps_hold(
        rate_adj in knob_value(Knob::InterestRate),
        cap_adj in knob_value(Knob::ExitCapRate),
        base_rate_bp in 0i64..2_000,
        base_cap_bp in 100i64..1_500,
    ) {
        let mut base = base_deal();
        base.loan_terms.interest_rate = Decimal::new(base_rate_bp, 2);
        base.exit_assumptions.exit_cap_rate = Decimal::new(base_cap_bp, 2);
        let adjustments = Adjustments {
            interest_rate: rate_adj,
            exit_cap_rate: cap_adj,
            ..Adjustments::default()
        };
        prop_assume!(!adjustments.is_zero());

        let out = apply_adjustments(&base, &adjustments).unwrap();
        prop_assert!(out.loan_terms.interest_rate >= dec!(1));
        prop_assert!(out.loan_terms.interest_rate <= dec!(15));
        prop_assert!(out.exit_assumptions.exit_cap_rate >= dec!(3));
        prop_assert!(out.exit_assumptions.exit_cap_rate <= dec!(12));
    }

    #[test]
    fn prop_expense_total_tracks_lines(pct in knob_value(Knob::OperatingExpenses)) {
        let adjustments = Adjustments::default().set(Knob::OperatingExpenses, pct);
        let out = apply_adjustments(&base_deal(), &adjustments).unwrap();
        prop_assert_eq!(
            out.operating_expenses.total,
            out.operating_expenses.computed_total()
        );
    }
}
