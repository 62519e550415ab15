use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use crate::deal::DealInput;
use crate::error::DealAnalyzerError;
use crate::metrics::{compute_quick_metrics, grade_quick_metrics, PreviewGrades, QuickMetrics};
use crate::types::{with_metadata, ComputationOutput, Percent};
use crate::DealResult;

/// Vacancy after adjustment stays within this band, in percent.
pub const VACANCY_BOUNDS: (Decimal, Decimal) = (dec!(0), dec!(50));
/// Interest rate after adjustment, in percent.
pub const INTEREST_RATE_BOUNDS: (Decimal, Decimal) = (dec!(1), dec!(15));
/// Exit cap rate after adjustment, in percent.
pub const EXIT_CAP_RATE_BOUNDS: (Decimal, Decimal) = (dec!(3), dec!(12));

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Slider perturbations applied on top of a base deal.
///
/// Price, rent and expense knobs are percent changes; vacancy, interest and
/// exit cap knobs are additive percentage points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Adjustments {
    #[serde(default)]
    pub purchase_price: Percent,
    #[serde(default)]
    pub monthly_rent: Percent,
    #[serde(default)]
    pub vacancy_rate: Percent,
    #[serde(default)]
    pub operating_expenses: Percent,
    #[serde(default)]
    pub interest_rate: Percent,
    #[serde(default)]
    pub exit_cap_rate: Percent,
}

/// One slider of the sensitivity panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Knob {
    PurchasePrice,
    MonthlyRent,
    VacancyRate,
    OperatingExpenses,
    InterestRate,
    ExitCapRate,
}

impl Knob {
    pub const ALL: [Knob; 6] = [
        Knob::PurchasePrice,
        Knob::MonthlyRent,
        Knob::VacancyRate,
        Knob::OperatingExpenses,
        Knob::InterestRate,
        Knob::ExitCapRate,
    ];

    /// Inclusive slider range.
    pub fn bounds(self) -> (Decimal, Decimal) {
        match self {
            Knob::PurchasePrice => (dec!(-20), dec!(20)),
            Knob::MonthlyRent => (dec!(-15), dec!(25)),
            Knob::VacancyRate => (dec!(-5), dec!(15)),
            Knob::OperatingExpenses => (dec!(-20), dec!(30)),
            Knob::InterestRate => (dec!(-2), dec!(3)),
            Knob::ExitCapRate => (dec!(-1.5), dec!(2)),
        }
    }
}

impl fmt::Display for Knob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Knob::PurchasePrice => "purchasePrice",
            Knob::MonthlyRent => "monthlyRent",
            Knob::VacancyRate => "vacancyRate",
            Knob::OperatingExpenses => "operatingExpenses",
            Knob::InterestRate => "interestRate",
            Knob::ExitCapRate => "exitCapRate",
        };
        f.write_str(label)
    }
}

impl Adjustments {
    pub fn get(&self, knob: Knob) -> Percent {
        match knob {
            Knob::PurchasePrice => self.purchase_price,
            Knob::MonthlyRent => self.monthly_rent,
            Knob::VacancyRate => self.vacancy_rate,
            Knob::OperatingExpenses => self.operating_expenses,
            Knob::InterestRate => self.interest_rate,
            Knob::ExitCapRate => self.exit_cap_rate,
        }
    }

    pub fn set(mut self, knob: Knob, value: Percent) -> Self {
        let slot = match knob {
            Knob::PurchasePrice => &mut self.purchase_price,
            Knob::MonthlyRent => &mut self.monthly_rent,
            Knob::VacancyRate => &mut self.vacancy_rate,
            Knob::OperatingExpenses => &mut self.operating_expenses,
            Knob::InterestRate => &mut self.interest_rate,
            Knob::ExitCapRate => &mut self.exit_cap_rate,
        };
        *slot = value;
        self
    }

    pub fn is_zero(&self) -> bool {
        Knob::ALL.iter().all(|k| self.get(*k).is_zero())
    }

    /// Return every knob to zero.
    pub fn reset(&mut self) {
        *self = Adjustments::default();
    }

    /// Reject values outside the slider ranges.
    pub fn validate(&self) -> DealResult<()> {
        for knob in Knob::ALL {
            let (lo, hi) = knob.bounds();
            let value = self.get(knob);
            if value < lo || value > hi {
                return Err(DealAnalyzerError::invalid(
                    format!("adjustments.{knob}"),
                    format!("Adjustment {value} outside slider range [{lo}, {hi}]"),
                ));
            }
        }
        Ok(())
    }
}

/// Adjusted deal plus its preview metrics and grades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityPreview {
    pub adjusted_input: DealInput,
    pub metrics: QuickMetrics,
    pub grades: PreviewGrades,
    /// Change of each graded metric against the unadjusted deal, in points
    pub changes: PreviewChanges,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewChanges {
    pub cap_rate: Percent,
    pub cash_on_cash: Percent,
    pub irr: Percent,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Apply `adj` to a copy of `base`. The base is never mutated.
///
/// All-zero adjustments return an exact copy, even when base values sit
/// outside the clamp bands.
pub fn apply_adjustments(base: &DealInput, adj: &Adjustments) -> DealResult<DealInput> {
    adj.validate()?;
    if adj.is_zero() {
        return Ok(base.clone());
    }

    let mut out = base.clone();

    out.purchase_price = base.purchase_price * pct_factor(adj.purchase_price);

    let rent_factor = pct_factor(adj.monthly_rent);
    for unit in &mut out.rent_roll {
        unit.monthly_rent *= rent_factor;
    }

    out.vacancy_rate = clamp(base.vacancy_rate + adj.vacancy_rate, VACANCY_BOUNDS);

    out.operating_expenses = base
        .operating_expenses
        .scaled(pct_factor(adj.operating_expenses));

    out.loan_terms.interest_rate = clamp(
        base.loan_terms.interest_rate + adj.interest_rate,
        INTEREST_RATE_BOUNDS,
    );

    out.exit_assumptions.exit_cap_rate = clamp(
        base.exit_assumptions.exit_cap_rate + adj.exit_cap_rate,
        EXIT_CAP_RATE_BOUNDS,
    );

    Ok(out)
}

/// Adjust, recompute and grade.
pub fn preview(base: &DealInput, adj: &Adjustments) -> DealResult<SensitivityPreview> {
    let base_metrics = compute_quick_metrics(base)?;
    let adjusted_input = apply_adjustments(base, adj)?;
    let metrics = compute_quick_metrics(&adjusted_input)?;
    let grades = grade_quick_metrics(&metrics);

    let changes = PreviewChanges {
        cap_rate: metrics.going_in_cap_rate - base_metrics.going_in_cap_rate,
        cash_on_cash: metrics.cash_on_cash_return - base_metrics.cash_on_cash_return,
        irr: metrics.preview_irr - base_metrics.preview_irr,
    };

    Ok(SensitivityPreview {
        adjusted_input,
        metrics,
        grades,
        changes,
    })
}

/// `preview` wrapped with clamp warnings and metadata.
pub fn calculate_preview(
    base: &DealInput,
    adj: &Adjustments,
) -> DealResult<ComputationOutput<SensitivityPreview>> {
    let start = Instant::now();
    let out = preview(base, adj)?;

    let mut warnings = Vec::new();
    if !adj.is_zero() {
        note_clamp(
            &mut warnings,
            "Vacancy rate",
            base.vacancy_rate + adj.vacancy_rate,
            out.adjusted_input.vacancy_rate,
        );
        note_clamp(
            &mut warnings,
            "Interest rate",
            base.loan_terms.interest_rate + adj.interest_rate,
            out.adjusted_input.loan_terms.interest_rate,
        );
        note_clamp(
            &mut warnings,
            "Exit cap rate",
            base.exit_assumptions.exit_cap_rate + adj.exit_cap_rate,
            out.adjusted_input.exit_assumptions.exit_cap_rate,
        );
    }
    warnings.push("IRR shown is cash-on-cash + 2 pts, not a solved IRR".into());

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Sensitivity Preview (Adjusted Quick Metrics)",
        adj,
        warnings,
        elapsed,
        out,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn pct_factor(change: Percent) -> Decimal {
    Decimal::ONE + change / dec!(100)
}

fn clamp(value: Decimal, (lo, hi): (Decimal, Decimal)) -> Decimal {
    value.max(lo).min(hi)
}

fn note_clamp(warnings: &mut Vec<String>, label: &str, requested: Decimal, applied: Decimal) {
    if requested != applied {
        warnings.push(format!(
            "{label} of {requested}% clamped to {applied}%"
        ));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deal::{LoanTerms, OperatingExpenses, RentUnit};
    use crate::metrics::Grade;
    use pretty_assertions::assert_eq;

    fn base_input() -> DealInput {
        DealInput {
            property_type: Default::default(),
            purchase_price: dec!(2000000),
            number_of_units: 2,
            rent_roll: vec![
                RentUnit {
                    monthly_rent: dec!(10000),
                    ..RentUnit::standard(1)
                },
                RentUnit {
                    monthly_rent: dec!(10000),
                    ..RentUnit::standard(2)
                },
            ],
            vacancy_rate: dec!(5),
            operating_expenses: OperatingExpenses {
                property_tax: dec!(30000),
                insurance: dec!(10000),
                ..OperatingExpenses::default()
            }
            .with_recomputed_total(),
            capex_budget: Decimal::ZERO,
            loan_terms: LoanTerms {
                ltv: dec!(65),
                interest_rate: dec!(5),
                ..LoanTerms::default()
            },
            exit_assumptions: Default::default(),
        }
    }

    #[test]
    fn test_zero_adjustments_round_trip() {
        let base = base_input();
        let adjusted = apply_adjustments(&base, &Adjustments::default()).unwrap();
        assert_eq!(adjusted, base);
    }

    #[test]
    fn test_zero_adjustments_keep_out_of_band_vacancy() {
        let mut base = base_input();
        base.vacancy_rate = dec!(60);
        let adjusted = apply_adjustments(&base, &Adjustments::default()).unwrap();
        assert_eq!(adjusted.vacancy_rate, dec!(60));
    }

    #[test]
    fn test_percent_knobs_scale() {
        let adj = Adjustments::default()
            .set(Knob::PurchasePrice, dec!(10))
            .set(Knob::MonthlyRent, dec!(-10))
            .set(Knob::OperatingExpenses, dec!(20));
        let out = apply_adjustments(&base_input(), &adj).unwrap();

        assert_eq!(out.purchase_price, dec!(2200000));
        assert!(out.rent_roll.iter().all(|u| u.monthly_rent == dec!(9000)));
        assert_eq!(out.operating_expenses.property_tax, dec!(36000));
        assert_eq!(out.operating_expenses.total, dec!(48000));
    }

    #[test]
    fn test_point_knobs_clamp() {
        let mut base = base_input();
        base.vacancy_rate = dec!(45);
        base.loan_terms.interest_rate = dec!(1.5);
        base.exit_assumptions.exit_cap_rate = dec!(11);
        let adj = Adjustments {
            vacancy_rate: dec!(10),
            interest_rate: dec!(-2),
            exit_cap_rate: dec!(2),
            ..Adjustments::default()
        };
        let out = apply_adjustments(&base, &adj).unwrap();
        assert_eq!(out.vacancy_rate, dec!(50));
        assert_eq!(out.loan_terms.interest_rate, dec!(1));
        assert_eq!(out.exit_assumptions.exit_cap_rate, dec!(12));
    }

    #[test]
    fn test_out_of_range_adjustment_rejected() {
        let adj = Adjustments::default().set(Knob::InterestRate, dec!(5));
        match apply_adjustments(&base_input(), &adj) {
            Err(DealAnalyzerError::InvalidInput { field, .. }) => {
                assert_eq!(field, "adjustments.interestRate");
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_base_not_mutated() {
        let base = base_input();
        let snapshot = base.clone();
        let adj = Adjustments::default().set(Knob::MonthlyRent, dec!(25));
        let _ = preview(&base, &adj).unwrap();
        assert_eq!(base, snapshot);
    }

    #[test]
    fn test_preview_rent_increase_improves_metrics() {
        let adj = Adjustments::default().set(Knob::MonthlyRent, dec!(20));
        let out = preview(&base_input(), &adj).unwrap();
        assert!(out.changes.cap_rate > Decimal::ZERO);
        assert!(out.changes.cash_on_cash > Decimal::ZERO);
        assert_eq!(out.changes.irr, out.changes.cash_on_cash);
    }

    #[test]
    fn test_preview_grades_match_metrics() {
        let out = preview(&base_input(), &Adjustments::default()).unwrap();
        // NOI 188,000 on 2,000,000 => 9.4% cap rate
        assert_eq!(out.metrics.going_in_cap_rate, dec!(9.4));
        assert_eq!(out.grades.cap_rate, Grade::APlus);
    }

    #[test]
    fn test_reset() {
        let mut adj = Adjustments::default().set(Knob::ExitCapRate, dec!(1));
        assert!(!adj.is_zero());
        adj.reset();
        assert!(adj.is_zero());
    }

    #[test]
    fn test_clamp_warning_reported() {
        let mut base = base_input();
        base.vacancy_rate = dec!(48);
        let adj = Adjustments::default().set(Knob::VacancyRate, dec!(5));
        let out = calculate_preview(&base, &adj).unwrap();
        assert!(out.warnings.iter().any(|w| w.starts_with("Vacancy rate")));
    }
}
