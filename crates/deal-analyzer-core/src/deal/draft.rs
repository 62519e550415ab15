//! Wizard input aggregation.
//!
//! Each wizard step produces a [`DealDraft`] fragment holding only the keys
//! that step edits. Fragments are folded into an accumulator with
//! [`DealDraft::merge`]; on submission [`DealDraft::finalize`] fills whatever
//! is still missing with documented defaults and validates the result.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::model::{DealInput, ExitAssumptions, LoanTerms, OperatingExpenses, PropertyType, RentUnit};
use crate::error::DealAnalyzerError;
use crate::types::{Money, Percent};
use crate::DealResult;

/// Vacancy assumed when the rent-roll step never set one.
pub const DEFAULT_VACANCY_RATE: Decimal = dec!(5);

/// Partial deal record accumulated across wizard steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<PropertyType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_units: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent_roll: Option<Vec<RentUnit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vacancy_rate: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_expenses: Option<OperatingExpenses>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capex_budget: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_terms: Option<LoanTerms>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_assumptions: Option<ExitAssumptions>,
}

impl DealDraft {
    /// Shallow merge: every key present in `fragment` replaces the accumulated one.
    pub fn merge(self, fragment: DealDraft) -> DealDraft {
        DealDraft {
            property_type: fragment.property_type.or(self.property_type),
            purchase_price: fragment.purchase_price.or(self.purchase_price),
            number_of_units: fragment.number_of_units.or(self.number_of_units),
            rent_roll: fragment.rent_roll.or(self.rent_roll),
            vacancy_rate: fragment.vacancy_rate.or(self.vacancy_rate),
            operating_expenses: fragment.operating_expenses.or(self.operating_expenses),
            capex_budget: fragment.capex_budget.or(self.capex_budget),
            loan_terms: fragment.loan_terms.or(self.loan_terms),
            exit_assumptions: fragment.exit_assumptions.or(self.exit_assumptions),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == DealDraft::default()
    }

    /// Only the property-details step gates navigation; later steps default.
    pub fn is_step_valid(&self, step: WizardStep) -> bool {
        match step {
            WizardStep::PropertyDetails => self.missing_required_field().is_none(),
            WizardStep::RentRoll | WizardStep::ExpensesFinancing | WizardStep::ExitStrategy => true,
        }
    }

    /// First property-details field that is absent or non-positive.
    pub fn missing_required_field(&self) -> Option<&'static str> {
        if self.property_type.is_none() {
            return Some("propertyType");
        }
        if !self.purchase_price.is_some_and(|p| p > Decimal::ZERO) {
            return Some("purchasePrice");
        }
        if !self.number_of_units.is_some_and(|n| n > 0) {
            return Some("numberOfUnits");
        }
        None
    }

    /// Fill every missing key with its default and validate the complete record.
    pub fn finalize(self) -> DealResult<DealInput> {
        if let Some(field) = self.missing_required_field() {
            return Err(DealAnalyzerError::invalid(
                field,
                "Property details must be completed before submission",
            ));
        }

        let input = DealInput {
            property_type: self.property_type.unwrap_or_default(),
            purchase_price: self.purchase_price.unwrap_or_default(),
            number_of_units: self.number_of_units.unwrap_or_default(),
            rent_roll: self.rent_roll.unwrap_or_default(),
            vacancy_rate: self.vacancy_rate.unwrap_or(DEFAULT_VACANCY_RATE),
            operating_expenses: self
                .operating_expenses
                .unwrap_or_default()
                .with_recomputed_total(),
            capex_budget: self.capex_budget.unwrap_or(Decimal::ZERO),
            loan_terms: self.loan_terms.unwrap_or_default(),
            exit_assumptions: self.exit_assumptions.unwrap_or_default(),
        };
        input.validate()?;
        debug!(
            property_type = %input.property_type,
            units = input.rent_roll.len(),
            "deal draft finalized"
        );
        Ok(input)
    }
}

impl From<DealInput> for DealDraft {
    fn from(input: DealInput) -> Self {
        DealDraft {
            property_type: Some(input.property_type),
            purchase_price: Some(input.purchase_price),
            number_of_units: Some(input.number_of_units),
            rent_roll: Some(input.rent_roll),
            vacancy_rate: Some(input.vacancy_rate),
            operating_expenses: Some(input.operating_expenses),
            capex_budget: Some(input.capex_budget),
            loan_terms: Some(input.loan_terms),
            exit_assumptions: Some(input.exit_assumptions),
        }
    }
}

// ---------------------------------------------------------------------------
// Wizard
// ---------------------------------------------------------------------------

/// The four input steps, in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStep {
    #[default]
    PropertyDetails,
    RentRoll,
    ExpensesFinancing,
    ExitStrategy,
}

impl WizardStep {
    pub const ALL: [WizardStep; 4] = [
        WizardStep::PropertyDetails,
        WizardStep::RentRoll,
        WizardStep::ExpensesFinancing,
        WizardStep::ExitStrategy,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn title(self) -> &'static str {
        match self {
            WizardStep::PropertyDetails => "Property Details",
            WizardStep::RentRoll => "Rent Roll",
            WizardStep::ExpensesFinancing => "Expenses & Financing",
            WizardStep::ExitStrategy => "Exit Strategy",
        }
    }

    pub fn next(self) -> Option<WizardStep> {
        WizardStep::ALL.get(self.index() + 1).copied()
    }

    pub fn previous(self) -> Option<WizardStep> {
        self.index()
            .checked_sub(1)
            .and_then(|i| WizardStep::ALL.get(i).copied())
    }
}

/// Events the wizard reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardEvent {
    /// A step emitted new field values
    StepData(DealDraft),
    Next,
    Back,
    Reset,
}

/// Immutable wizard state; transitions go through [`Wizard::apply`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wizard {
    step: WizardStep,
    draft: DealDraft,
}

impl Wizard {
    pub fn new() -> Self {
        Wizard::default()
    }

    /// Resume from a persisted draft at the first step.
    pub fn resume(draft: DealDraft) -> Self {
        Wizard {
            step: WizardStep::PropertyDetails,
            draft,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &DealDraft {
        &self.draft
    }

    pub fn into_draft(self) -> DealDraft {
        self.draft
    }

    pub fn can_advance(&self) -> bool {
        self.draft.is_step_valid(self.step) && self.step.next().is_some()
    }

    /// Pure reducer. A blocked `Next` leaves the state unchanged.
    pub fn apply(self, event: WizardEvent) -> Wizard {
        match event {
            WizardEvent::StepData(fragment) => Wizard {
                step: self.step,
                draft: self.draft.merge(fragment),
            },
            WizardEvent::Next => {
                if !self.draft.is_step_valid(self.step) {
                    return self;
                }
                match self.step.next() {
                    Some(step) => Wizard { step, ..self },
                    None => self,
                }
            }
            WizardEvent::Back => match self.step.previous() {
                Some(step) => Wizard { step, ..self },
                None => self,
            },
            WizardEvent::Reset => Wizard::new(),
        }
    }

    /// Walk forward until `target`, stopping early when a step blocks.
    pub fn advance_to(self, target: WizardStep) -> Wizard {
        let mut wizard = self;
        while wizard.step < target {
            let before = wizard.step;
            wizard = wizard.apply(WizardEvent::Next);
            if wizard.step == before {
                break;
            }
        }
        wizard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn property_details() -> DealDraft {
        DealDraft {
            property_type: Some(PropertyType::Office),
            purchase_price: Some(dec!(2500000)),
            number_of_units: Some(12),
            ..DealDraft::default()
        }
    }

    #[test]
    fn test_merge_later_fragment_wins() {
        let first = DealDraft {
            vacancy_rate: Some(dec!(4)),
            capex_budget: Some(dec!(10000)),
            ..DealDraft::default()
        };
        let second = DealDraft {
            vacancy_rate: Some(dec!(7)),
            ..DealDraft::default()
        };
        let merged = first.merge(second);
        assert_eq!(merged.vacancy_rate, Some(dec!(7)));
        assert_eq!(merged.capex_budget, Some(dec!(10000)));
    }

    #[test]
    fn test_merge_replaces_whole_nested_record() {
        let first = DealDraft {
            loan_terms: Some(LoanTerms {
                ltv: dec!(65),
                ..LoanTerms::default()
            }),
            ..DealDraft::default()
        };
        let second = DealDraft {
            loan_terms: Some(LoanTerms {
                interest_rate: dec!(7),
                ..LoanTerms::default()
            }),
            ..DealDraft::default()
        };
        let merged = first.merge(second);
        let loan = merged.loan_terms.unwrap();
        // shallow merge: the earlier LTV is not carried into the new record
        assert_eq!(loan.ltv, dec!(75));
        assert_eq!(loan.interest_rate, dec!(7));
    }

    #[test]
    fn test_step_zero_gate() {
        assert!(!DealDraft::default().is_step_valid(WizardStep::PropertyDetails));
        assert!(property_details().is_step_valid(WizardStep::PropertyDetails));

        let zero_price = DealDraft {
            purchase_price: Some(Decimal::ZERO),
            ..property_details()
        };
        assert!(!zero_price.is_step_valid(WizardStep::PropertyDetails));

        for step in [
            WizardStep::RentRoll,
            WizardStep::ExpensesFinancing,
            WizardStep::ExitStrategy,
        ] {
            assert!(DealDraft::default().is_step_valid(step));
        }
    }

    #[test]
    fn test_finalize_fills_defaults() {
        let input = property_details().finalize().unwrap();
        assert_eq!(input.vacancy_rate, dec!(5));
        assert_eq!(input.loan_terms.ltv, dec!(75));
        assert_eq!(input.loan_terms.interest_rate, dec!(5.5));
        assert_eq!(input.loan_terms.amortization_period, 30);
        assert_eq!(input.exit_assumptions.hold_period, dec!(5));
        assert_eq!(input.exit_assumptions.exit_cap_rate, dec!(6.5));
        assert_eq!(input.capex_budget, Decimal::ZERO);
        assert!(input.rent_roll.is_empty());
    }

    #[test]
    fn test_finalize_recomputes_expense_total() {
        let draft = property_details().merge(DealDraft {
            operating_expenses: Some(OperatingExpenses {
                property_tax: dec!(9000),
                insurance: dec!(1000),
                total: dec!(1),
                ..OperatingExpenses::default()
            }),
            ..DealDraft::default()
        });
        let input = draft.finalize().unwrap();
        assert_eq!(input.operating_expenses.total, dec!(10000));
    }

    #[test]
    fn test_finalize_names_missing_field() {
        let draft = DealDraft {
            property_type: Some(PropertyType::Retail),
            purchase_price: Some(dec!(900000)),
            ..DealDraft::default()
        };
        match draft.finalize() {
            Err(DealAnalyzerError::InvalidInput { field, .. }) => {
                assert_eq!(field, "numberOfUnits");
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_wizard_next_blocked_until_details_complete() {
        let wizard = Wizard::new().apply(WizardEvent::Next);
        assert_eq!(wizard.step(), WizardStep::PropertyDetails);

        let wizard = wizard
            .apply(WizardEvent::StepData(property_details()))
            .apply(WizardEvent::Next);
        assert_eq!(wizard.step(), WizardStep::RentRoll);
    }

    #[test]
    fn test_wizard_back_and_reset() {
        let wizard = Wizard::resume(property_details()).advance_to(WizardStep::ExitStrategy);
        assert_eq!(wizard.step(), WizardStep::ExitStrategy);
        assert!(!wizard.can_advance());

        let wizard = wizard.apply(WizardEvent::Back);
        assert_eq!(wizard.step(), WizardStep::ExpensesFinancing);

        let wizard = wizard.apply(WizardEvent::Reset);
        assert_eq!(wizard, Wizard::new());
    }

    #[test]
    fn test_advance_to_stops_at_gate() {
        let wizard = Wizard::new().advance_to(WizardStep::ExitStrategy);
        assert_eq!(wizard.step(), WizardStep::PropertyDetails);
    }

    #[test]
    fn test_step_navigation() {
        assert_eq!(WizardStep::PropertyDetails.previous(), None);
        assert_eq!(WizardStep::RentRoll.next(), Some(WizardStep::ExpensesFinancing));
        assert_eq!(WizardStep::ExitStrategy.next(), None);
        assert_eq!(WizardStep::ExpensesFinancing.title(), "Expenses & Financing");
    }
}
