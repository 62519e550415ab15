use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DealAnalyzerError;
use crate::types::{Money, Percent, Years};
use crate::DealResult;

/// Longest amortization schedule accepted, in years.
pub const MAX_AMORTIZATION_YEARS: u32 = 50;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Asset class of the property under analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyType {
    #[default]
    Multifamily,
    Office,
    Retail,
    MixedUse,
    Industrial,
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PropertyType::Multifamily => "multifamily",
            PropertyType::Office => "office",
            PropertyType::Retail => "retail",
            PropertyType::MixedUse => "mixed-use",
            PropertyType::Industrial => "industrial",
        };
        f.write_str(label)
    }
}

/// One line of the rent roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentUnit {
    pub unit_number: String,
    pub unit_type: String,
    pub bedrooms: u32,
    pub bathrooms: Decimal,
    pub square_footage: Decimal,
    /// Contract rent per month
    pub monthly_rent: Money,
    /// Vacant units contribute no rent revenue
    pub occupied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_end_date: Option<NaiveDate>,
}

impl RentUnit {
    /// A blank occupied one-bed unit, numbered the way the rent-roll step numbers new rows.
    pub fn standard(number: usize) -> Self {
        RentUnit {
            unit_number: format!("Unit {number}"),
            unit_type: "Standard".into(),
            bedrooms: 1,
            bathrooms: Decimal::ONE,
            square_footage: Decimal::ZERO,
            monthly_rent: Decimal::ZERO,
            occupied: true,
            lease_end_date: None,
        }
    }

    pub fn annual_rent(&self) -> Money {
        self.monthly_rent * dec!(12)
    }
}

/// Clone `template` `count` times, numbering units from `start` onwards.
pub fn bulk_units(template: &RentUnit, count: usize, start: usize) -> Vec<RentUnit> {
    (0..count)
        .map(|i| RentUnit {
            unit_number: format!("Unit {}", start + i),
            ..template.clone()
        })
        .collect()
}

/// The six operating-expense line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpenseLine {
    PropertyTax,
    Insurance,
    Utilities,
    Maintenance,
    PropertyManagement,
    Other,
}

impl ExpenseLine {
    pub const ALL: [ExpenseLine; 6] = [
        ExpenseLine::PropertyTax,
        ExpenseLine::Insurance,
        ExpenseLine::Utilities,
        ExpenseLine::Maintenance,
        ExpenseLine::PropertyManagement,
        ExpenseLine::Other,
    ];
}

/// Annual operating expenses. `total` is derived from the line items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingExpenses {
    #[serde(default)]
    pub property_tax: Money,
    #[serde(default)]
    pub insurance: Money,
    #[serde(default)]
    pub utilities: Money,
    #[serde(default)]
    pub maintenance: Money,
    #[serde(default)]
    pub property_management: Money,
    #[serde(default)]
    pub other: Money,
    #[serde(default)]
    pub total: Money,
}

impl OperatingExpenses {
    pub fn line(&self, line: ExpenseLine) -> Money {
        match line {
            ExpenseLine::PropertyTax => self.property_tax,
            ExpenseLine::Insurance => self.insurance,
            ExpenseLine::Utilities => self.utilities,
            ExpenseLine::Maintenance => self.maintenance,
            ExpenseLine::PropertyManagement => self.property_management,
            ExpenseLine::Other => self.other,
        }
    }

    fn line_mut(&mut self, line: ExpenseLine) -> &mut Money {
        match line {
            ExpenseLine::PropertyTax => &mut self.property_tax,
            ExpenseLine::Insurance => &mut self.insurance,
            ExpenseLine::Utilities => &mut self.utilities,
            ExpenseLine::Maintenance => &mut self.maintenance,
            ExpenseLine::PropertyManagement => &mut self.property_management,
            ExpenseLine::Other => &mut self.other,
        }
    }

    /// Sum of the six line items. Ignores whatever is stored in `total`.
    pub fn computed_total(&self) -> Money {
        ExpenseLine::ALL
            .iter()
            .fold(Decimal::ZERO, |acc, line| acc + self.line(*line))
    }

    /// Set one line item and recompute the total.
    pub fn with_line(mut self, line: ExpenseLine, value: Money) -> Self {
        *self.line_mut(line) = value;
        self.with_recomputed_total()
    }

    pub fn with_recomputed_total(mut self) -> Self {
        self.total = self.computed_total();
        self
    }

    /// Multiply every line item by `factor` and recompute the total.
    pub fn scaled(&self, factor: Decimal) -> Self {
        let mut out = self.clone();
        for line in ExpenseLine::ALL {
            *out.line_mut(line) *= factor;
        }
        out.with_recomputed_total()
    }
}

/// Acquisition financing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanTerms {
    /// Explicit loan amount; zero means "derive from LTV"
    #[serde(default)]
    pub loan_amount: Money,
    /// Loan-to-value in percent (0-100)
    pub ltv: Percent,
    /// Annual interest rate in percent (0-20)
    pub interest_rate: Percent,
    /// Amortization period in years
    pub amortization_period: u32,
    /// Informational; the calculators always derive the payment
    #[serde(default)]
    pub monthly_payment: Money,
    #[serde(default)]
    pub is_interest_only: bool,
    #[serde(default)]
    pub interest_only_months: u32,
}

impl Default for LoanTerms {
    fn default() -> Self {
        LoanTerms {
            loan_amount: Decimal::ZERO,
            ltv: dec!(75),
            interest_rate: dec!(5.5),
            amortization_period: 30,
            monthly_payment: Decimal::ZERO,
            is_interest_only: false,
            interest_only_months: 0,
        }
    }
}

/// Hold and disposition assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitAssumptions {
    pub hold_period: Years,
    pub exit_cap_rate: Percent,
    pub annual_appreciation: Percent,
    pub market_cap_rate: Percent,
}

impl Default for ExitAssumptions {
    fn default() -> Self {
        ExitAssumptions {
            hold_period: dec!(5),
            exit_cap_rate: dec!(6.5),
            annual_appreciation: dec!(3.0),
            market_cap_rate: dec!(6.0),
        }
    }
}

/// Complete, defaulted deal record. This is the body posted to the analysis backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealInput {
    pub property_type: PropertyType,
    pub purchase_price: Money,
    pub number_of_units: u32,
    pub rent_roll: Vec<RentUnit>,
    /// Vacancy and collection loss in percent (0-100)
    pub vacancy_rate: Percent,
    pub operating_expenses: OperatingExpenses,
    pub capex_budget: Money,
    pub loan_terms: LoanTerms,
    pub exit_assumptions: ExitAssumptions,
}

impl DealInput {
    /// Loan principal: the explicit amount when supplied, otherwise price × LTV.
    pub fn loan_amount(&self) -> Money {
        if self.loan_terms.loan_amount > Decimal::ZERO {
            self.loan_terms.loan_amount
        } else {
            self.purchase_price * self.loan_terms.ltv / dec!(100)
        }
    }

    /// Gross potential rent of occupied units, annualised.
    pub fn occupied_annual_rent(&self) -> Money {
        self.rent_roll
            .iter()
            .filter(|u| u.occupied)
            .map(RentUnit::annual_rent)
            .sum()
    }

    /// Gross potential rent of every unit, occupied or not, annualised.
    pub fn potential_annual_rent(&self) -> Money {
        self.rent_roll.iter().map(RentUnit::annual_rent).sum()
    }

    /// Range checks shared by every calculator.
    pub fn validate(&self) -> DealResult<()> {
        if self.purchase_price <= Decimal::ZERO {
            return Err(DealAnalyzerError::invalid(
                "purchasePrice",
                "Purchase price must be positive",
            ));
        }
        if self.number_of_units < 1 {
            return Err(DealAnalyzerError::invalid(
                "numberOfUnits",
                "A deal needs at least one unit",
            ));
        }
        if self.vacancy_rate < Decimal::ZERO || self.vacancy_rate > dec!(100) {
            return Err(DealAnalyzerError::invalid(
                "vacancyRate",
                "Vacancy rate must be between 0 and 100",
            ));
        }
        for unit in &self.rent_roll {
            if unit.monthly_rent < Decimal::ZERO
                || unit.square_footage < Decimal::ZERO
                || unit.bathrooms < Decimal::ZERO
            {
                return Err(DealAnalyzerError::invalid(
                    format!("rentRoll[{}]", unit.unit_number),
                    "Rent, square footage and bathrooms must be non-negative",
                ));
            }
        }
        for line in ExpenseLine::ALL {
            if self.operating_expenses.line(line) < Decimal::ZERO {
                return Err(DealAnalyzerError::invalid(
                    format!("operatingExpenses.{line:?}"),
                    "Expense line items must be non-negative",
                ));
            }
        }
        if self.capex_budget < Decimal::ZERO {
            return Err(DealAnalyzerError::invalid(
                "capexBudget",
                "CapEx budget must be non-negative",
            ));
        }
        self.validate_loan()?;

        if self.exit_assumptions.hold_period < Decimal::ONE {
            return Err(DealAnalyzerError::invalid(
                "exitAssumptions.holdPeriod",
                "Hold period must be at least 1 year",
            ));
        }
        Ok(())
    }

    fn validate_loan(&self) -> DealResult<()> {
        let loan = &self.loan_terms;
        // 100% LTV leaves no equity to measure cash-on-cash against
        if loan.ltv < Decimal::ZERO || loan.ltv >= dec!(100) {
            return Err(DealAnalyzerError::invalid(
                "loanTerms.ltv",
                "LTV must be at least 0 and below 100",
            ));
        }
        if loan.interest_rate < Decimal::ZERO || loan.interest_rate > dec!(20) {
            return Err(DealAnalyzerError::invalid(
                "loanTerms.interestRate",
                "Interest rate must be between 0 and 20",
            ));
        }
        if loan.amortization_period < 1 || loan.amortization_period > MAX_AMORTIZATION_YEARS {
            return Err(DealAnalyzerError::invalid(
                "loanTerms.amortizationPeriod",
                format!("Amortization period must be between 1 and {MAX_AMORTIZATION_YEARS} years"),
            ));
        }
        if loan.loan_amount < Decimal::ZERO {
            return Err(DealAnalyzerError::invalid(
                "loanTerms.loanAmount",
                "Loan amount must be non-negative",
            ));
        }
        if self.loan_amount() >= self.purchase_price {
            return Err(DealAnalyzerError::invalid(
                "loanTerms.loanAmount",
                "Loan must be smaller than the purchase price",
            ));
        }
        Ok(())
    }
}
