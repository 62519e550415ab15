use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::deal::DealInput;
use crate::error::DealAnalyzerError;
use crate::time_value;
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::DealResult;

/// Points added to cash-on-cash to produce the preview IRR estimate.
pub const PREVIEW_IRR_OFFSET: Decimal = dec!(2);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Year-one metrics recomputed on every input change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickMetrics {
    /// Occupied units' monthly rent × 12
    pub total_annual_rent: Money,
    /// Annual rent less the vacancy allowance
    pub effective_gross_income: Money,
    /// Sum of the operating-expense line items
    pub total_expenses: Money,
    pub noi: Money,
    /// NOI / purchase price, in percent
    pub going_in_cap_rate: Percent,
    pub loan_amount: Money,
    pub monthly_payment: Money,
    pub annual_debt_service: Money,
    pub annual_cash_flow: Money,
    pub down_payment: Money,
    /// Annual cash flow / down payment, in percent
    pub cash_on_cash_return: Percent,
    /// NOI / annual debt service; zero when the deal carries no debt
    pub dscr: Decimal,
    /// Cash-on-cash plus a fixed offset. An instant-feedback estimate only,
    /// never the multi-period IRR the full analysis solves for.
    pub preview_irr: Percent,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute preview metrics and wrap them with warnings and metadata.
pub fn calculate_quick_metrics(
    input: &DealInput,
) -> DealResult<ComputationOutput<QuickMetrics>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let metrics = compute_quick_metrics(input)?;
    collect_warnings(input, &metrics, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Quick Deal Metrics (Year-One Preview)",
        input,
        warnings,
        elapsed,
        metrics,
    ))
}

/// Bare calculation used by the sensitivity paths.
pub fn compute_quick_metrics(input: &DealInput) -> DealResult<QuickMetrics> {
    input.validate()?;

    let total_annual_rent = input.occupied_annual_rent();
    let effective_gross_income =
        total_annual_rent * (Decimal::ONE - input.vacancy_rate / dec!(100));
    let total_expenses = input.operating_expenses.computed_total();
    let noi = effective_gross_income - total_expenses;

    let going_in_cap_rate = noi / input.purchase_price * dec!(100);

    let loan_amount = input.loan_amount();
    let monthly_payment = amortizing_monthly_payment(
        loan_amount,
        input.loan_terms.interest_rate,
        input.loan_terms.amortization_period,
    )?;
    let annual_debt_service = monthly_payment * dec!(12);
    let annual_cash_flow = noi - annual_debt_service;

    let down_payment = input.purchase_price - loan_amount;
    if down_payment <= Decimal::ZERO {
        return Err(DealAnalyzerError::DivisionByZero {
            context: "cash-on-cash return (no equity invested)".into(),
        });
    }
    let cash_on_cash_return = annual_cash_flow / down_payment * dec!(100);

    let dscr = if annual_debt_service.is_zero() {
        Decimal::ZERO
    } else {
        noi / annual_debt_service
    };

    Ok(QuickMetrics {
        total_annual_rent,
        effective_gross_income,
        total_expenses,
        noi,
        going_in_cap_rate,
        loan_amount,
        monthly_payment,
        annual_debt_service,
        annual_cash_flow,
        down_payment,
        cash_on_cash_return,
        dscr,
        preview_irr: cash_on_cash_return + PREVIEW_IRR_OFFSET,
    })
}

/// Monthly payment for a fully amortising loan quoted as an annual percent.
pub fn amortizing_monthly_payment(
    principal: Money,
    annual_rate_pct: Percent,
    amortization_years: u32,
) -> DealResult<Money> {
    if principal.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let monthly_rate = annual_rate_pct / dec!(100) / dec!(12);
    let months = amortization_years.checked_mul(12).ok_or_else(|| {
        DealAnalyzerError::invalid("loanTerms.amortizationPeriod", "Amortization period is too long")
    })?;
    time_value::amortizing_payment(principal, monthly_rate, months)
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

fn collect_warnings(input: &DealInput, metrics: &QuickMetrics, warnings: &mut Vec<String>) {
    if metrics.annual_debt_service.is_zero() {
        warnings.push("No debt service: DSCR reported as 0".into());
    } else if metrics.dscr < dec!(1.2) {
        warnings.push(format!(
            "DSCR of {:.2} is below 1.20x: lender covenant risk",
            metrics.dscr
        ));
    }

    if input.loan_terms.ltv > dec!(80) {
        warnings.push(format!(
            "LTV of {:.1}% exceeds 80%: high leverage",
            input.loan_terms.ltv
        ));
    }

    if input.vacancy_rate > dec!(15) {
        warnings.push(format!(
            "Vacancy rate {:.1}% exceeds 15%: above typical market norms",
            input.vacancy_rate
        ));
    }

    if input.rent_roll.is_empty() {
        warnings.push("Rent roll is empty: income is zero".into());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
