use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::insights::{generate_insights, AiAnalysis};
use crate::deal::{DealInput, LoanTerms};
use crate::error::DealAnalyzerError;
use crate::time_value;
use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Percent, Rate};
use crate::DealResult;

/// Longest hold the projection will run.
pub const MAX_HOLD_YEARS: u32 = 50;

/// Exit cap rates tested either side of the base, in points.
const EXIT_CAP_OFFSETS: [Decimal; 5] = [dec!(-1.0), dec!(-0.5), dec!(0), dec!(0.5), dec!(1.0)];

const IRR_GUESS: Rate = dec!(0.10);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Authoritative return metrics for a deal.
///
/// Percent fields are in points. `irr` is the solved levered IRR and is
/// unrelated to the preview estimate in [`crate::metrics::QuickMetrics`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialMetrics {
    pub noi: Money,
    pub going_in_cap_rate: Percent,
    /// Year-one NOI over the projected exit price
    pub reversion_cap_rate: Percent,
    pub cash_on_cash_return: Percent,
    /// Cash-on-cash in the first year without interest-only payments
    pub stabilized_cash_on_cash: Percent,
    pub irr: Percent,
    pub equity_multiple: Multiple,
    pub break_even_occupancy: Percent,
    pub dscr: Decimal,
    pub exit_sale_price: Money,
    #[serde(default)]
    pub annual_cash_flow: Money,
    /// Operating cash flow after debt service, one entry per hold year
    #[serde(default)]
    pub total_cash_flow: Vec<Money>,
    /// Levered equity cash flows: the initial outlay, then each year's
    /// distribution with net sale proceeds folded into the last year
    #[serde(default)]
    pub equity_return: Vec<Money>,
}

/// IRR across a band of exit cap rates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityTable {
    pub exit_cap_rates: Vec<Percent>,
    pub sale_prices: Vec<Money>,
    pub irrs: Vec<Percent>,
}

/// Full analysis result, as returned by the analysis endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealAnalysis {
    pub deal_input: DealInput,
    pub financial_metrics: FinancialMetrics,
    #[serde(default)]
    pub sensitivity_table: SensitivityTable,
    pub ai_analysis: AiAnalysis,
}

/// Month-by-month debt service rolled up by year.
#[derive(Debug, Clone, PartialEq)]
struct DebtSchedule {
    annual_debt_service: Vec<Money>,
    balance_at_exit: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the full analysis locally and wrap it with warnings and metadata.
pub fn analyze_deal(input: &DealInput) -> DealResult<ComputationOutput<DealAnalysis>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let analysis = build_analysis(input, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Levered DCF Deal Analysis (Year-One NOI, Exit at Appreciated Value)",
        &serde_json::json!({
            "hold_period_years": input.exit_assumptions.hold_period,
            "annual_appreciation_pct": input.exit_assumptions.annual_appreciation,
            "exit_cap_rate_pct": input.exit_assumptions.exit_cap_rate,
            "noi_growth": "flat",
            "equity": "down payment plus capex budget",
        }),
        warnings,
        elapsed,
        analysis,
    ))
}

/// Bare analysis without the metadata envelope.
pub fn build_analysis(input: &DealInput, warnings: &mut Vec<String>) -> DealResult<DealAnalysis> {
    input.validate()?;
    let hold_years = projection_years(input)?;

    let noi = year_one_noi(input);
    let purchase_price = input.purchase_price;
    let loan_amount = input.loan_amount();
    let down_payment = purchase_price - loan_amount;
    if down_payment <= Decimal::ZERO {
        return Err(DealAnalyzerError::DivisionByZero {
            context: "cash-on-cash return (no equity invested)".into(),
        });
    }
    let equity = down_payment + input.capex_budget;

    let schedule = debt_schedule(loan_amount, &input.loan_terms, hold_years)?;
    let year_one_debt_service = schedule.annual_debt_service.first().copied().unwrap_or_default();

    let going_in_cap_rate = noi / purchase_price * dec!(100);
    let annual_cash_flow = noi - year_one_debt_service;
    let cash_on_cash_return = annual_cash_flow / down_payment * dec!(100);

    let stabilized_debt_service = stabilized_year_debt_service(&input.loan_terms, &schedule);
    let stabilized_cash_on_cash = (noi - stabilized_debt_service) / down_payment * dec!(100);

    let dscr = if year_one_debt_service.is_zero() {
        warnings.push("No debt service: DSCR reported as 0".into());
        Decimal::ZERO
    } else {
        noi / year_one_debt_service
    };

    let potential_rent = input.potential_annual_rent();
    let total_expenses = input.operating_expenses.computed_total();
    let break_even_occupancy = if potential_rent.is_zero() {
        Decimal::ZERO
    } else {
        (total_expenses + year_one_debt_service) / potential_rent * dec!(100)
    };

    let exit_sale_price = appreciated_value(input)?;
    let reversion_cap_rate = noi / exit_sale_price * dec!(100);

    let total_cash_flow: Vec<Money> = schedule
        .annual_debt_service
        .iter()
        .map(|ds| noi - *ds)
        .collect();

    let equity_return = equity_cash_flows(
        equity,
        &total_cash_flow,
        exit_sale_price - schedule.balance_at_exit,
    );
    let irr = solve_irr_pct(&equity_return, "levered IRR", warnings);

    let distributions: Money = equity_return.iter().skip(1).copied().sum();
    let equity_multiple = distributions / equity;

    let sensitivity_table = exit_cap_table(
        input,
        noi,
        equity,
        &total_cash_flow,
        schedule.balance_at_exit,
        warnings,
    );

    let financial_metrics = FinancialMetrics {
        noi,
        going_in_cap_rate,
        reversion_cap_rate,
        cash_on_cash_return,
        stabilized_cash_on_cash,
        irr,
        equity_multiple,
        break_even_occupancy,
        dscr,
        exit_sale_price,
        annual_cash_flow,
        total_cash_flow,
        equity_return,
    };

    collect_warnings(input, &financial_metrics, warnings);
    let ai_analysis = generate_insights(input, &financial_metrics);

    debug!(
        irr = %financial_metrics.irr,
        equity_multiple = %financial_metrics.equity_multiple,
        hold_years,
        "deal analysis complete"
    );

    Ok(DealAnalysis {
        deal_input: input.clone(),
        financial_metrics,
        sensitivity_table,
        ai_analysis,
    })
}

// ---------------------------------------------------------------------------
// Income and value
// ---------------------------------------------------------------------------

fn year_one_noi(input: &DealInput) -> Money {
    let egi = input.occupied_annual_rent() * (Decimal::ONE - input.vacancy_rate / dec!(100));
    egi - input.operating_expenses.computed_total()
}

/// Whole years the cash flows are projected over (a fractional hold rounds up).
fn projection_years(input: &DealInput) -> DealResult<u32> {
    let years = input
        .exit_assumptions
        .hold_period
        .ceil()
        .to_u32()
        .filter(|y| *y <= MAX_HOLD_YEARS)
        .ok_or_else(|| {
            DealAnalyzerError::invalid(
                "exitAssumptions.holdPeriod",
                format!("Hold period must not exceed {MAX_HOLD_YEARS} years"),
            )
        })?;
    Ok(years)
}

/// price × (1 + appreciation)^hold
fn appreciated_value(input: &DealInput) -> DealResult<Money> {
    let growth = Decimal::ONE + input.exit_assumptions.annual_appreciation / dec!(100);
    if growth <= Decimal::ZERO {
        return Err(DealAnalyzerError::FinancialImpossibility(
            "Annual appreciation of -100% or less wipes out the exit value".into(),
        ));
    }
    let value = growth
        .checked_powd(input.exit_assumptions.hold_period)
        .and_then(|g| input.purchase_price.checked_mul(g))
        .ok_or_else(|| {
            DealAnalyzerError::FinancialImpossibility(
                "Exit value overflows at this appreciation and hold period".into(),
            )
        })?;
    if value <= Decimal::ZERO {
        return Err(DealAnalyzerError::DivisionByZero {
            context: "reversion cap rate (zero exit value)".into(),
        });
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// Debt
// ---------------------------------------------------------------------------

fn debt_schedule(loan_amount: Money, terms: &LoanTerms, years: u32) -> DealResult<DebtSchedule> {
    let months_total = years * 12;
    if loan_amount.is_zero() {
        return Ok(DebtSchedule {
            annual_debt_service: vec![Decimal::ZERO; years as usize],
            balance_at_exit: Decimal::ZERO,
        });
    }

    let monthly_rate = terms.interest_rate / dec!(100) / dec!(12);
    let amortization_months = terms.amortization_period * 12;
    let io_months = if terms.is_interest_only {
        terms.interest_only_months
    } else {
        0
    };
    if io_months >= amortization_months {
        return Err(DealAnalyzerError::invalid(
            "loanTerms.interestOnlyMonths",
            "Interest-only period must end before the amortization period",
        ));
    }

    let amortizing_payment =
        time_value::amortizing_payment(loan_amount, monthly_rate, amortization_months - io_months)?;

    let mut annual_debt_service = vec![Decimal::ZERO; years as usize];
    let mut balance = loan_amount;
    for month in 0..months_total {
        if balance <= Decimal::ZERO {
            break;
        }
        let interest = balance * monthly_rate;
        let payment = if month < io_months {
            interest
        } else {
            // the final scheduled payment retires whatever rounding left behind
            let principal = if month + 1 >= amortization_months {
                balance
            } else {
                (amortizing_payment - interest).min(balance)
            };
            balance -= principal;
            interest + principal
        };
        annual_debt_service[(month / 12) as usize] += payment;
    }

    Ok(DebtSchedule {
        annual_debt_service,
        balance_at_exit: balance.max(Decimal::ZERO),
    })
}

/// Debt service in the first year with no interest-only months, or the
/// last projected year when interest-only runs the whole hold.
fn stabilized_year_debt_service(terms: &LoanTerms, schedule: &DebtSchedule) -> Money {
    let io_years = if terms.is_interest_only {
        terms.interest_only_months.div_ceil(12) as usize
    } else {
        0
    };
    schedule
        .annual_debt_service
        .get(io_years)
        .or_else(|| schedule.annual_debt_service.last())
        .copied()
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Returns
// ---------------------------------------------------------------------------

fn equity_cash_flows(equity: Money, operating: &[Money], net_sale_proceeds: Money) -> Vec<Money> {
    let mut flows = Vec::with_capacity(operating.len() + 1);
    flows.push(-equity);
    flows.extend_from_slice(operating);
    if let Some(last) = flows.last_mut() {
        *last += net_sale_proceeds;
    }
    flows
}

/// Solve for IRR in points; a cash-flow stream with no root yields zero and a warning.
fn solve_irr_pct(flows: &[Money], label: &str, warnings: &mut Vec<String>) -> Percent {
    match time_value::irr(flows, IRR_GUESS) {
        Ok(rate) => rate * dec!(100),
        Err(e) => {
            warnings.push(format!("{label} could not be solved: {e}"));
            Decimal::ZERO
        }
    }
}

fn exit_cap_table(
    input: &DealInput,
    noi: Money,
    equity: Money,
    operating: &[Money],
    balance_at_exit: Money,
    warnings: &mut Vec<String>,
) -> SensitivityTable {
    let base = input.exit_assumptions.exit_cap_rate;
    let mut table = SensitivityTable::default();

    for offset in EXIT_CAP_OFFSETS {
        let cap_rate = base + offset;
        if cap_rate <= Decimal::ZERO {
            continue;
        }
        let sale_price = noi / (cap_rate / dec!(100));
        let flows = equity_cash_flows(equity, operating, sale_price - balance_at_exit);
        let irr = solve_irr_pct(&flows, &format!("IRR at {cap_rate}% exit cap"), warnings);

        table.exit_cap_rates.push(cap_rate);
        table.sale_prices.push(sale_price);
        table.irrs.push(irr);
    }
    table
}

fn collect_warnings(input: &DealInput, metrics: &FinancialMetrics, warnings: &mut Vec<String>) {
    if metrics.dscr > Decimal::ZERO && metrics.dscr < dec!(1.2) {
        warnings.push(format!(
            "DSCR of {:.2} is below 1.20x: lender covenant risk",
            metrics.dscr
        ));
    }
    if input.exit_assumptions.hold_period.fract() != Decimal::ZERO {
        warnings.push(format!(
            "Fractional hold of {} years: cash flows projected over whole years",
            input.exit_assumptions.hold_period
        ));
    }
    if metrics.noi <= Decimal::ZERO {
        warnings.push("Year-one NOI is not positive: exit cap table is meaningless".into());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
