use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use crate::error::DealAnalyzerError;
use crate::types::{Money, Rate};
use crate::DealResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;

/// Net Present Value of a series of cash flows
pub fn npv(rate: Rate, cash_flows: &[Money]) -> DealResult<Money> {
    if rate <= dec!(-1) {
        return Err(DealAnalyzerError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount
                .checked_mul(one_plus_r)
                .ok_or_else(|| overflow("NPV", t))?;
        }
        if discount.is_zero() {
            return Err(DealAnalyzerError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        let pv = cf.checked_div(discount).ok_or_else(|| overflow("NPV", t))?;
        result = result.checked_add(pv).ok_or_else(|| overflow("NPV", t))?;
    }

    Ok(result)
}

/// Internal Rate of Return using Newton-Raphson
pub fn irr(cash_flows: &[Money], guess: Rate) -> DealResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(DealAnalyzerError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }
    if !cash_flows.iter().any(|cf| *cf < Decimal::ZERO)
        || !cash_flows.iter().any(|cf| *cf > Decimal::ZERO)
    {
        return Err(DealAnalyzerError::FinancialImpossibility(
            "IRR requires at least one negative and one positive cash flow".into(),
        ));
    }

    let mut rate = guess;

    for i in 0..MAX_IRR_ITERATIONS {
        let (npv_val, dnpv) = npv_and_derivative(cash_flows, rate).map_err(|_| {
            DealAnalyzerError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: Decimal::MAX,
            }
        })?;

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }

        if dnpv.is_zero() {
            return Err(DealAnalyzerError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: npv_val,
            });
        }

        let next = npv_val
            .checked_div(dnpv)
            .and_then(|step| rate.checked_sub(step))
            .ok_or_else(|| DealAnalyzerError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: npv_val,
            })?;
        if (next - rate).abs() < CONVERGENCE_THRESHOLD {
            return Ok(next);
        }
        rate = next;

        // Guard against divergence
        if rate < dec!(-0.99) {
            rate = dec!(-0.99);
        } else if rate > dec!(100.0) {
            rate = dec!(100.0);
        }
    }

    Err(DealAnalyzerError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta: npv_and_derivative(cash_flows, rate)
            .map(|(v, _)| v)
            .unwrap_or(Decimal::MAX),
    })
}

/// NPV(r) = sum CF_t / (1+r)^t and its derivative d(NPV)/dr.
///
/// Errors when a term leaves the Decimal range, which happens at the
/// extremes the Newton step can reach over long horizons.
fn npv_and_derivative(cash_flows: &[Money], rate: Rate) -> DealResult<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    let mut npv = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        let term = cf.checked_mul(discount).ok_or_else(|| overflow("IRR", t))?;
        npv = npv.checked_add(term).ok_or_else(|| overflow("IRR", t))?;
        if t > 0 {
            let slope = Decimal::from(-(t as i64))
                .checked_mul(term)
                .and_then(|v| v.checked_div(one_plus_r))
                .ok_or_else(|| overflow("IRR", t))?;
            dnpv = dnpv.checked_add(slope).ok_or_else(|| overflow("IRR", t))?;
        }
        discount = discount
            .checked_div(one_plus_r)
            .ok_or_else(|| overflow("IRR", t))?;
    }

    Ok((npv, dnpv))
}

fn overflow(function: &str, period: usize) -> DealAnalyzerError {
    DealAnalyzerError::FinancialImpossibility(format!(
        "{function} discounting overflowed at period {period}"
    ))
}

/// Level payment of a fully amortising loan: P * r / (1 - (1 + r)^-n).
///
/// A zero periodic rate falls back to straight-line repayment.
pub fn amortizing_payment(principal: Money, periodic_rate: Rate, periods: u32) -> DealResult<Money> {
    if periods == 0 {
        return Err(DealAnalyzerError::DivisionByZero {
            context: "loan payment with zero amortisation periods".into(),
        });
    }

    if periodic_rate.is_zero() {
        return Ok(principal / Decimal::from(periods));
    }

    let compound = (Decimal::ONE + periodic_rate)
        .checked_powu(u64::from(periods))
        .ok_or_else(|| {
            DealAnalyzerError::FinancialImpossibility(format!(
                "loan compounding overflowed over {periods} periods"
            ))
        })?;

    let denominator = Decimal::ONE - Decimal::ONE / compound;
    if denominator.is_zero() {
        return Err(DealAnalyzerError::DivisionByZero {
            context: "loan payment denominator".into(),
        });
    }

    Ok(principal * periodic_rate / denominator)
}

/// Outstanding principal after `payments_made` level payments.
pub fn remaining_balance(
    principal: Money,
    periodic_rate: Rate,
    payment: Money,
    payments_made: u32,
) -> Money {
    let mut balance = principal;
    for _ in 0..payments_made {
        let interest = balance * periodic_rate;
        balance -= payment - interest;
        if balance <= Decimal::ZERO {
            return Decimal::ZERO;
        }
    }
    balance
}
