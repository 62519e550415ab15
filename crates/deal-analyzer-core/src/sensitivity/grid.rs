use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::adjuster::{apply_adjustments, Adjustments};
use crate::deal::DealInput;
use crate::error::DealAnalyzerError;
use crate::metrics::{compute_quick_metrics, QuickMetrics};
use crate::types::*;
use crate::DealResult;

/// Preview metric read out of each grid cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GridMetric {
    #[default]
    PreviewIrr,
    CapRate,
    CashOnCash,
    Dscr,
}

impl GridMetric {
    fn read(self, metrics: &QuickMetrics) -> Decimal {
        match self {
            GridMetric::PreviewIrr => metrics.preview_irr,
            GridMetric::CapRate => metrics.going_in_cap_rate,
            GridMetric::CashOnCash => metrics.cash_on_cash_return,
            GridMetric::Dscr => metrics.dscr,
        }
    }

    fn label(self) -> &'static str {
        match self {
            GridMetric::PreviewIrr => "Preview IRR (%)",
            GridMetric::CapRate => "Going-in Cap Rate (%)",
            GridMetric::CashOnCash => "Cash-on-Cash (%)",
            GridMetric::Dscr => "DSCR (x)",
        }
    }
}

/// Two-way sweep of purchase-price change (rows) against rent change (columns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSpec {
    pub price_change: SensitivityVariable,
    pub rent_change: SensitivityVariable,
    #[serde(default)]
    pub metric: GridMetric,
}

impl Default for GridSpec {
    fn default() -> Self {
        GridSpec {
            price_change: SensitivityVariable {
                name: "Price Change (%)".into(),
                min: dec!(-10),
                max: dec!(10),
                step: dec!(5),
            },
            rent_change: SensitivityVariable {
                name: "Rent Change (%)".into(),
                min: dec!(-10),
                max: dec!(10),
                step: dec!(5),
            },
            metric: GridMetric::PreviewIrr,
        }
    }
}

/// Evaluated grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityGrid {
    pub variable_1_name: String,
    pub variable_2_name: String,
    pub variable_1_values: Vec<Decimal>,
    pub variable_2_values: Vec<Decimal>,
    pub output_metric: String,
    /// Matrix[i][j] = output when variable_1 = variable_1_values[i], variable_2 = variable_2_values[j].
    /// `None` (null on the wire) where the cell could not be evaluated.
    pub matrix: Vec<Vec<Option<Decimal>>>,
    /// Output with no change on either axis, evaluated directly even when
    /// zero is not on a sweep
    pub base_case_value: Decimal,
    /// Cell closest to the unchanged deal (row, col)
    pub base_case_position: (usize, usize),
}

/// Generate the sweep values for a sensitivity variable from min to max with step.
fn generate_sweep_values(var: &SensitivityVariable) -> DealResult<Vec<Decimal>> {
    if var.step <= Decimal::ZERO {
        return Err(DealAnalyzerError::invalid(
            format!("variable:{}", var.name),
            "Step must be positive",
        ));
    }
    if var.min > var.max {
        return Err(DealAnalyzerError::invalid(
            format!("variable:{}", var.name),
            "Min must be <= max",
        ));
    }

    let mut values = Vec::new();
    let mut current = var.min;
    while current <= var.max {
        values.push(current);
        current += var.step;
    }
    // Ensure max is included if step doesn't land exactly on it
    if let Some(&last) = values.last() {
        if last < var.max {
            values.push(var.max);
        }
    }

    Ok(values)
}

/// Index of the value closest to `target`.
fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| (**v - target).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Evaluate a two-way grid with a caller-supplied model.
///
/// Cells whose evaluation fails are left empty with a warning rather than
/// aborting the whole grid. The base case must evaluate.
pub fn evaluate_grid<F>(
    variable_1: &SensitivityVariable,
    variable_2: &SensitivityVariable,
    output_metric: &str,
    eval_fn: F,
) -> DealResult<(SensitivityGrid, Vec<String>)>
where
    F: Fn(Decimal, Decimal) -> DealResult<Decimal>,
{
    let v1_values = generate_sweep_values(variable_1)?;
    let v2_values = generate_sweep_values(variable_2)?;
    let mut warnings = Vec::new();

    let mut matrix = Vec::with_capacity(v1_values.len());
    for v1 in &v1_values {
        let mut row = Vec::with_capacity(v2_values.len());
        for v2 in &v2_values {
            match eval_fn(*v1, *v2) {
                Ok(val) => row.push(Some(val)),
                Err(e) => {
                    warnings.push(format!("Evaluation failed at ({v1}, {v2}): {e}"));
                    row.push(None);
                }
            }
        }
        matrix.push(row);
    }

    let base_row = closest_index(&v1_values, Decimal::ZERO);
    let base_col = closest_index(&v2_values, Decimal::ZERO);
    let base_case_value = eval_fn(Decimal::ZERO, Decimal::ZERO)?;

    Ok((
        SensitivityGrid {
            variable_1_name: variable_1.name.clone(),
            variable_2_name: variable_2.name.clone(),
            variable_1_values: v1_values,
            variable_2_values: v2_values,
            output_metric: output_metric.to_string(),
            matrix,
            base_case_value,
            base_case_position: (base_row, base_col),
        },
        warnings,
    ))
}

/// Re-run the adjuster and calculator for every (price change, rent change) cell.
pub fn rent_price_grid(
    base: &DealInput,
    spec: &GridSpec,
) -> DealResult<ComputationOutput<SensitivityGrid>> {
    let start = Instant::now();
    base.validate()?;

    let (grid, warnings) = evaluate_grid(
        &spec.price_change,
        &spec.rent_change,
        spec.metric.label(),
        |price, rent| {
            let adj = Adjustments {
                purchase_price: price,
                monthly_rent: rent,
                ..Adjustments::default()
            };
            let adjusted = apply_adjustments(base, &adj)?;
            Ok(spec.metric.read(&compute_quick_metrics(&adjusted)?))
        },
    )?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rent x Price Sensitivity Grid (Quick Metrics)",
        spec,
        warnings,
        elapsed,
        grid,
    ))
}
