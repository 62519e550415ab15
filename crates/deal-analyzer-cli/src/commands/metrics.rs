use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use deal_analyzer_core::metrics::{calculate_quick_metrics, grade, grade_quick_metrics, MetricKind};

use crate::config::AppConfig;
use crate::input::{self, DealSource};

/// Arguments for the year-one preview
#[derive(Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub source: DealSource,
}

/// Arguments for grading a single metric value
#[derive(Args)]
pub struct GradeArgs {
    /// Metric: cap_rate, cash_on_cash, dscr, irr, equity_multiple
    #[arg(long)]
    pub metric: MetricKind,

    /// Metric value (percent points for rates, e.g. 7.25; a multiple for dscr/equity_multiple)
    #[arg(long, allow_hyphen_values = true)]
    pub value: Decimal,
}

pub fn run_preview(args: PreviewArgs, config: &AppConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let deal = input::load_deal(&args.source, config)?;
    let output = calculate_quick_metrics(&deal)?;
    let grades = grade_quick_metrics(&output.result);

    let mut value = serde_json::to_value(&output)?;
    value["grades"] = serde_json::to_value(grades)?;
    Ok(value)
}

pub fn run_grade(args: GradeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let g = grade(args.metric, args.value);
    Ok(json!({
        "metric": args.metric,
        "value": args.value,
        "grade": g,
        "tone": g.tone(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_grade_output_shape() {
        let value = run_grade(GradeArgs {
            metric: MetricKind::CapRate,
            value: dec!(7.2),
        })
        .unwrap();
        assert_eq!(value["metric"], "cap_rate");
        assert_eq!(value["grade"], "A");
        assert_eq!(value["tone"], "excellent");
    }
}
