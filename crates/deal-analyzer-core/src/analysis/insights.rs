use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::engine::FinancialMetrics;
use crate::deal::DealInput;

/// Narrative commentary attached to an analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    pub summary: String,
    pub red_flags: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Rule-based review of the metrics. Each rule either raises a red flag with a
/// matching recommendation or, for strong values, adds a line to the summary.
pub fn generate_insights(input: &DealInput, metrics: &FinancialMetrics) -> AiAnalysis {
    let mut strengths: Vec<&str> = Vec::new();
    let mut out = AiAnalysis::default();

    if metrics.going_in_cap_rate < dec!(5) {
        out.flag(
            "Going-in cap rate is below 5%, indicating potentially overpriced property",
            "Consider negotiating a lower purchase price",
        );
    } else if metrics.going_in_cap_rate > dec!(8) {
        strengths.push("Strong going-in cap rate suggests good value");
    }

    if metrics.dscr < dec!(1.2) && !metrics.dscr.is_zero() {
        out.flag(
            "DSCR below 1.2 indicates high leverage risk",
            "Consider reducing loan amount or improving NOI",
        );
    } else if metrics.dscr > dec!(1.5) {
        strengths.push("Strong debt service coverage provides good safety margin");
    }

    if metrics.cash_on_cash_return < dec!(6) {
        out.flag(
            "Cash-on-cash return below 6% may not meet investor requirements",
            "Look for ways to increase NOI or reduce expenses",
        );
    } else if metrics.cash_on_cash_return > dec!(10) {
        strengths.push("Excellent cash-on-cash return indicates strong cash flow");
    }

    if input.vacancy_rate > dec!(10) {
        out.flag(
            "High vacancy rate may indicate market or property issues",
            "Investigate market conditions and property management",
        );
    }

    if metrics.break_even_occupancy > dec!(90) {
        out.flag(
            "Break-even occupancy above 90% leaves little room for vacancy",
            "Stress-test the rent roll before committing",
        );
    }

    if metrics.irr > dec!(15) {
        strengths.push("Projected levered IRR clears 15%");
    }

    if strengths.is_empty() {
        strengths.push("This deal shows moderate returns with standard risk profile");
    }

    out.summary = format!(
        "This {} property with {} units shows a {:.1}% cap rate and {:.1}% cash-on-cash return. {}.",
        input.property_type,
        input.number_of_units,
        round1(metrics.going_in_cap_rate),
        round1(metrics.cash_on_cash_return),
        strengths.join(". "),
    );
    out
}

impl AiAnalysis {
    fn flag(&mut self, red_flag: &str, recommendation: &str) {
        self.red_flags.push(red_flag.to_string());
        self.recommendations.push(recommendation.to_string());
    }
}

fn round1(value: Decimal) -> Decimal {
    value.round_dp(1)
}
