use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::quick::QuickMetrics;

/// Metrics that carry a letter grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    CapRate,
    CashOnCash,
    Dscr,
    Irr,
    EquityMultiple,
}

impl MetricKind {
    pub const ALL: [MetricKind; 5] = [
        MetricKind::CapRate,
        MetricKind::CashOnCash,
        MetricKind::Dscr,
        MetricKind::Irr,
        MetricKind::EquityMultiple,
    ];

    /// Inclusive lower bounds for A+, A, B and C. Anything below the last is D.
    pub fn thresholds(self) -> [Decimal; 4] {
        match self {
            MetricKind::CapRate => [dec!(8.0), dec!(7.0), dec!(6.0), dec!(5.0)],
            MetricKind::CashOnCash => [dec!(12), dec!(10), dec!(8), dec!(6)],
            MetricKind::Dscr => [dec!(1.5), dec!(1.35), dec!(1.25), dec!(1.15)],
            MetricKind::Irr => [dec!(15), dec!(12), dec!(10), dec!(8)],
            MetricKind::EquityMultiple => [dec!(2.5), dec!(2.0), dec!(1.75), dec!(1.5)],
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MetricKind::CapRate => "cap_rate",
            MetricKind::CashOnCash => "cash_on_cash",
            MetricKind::Dscr => "dscr",
            MetricKind::Irr => "irr",
            MetricKind::EquityMultiple => "equity_multiple",
        };
        f.write_str(label)
    }
}

impl std::str::FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "cap_rate" => Ok(MetricKind::CapRate),
            "cash_on_cash" => Ok(MetricKind::CashOnCash),
            "dscr" => Ok(MetricKind::Dscr),
            "irr" => Ok(MetricKind::Irr),
            "equity_multiple" => Ok(MetricKind::EquityMultiple),
            other => Err(format!("unknown metric '{other}'")),
        }
    }
}

/// Letter grade. Declared worst-first so `Ord` follows quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    D,
    C,
    B,
    A,
    #[serde(rename = "A+")]
    APlus,
}

/// Colour band a grade is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeTone {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Grade {
    pub fn tone(self) -> GradeTone {
        match self {
            Grade::APlus | Grade::A => GradeTone::Excellent,
            Grade::B => GradeTone::Good,
            Grade::C => GradeTone::Fair,
            Grade::D => GradeTone::Poor,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        };
        f.write_str(label)
    }
}

/// Map a metric value onto its letter grade. Total over all inputs.
pub fn grade(metric: MetricKind, value: Decimal) -> Grade {
    const TIERS: [Grade; 4] = [Grade::APlus, Grade::A, Grade::B, Grade::C];
    metric
        .thresholds()
        .iter()
        .zip(TIERS)
        .find(|(floor, _)| value >= **floor)
        .map(|(_, g)| g)
        .unwrap_or(Grade::D)
}

/// Grades for the three metrics the preview panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewGrades {
    pub cap_rate: Grade,
    pub cash_on_cash: Grade,
    pub irr: Grade,
}

pub fn grade_quick_metrics(metrics: &QuickMetrics) -> PreviewGrades {
    PreviewGrades {
        cap_rate: grade(MetricKind::CapRate, metrics.going_in_cap_rate),
        cash_on_cash: grade(MetricKind::CashOnCash, metrics.cash_on_cash_return),
        irr: grade(MetricKind::Irr, metrics.preview_irr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cap_rate_bands() {
        assert_eq!(grade(MetricKind::CapRate, dec!(8.0)), Grade::APlus);
        assert_eq!(grade(MetricKind::CapRate, dec!(7.99)), Grade::A);
        assert_eq!(grade(MetricKind::CapRate, dec!(6.5)), Grade::B);
        assert_eq!(grade(MetricKind::CapRate, dec!(5.0)), Grade::C);
        assert_eq!(grade(MetricKind::CapRate, dec!(4.99)), Grade::D);
    }

    #[test]
    fn test_dscr_bands() {
        assert_eq!(grade(MetricKind::Dscr, dec!(1.5)), Grade::APlus);
        assert_eq!(grade(MetricKind::Dscr, dec!(1.35)), Grade::A);
        assert_eq!(grade(MetricKind::Dscr, dec!(1.3)), Grade::B);
        assert_eq!(grade(MetricKind::Dscr, dec!(1.15)), Grade::C);
        assert_eq!(grade(MetricKind::Dscr, dec!(0.686)), Grade::D);
    }

    #[test]
    fn test_equity_multiple_and_irr_bands() {
        assert_eq!(grade(MetricKind::EquityMultiple, dec!(2.0)), Grade::A);
        assert_eq!(grade(MetricKind::EquityMultiple, dec!(1.74)), Grade::C);
        assert_eq!(grade(MetricKind::Irr, dec!(12)), Grade::A);
        assert_eq!(grade(MetricKind::Irr, dec!(-4.78)), Grade::D);
    }

    #[test]
    fn test_cash_on_cash_negative_is_d() {
        assert_eq!(grade(MetricKind::CashOnCash, dec!(-6.78)), Grade::D);
    }

    #[test]
    fn test_grade_ordering_and_labels() {
        assert!(Grade::APlus > Grade::A);
        assert!(Grade::C > Grade::D);
        assert_eq!(Grade::APlus.to_string(), "A+");
        assert_eq!(serde_json::to_string(&Grade::APlus).unwrap(), "\"A+\"");
        assert_eq!(serde_json::to_string(&Grade::B).unwrap(), "\"B\"");
    }

    #[test]
    fn test_tone_bands() {
        assert_eq!(Grade::APlus.tone(), GradeTone::Excellent);
        assert_eq!(Grade::B.tone(), GradeTone::Good);
        assert_eq!(Grade::D.tone(), GradeTone::Poor);
    }

    #[test]
    fn test_metric_kind_parse() {
        assert_eq!("cap-rate".parse::<MetricKind>().unwrap(), MetricKind::CapRate);
        assert_eq!("DSCR".parse::<MetricKind>().unwrap(), MetricKind::Dscr);
        assert!("noi".parse::<MetricKind>().is_err());
    }
}
