use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use deal_analyzer_core::sensitivity::{calculate_preview, rent_price_grid, Adjustments, GridMetric, GridSpec};
use deal_analyzer_core::types::SensitivityVariable;

use crate::config::AppConfig;
use crate::input::{self, DealSource};

/// Arguments for a slider-style what-if preview
#[derive(Args)]
pub struct SensitivityArgs {
    #[command(flatten)]
    pub source: DealSource,

    /// JSON file with an Adjustments object; individual flags override it
    #[arg(long)]
    pub adjustments: Option<String>,

    /// Purchase price change in percent (-20 to 20)
    #[arg(long, allow_hyphen_values = true)]
    pub purchase_price: Option<Decimal>,

    /// Rent change in percent (-15 to 25)
    #[arg(long, allow_hyphen_values = true)]
    pub monthly_rent: Option<Decimal>,

    /// Vacancy change in points (-5 to 15)
    #[arg(long, allow_hyphen_values = true)]
    pub vacancy_rate: Option<Decimal>,

    /// Operating expense change in percent (-20 to 30)
    #[arg(long, allow_hyphen_values = true)]
    pub operating_expenses: Option<Decimal>,

    /// Interest rate change in points (-2 to 3)
    #[arg(long, allow_hyphen_values = true)]
    pub interest_rate: Option<Decimal>,

    /// Exit cap rate change in points (-1.5 to 2)
    #[arg(long, allow_hyphen_values = true)]
    pub exit_cap_rate: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GridMetricArg {
    PreviewIrr,
    CapRate,
    CashOnCash,
    Dscr,
}

impl From<GridMetricArg> for GridMetric {
    fn from(arg: GridMetricArg) -> Self {
        match arg {
            GridMetricArg::PreviewIrr => GridMetric::PreviewIrr,
            GridMetricArg::CapRate => GridMetric::CapRate,
            GridMetricArg::CashOnCash => GridMetric::CashOnCash,
            GridMetricArg::Dscr => GridMetric::Dscr,
        }
    }
}

/// Arguments for the rent x price grid
#[derive(Args)]
pub struct GridArgs {
    #[command(flatten)]
    pub source: DealSource,

    /// Price change sweep as min:max:step in percent
    #[arg(long, default_value = "-10:10:5", allow_hyphen_values = true)]
    pub price: String,

    /// Rent change sweep as min:max:step in percent
    #[arg(long, default_value = "-10:10:5", allow_hyphen_values = true)]
    pub rent: String,

    /// Metric reported in each cell
    #[arg(long, value_enum, default_value = "preview-irr")]
    pub metric: GridMetricArg,
}

pub fn run_sensitivity(args: SensitivityArgs, config: &AppConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let deal = input::load_deal(&args.source, config)?;

    let mut adj: Adjustments = match args.adjustments {
        Some(ref path) => input::file::read_json(path)?,
        None => Adjustments::default(),
    };
    let flags = [
        (&mut adj.purchase_price, args.purchase_price),
        (&mut adj.monthly_rent, args.monthly_rent),
        (&mut adj.vacancy_rate, args.vacancy_rate),
        (&mut adj.operating_expenses, args.operating_expenses),
        (&mut adj.interest_rate, args.interest_rate),
        (&mut adj.exit_cap_rate, args.exit_cap_rate),
    ];
    for (slot, flag) in flags {
        if let Some(v) = flag {
            *slot = v;
        }
    }

    let result = calculate_preview(&deal, &adj)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_grid(args: GridArgs, config: &AppConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let deal = input::load_deal(&args.source, config)?;
    let spec = GridSpec {
        price_change: parse_sweep("Price Change (%)", &args.price)?,
        rent_change: parse_sweep("Rent Change (%)", &args.rent)?,
        metric: args.metric.into(),
    };
    let result = rent_price_grid(&deal, &spec)?;
    Ok(serde_json::to_value(result)?)
}

fn parse_sweep(name: &str, spec: &str) -> Result<SensitivityVariable, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 3 {
        return Err(format!("Sweep must be min:max:step, got '{spec}'").into());
    }
    Ok(SensitivityVariable {
        name: name.to_string(),
        min: parts[0].trim().parse()?,
        max: parts[1].trim().parse()?,
        step: parts[2].trim().parse()?,
    })
}
