use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use deal_analyzer_core::deal::{DealDraft, WizardStep};

use super::draft::merge_at_step;
use crate::config::AppConfig;
use crate::input::{self, rent_roll_csv};

/// Arguments for importing a rent roll from CSV
#[derive(Args)]
pub struct ImportRentRollArgs {
    /// CSV file with one row per unit
    #[arg(long)]
    pub file: String,

    /// Replace the saved draft's rent roll with the imported units
    #[arg(long)]
    pub save: bool,
}

pub fn run_import(args: ImportRentRollArgs, config: &AppConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let text = input::file::read_text(&args.file)?;
    let units = rent_roll_csv::load_from_str(&text)?;

    let occupied = units.iter().filter(|u| u.occupied).count();
    let occupied_monthly: Decimal = units
        .iter()
        .filter(|u| u.occupied)
        .map(|u| u.monthly_rent)
        .sum();

    if args.save {
        let fragment = DealDraft {
            rent_roll: Some(units.clone()),
            ..DealDraft::default()
        };
        merge_at_step(config, WizardStep::RentRoll, fragment)?;
    }

    Ok(json!({
        "units": units.len(),
        "occupied": occupied,
        "occupiedMonthlyRent": occupied_monthly,
        "occupiedAnnualRent": occupied_monthly * Decimal::from(12),
        "saved": args.save,
        "rentRoll": units,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use deal_analyzer_core::deal::progress::ProgressStore;
    use deal_analyzer_core::deal::PropertyType;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_import_and_save_into_draft() {
        let state = tempfile::tempdir().unwrap();
        let config = AppConfig {
            state_dir: state.path().to_path_buf(),
            ..AppConfig::default()
        };
        merge_at_step(
            &config,
            WizardStep::PropertyDetails,
            DealDraft {
                property_type: Some(PropertyType::Multifamily),
                purchase_price: Some(dec!(500000)),
                number_of_units: Some(2),
                ..DealDraft::default()
            },
        )
        .unwrap();

        let mut csv = tempfile::NamedTempFile::new().unwrap();
        writeln!(csv, "unitNumber,monthlyRent,occupied").unwrap();
        writeln!(csv, "1A,1200,true").unwrap();
        writeln!(csv, "1B,1300,false").unwrap();

        let value = run_import(
            ImportRentRollArgs {
                file: csv.path().to_string_lossy().into_owned(),
                save: true,
            },
            &config,
        )
        .unwrap();

        assert_eq!(value["units"], 2);
        assert_eq!(value["occupied"], 1);
        let roll = config.progress_store().load().unwrap().rent_roll.unwrap();
        assert_eq!(roll[1].unit_number, "1B");
        assert!(!roll[1].occupied);
    }
}
