//! Rent roll import from CSV.
//!
//! Headers are matched by name, so column order does not matter:
//!
//! | Column | Required | Notes |
//! |-----------------|----------|-------------------------------------|
//! | `unitNumber` | yes | |
//! | `unitType` | no | defaults to `Standard` |
//! | `bedrooms` | no | integer, defaults to 0 |
//! | `bathrooms` | no | decimal, defaults to 0 |
//! | `squareFootage` | no | decimal, defaults to 0 |
//! | `monthlyRent` | yes | decimal |
//! | `occupied` | no | true/false/yes/no/1/0, defaults to true |
//! | `leaseEndDate` | no | `YYYY-MM-DD`, empty for none |
//!
//! ```csv
//! unitNumber,unitType,bedrooms,bathrooms,squareFootage,monthlyRent,occupied,leaseEndDate
//! 101,1BR,1,1,650,1450.00,true,2025-08-31
//! 102,2BR,2,1.5,900,1875.00,false,
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use deal_analyzer_core::deal::RentUnit;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsvRow {
    unit_number: String,
    unit_type: Option<String>,
    bedrooms: Option<u32>,
    bathrooms: Option<Decimal>,
    square_footage: Option<Decimal>,
    monthly_rent: Decimal,
    occupied: Option<String>,
    lease_end_date: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RentRollError {
    /// Structural problem, missing required column or type mismatch
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    #[error("unrecognised occupied flag '{value}' on row {row}")]
    InvalidOccupied { value: String, row: usize },

    #[error("invalid lease end date '{value}' on row {row} (expected YYYY-MM-DD)")]
    InvalidDate { value: String, row: usize },

    #[error("negative {field} on row {row}")]
    Negative { field: &'static str, row: usize },
}

fn parse_occupied(value: Option<String>, row: usize) -> Result<bool, RentRollError> {
    let Some(raw) = value else {
        return Ok(true);
    };
    match raw.to_ascii_lowercase().as_str() {
        "" | "true" | "yes" | "y" | "1" | "occupied" => Ok(true),
        "false" | "no" | "n" | "0" | "vacant" => Ok(false),
        _ => Err(RentRollError::InvalidOccupied { value: raw, row }),
    }
}

fn convert_row(row: CsvRow, row_number: usize) -> Result<RentUnit, RentRollError> {
    let occupied = parse_occupied(row.occupied, row_number)?;

    let lease_end_date = match row.lease_end_date.filter(|d| !d.is_empty()) {
        Some(raw) => Some(NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| {
            RentRollError::InvalidDate {
                value: raw.clone(),
                row: row_number,
            }
        })?),
        None => None,
    };

    let unit = RentUnit {
        unit_number: row.unit_number,
        unit_type: row
            .unit_type
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Standard".to_string()),
        bedrooms: row.bedrooms.unwrap_or(0),
        bathrooms: row.bathrooms.unwrap_or(Decimal::ZERO),
        square_footage: row.square_footage.unwrap_or(Decimal::ZERO),
        monthly_rent: row.monthly_rent,
        occupied,
        lease_end_date,
    };

    for (field, value) in [
        ("monthlyRent", unit.monthly_rent),
        ("bathrooms", unit.bathrooms),
        ("squareFootage", unit.square_footage),
    ] {
        if value < Decimal::ZERO {
            return Err(RentRollError::Negative {
                field,
                row: row_number,
            });
        }
    }
    Ok(unit)
}

/// Parse CSV text into rent-roll units in file order.
pub fn load_from_str(input: &str) -> Result<Vec<RentUnit>, RentRollError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input.as_bytes());

    reader
        .deserialize::<CsvRow>()
        .enumerate()
        .map(|(idx, result)| {
            let row = result?;
            convert_row(row, idx + 1)
        })
        .collect()
}
