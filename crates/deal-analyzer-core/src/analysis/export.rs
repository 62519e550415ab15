use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::engine::DealAnalysis;
use crate::DealResult;

/// Pretty JSON document for a completed analysis.
pub fn to_json(analysis: &DealAnalysis) -> DealResult<String> {
    Ok(serde_json::to_string_pretty(analysis)?)
}

pub fn from_json(document: &str) -> DealResult<DealAnalysis> {
    Ok(serde_json::from_str(document)?)
}

/// `deal-analysis-<property type>-<yyyy-mm-dd>.json`
pub fn export_file_name(analysis: &DealAnalysis, date: NaiveDate) -> String {
    format!(
        "deal-analysis-{}-{}.json",
        analysis.deal_input.property_type,
        date.format("%Y-%m-%d")
    )
}

/// Write the export into `dir` under its default file name and return the path.
pub fn write_export(analysis: &DealAnalysis, dir: &Path, date: NaiveDate) -> DealResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(analysis, date));
    fs::write(&path, to_json(analysis)?)?;
    debug!(path = %path.display(), "analysis exported");
    Ok(path)
}

pub fn read_export(path: &Path) -> DealResult<DealAnalysis> {
    from_json(&fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::engine::build_analysis;
    use crate::deal::{DealDraft, PropertyType};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn analysis() -> DealAnalysis {
        let input = DealDraft {
            property_type: Some(PropertyType::MixedUse),
            purchase_price: Some(dec!(850000)),
            number_of_units: Some(4),
            ..DealDraft::default()
        }
        .finalize()
        .unwrap();
        build_analysis(&input, &mut Vec::new()).unwrap()
    }

    #[test]
    fn test_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            export_file_name(&analysis(), date),
            "deal-analysis-mixed-use-2024-03-09.json"
        );
    }

    #[test]
    fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let original = analysis();
        let path = write_export(&original, dir.path(), date).unwrap();
        assert!(path.ends_with("deal-analysis-mixed-use-2024-03-09.json"));
        assert_eq!(read_export(&path).unwrap(), original);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(from_json("{\"dealInput\": 3}").is_err());
    }
}
