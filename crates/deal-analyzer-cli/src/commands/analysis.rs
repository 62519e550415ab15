use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use serde_json::Value;
use tracing::info;

use deal_analyzer_core::analysis::{analyze_deal, write_export, DealAnalysis};
use deal_analyzer_core::deal::progress::ProgressStore;

use crate::client::AnalysisClient;
use crate::config::AppConfig;
use crate::input::{self, DealSource};

/// Arguments for a full deal analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub source: DealSource,

    /// Compute the analysis locally instead of calling the backend
    #[arg(long)]
    pub local: bool,

    /// Write the analysis to <dir>/deal-analysis-<type>-<date>.json
    #[arg(long)]
    pub export_dir: Option<PathBuf>,
}

/// Remote runs print the backend's DealAnalysis as-is; local runs print the
/// computation envelope. A saved draft is cleared only after success.
pub async fn run_analyze(args: AnalyzeArgs, config: &AppConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let deal = input::load_deal(&args.source, config)?;

    let (analysis, value): (DealAnalysis, Value) = if args.local {
        let output = analyze_deal(&deal)?;
        let value = serde_json::to_value(&output)?;
        (output.result, value)
    } else {
        let client = AnalysisClient::new(config.api_base_url()?)?;
        let analysis = client.analyze(&deal).await?;
        let value = serde_json::to_value(&analysis)?;
        (analysis, value)
    };

    // export before clearing so a failed write still leaves the draft to retry
    if let Some(dir) = args.export_dir {
        let path = write_export(&analysis, &dir, chrono::Local::now().date_naive())?;
        eprintln!("{} {}", "Exported".green().bold(), path.display());
    }

    if args.source.from_draft {
        config.progress_store().clear()?;
        info!("analysis succeeded; saved draft cleared");
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deal_analyzer_core::analysis::build_analysis;
    use deal_analyzer_core::deal::{DealDraft, DealInput, LoanTerms, OperatingExpenses, PropertyType, RentUnit};
    use rust_decimal_macros::dec;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_draft() -> DealDraft {
        DealDraft {
            property_type: Some(PropertyType::Multifamily),
            purchase_price: Some(dec!(1000000)),
            number_of_units: Some(1),
            rent_roll: Some(vec![RentUnit {
                monthly_rent: dec!(5000),
                ..RentUnit::standard(1)
            }]),
            operating_expenses: Some(OperatingExpenses {
                other: dec!(20000),
                ..OperatingExpenses::default()
            }),
            loan_terms: Some(LoanTerms {
                interest_rate: dec!(6),
                ..LoanTerms::default()
            }),
            ..DealDraft::default()
        }
    }

    fn sample_deal() -> DealInput {
        sample_draft().finalize().unwrap()
    }

    fn config_for(state: &tempfile::TempDir, api: Option<String>) -> AppConfig {
        AppConfig {
            api_base_url: api,
            state_dir: state.path().to_path_buf(),
            ..AppConfig::default()
        }
    }

    fn from_draft() -> DealSource {
        DealSource {
            input: None,
            from_draft: true,
        }
    }

    #[tokio::test]
    async fn test_local_analysis_clears_draft_and_exports() {
        let state = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let config = config_for(&state, None);
        config.progress_store().save(&sample_draft()).unwrap();

        let value = run_analyze(
            AnalyzeArgs {
                source: from_draft(),
                local: true,
                export_dir: Some(out.path().to_path_buf()),
            },
            &config,
        )
        .await
        .unwrap();

        assert!(value["result"]["financialMetrics"]["irr"].is_string());
        assert!(config.progress_store().load().is_none());
        let exported: Vec<_> = std::fs::read_dir(out.path()).unwrap().collect();
        assert_eq!(exported.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_export_keeps_draft() {
        let state = tempfile::tempdir().unwrap();
        let blocker = tempfile::NamedTempFile::new().unwrap();
        let config = config_for(&state, None);
        config.progress_store().save(&sample_draft()).unwrap();

        let result = run_analyze(
            AnalyzeArgs {
                source: from_draft(),
                local: true,
                export_dir: Some(blocker.path().join("exports")),
            },
            &config,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(config.progress_store().load(), Some(sample_draft()));
    }

    #[tokio::test]
    async fn test_remote_success_returns_bare_analysis() {
        let server = MockServer::start().await;
        let mut warnings = Vec::new();
        let analysis = build_analysis(&sample_deal(), &mut warnings).unwrap();
        Mock::given(method("POST"))
            .and(path("/api/analyze-deal"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&analysis))
            .mount(&server)
            .await;

        let state = tempfile::tempdir().unwrap();
        let config = config_for(&state, Some(server.uri()));
        config.progress_store().save(&sample_draft()).unwrap();

        let value = run_analyze(
            AnalyzeArgs {
                source: from_draft(),
                local: false,
                export_dir: None,
            },
            &config,
        )
        .await
        .unwrap();

        assert!(value.get("financialMetrics").is_some());
        assert!(value.get("methodology").is_none());
        assert!(config.progress_store().load().is_none());
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_draft() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let state = tempfile::tempdir().unwrap();
        let config = config_for(&state, Some(server.uri()));
        config.progress_store().save(&sample_draft()).unwrap();

        let result = run_analyze(
            AnalyzeArgs {
                source: from_draft(),
                local: false,
                export_dir: None,
            },
            &config,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(config.progress_store().load(), Some(sample_draft()));
    }
}
