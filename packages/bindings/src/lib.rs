use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use deal_analyzer_core::deal::{DealDraft, DealInput};
use deal_analyzer_core::sensitivity::{Adjustments, GridSpec};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Accepts a complete deal or any partial draft and fills defaults.
fn parse_deal(value: serde_json::Value) -> NapiResult<DealInput> {
    let draft: DealDraft = serde_json::from_value(value).map_err(to_napi_error)?;
    draft.finalize().map_err(to_napi_error)
}

#[derive(Deserialize)]
struct AdjustRequest {
    deal: serde_json::Value,
    #[serde(default)]
    adjustments: Adjustments,
}

#[derive(Deserialize)]
struct GridRequest {
    deal: serde_json::Value,
    #[serde(default)]
    grid: Option<GridSpec>,
}

#[derive(Deserialize)]
struct GradeRequest {
    metric: String,
    value: rust_decimal::Decimal,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[napi]
pub fn quick_metrics(deal_json: String) -> NapiResult<String> {
    let value = serde_json::from_str(&deal_json).map_err(to_napi_error)?;
    let deal = parse_deal(value)?;
    let output =
        deal_analyzer_core::metrics::calculate_quick_metrics(&deal).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// `{"metric": "cap_rate", "value": "7.2"}` -> `{"grade": "A", "tone": "excellent"}`
#[napi]
pub fn grade_metric(input_json: String) -> NapiResult<String> {
    let request: GradeRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let metric: deal_analyzer_core::metrics::MetricKind =
        request.metric.parse().map_err(to_napi_error)?;
    let grade = deal_analyzer_core::metrics::grade(metric, request.value);
    serde_json::to_string(&serde_json::json!({ "grade": grade, "tone": grade.tone() }))
        .map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Sensitivity
// ---------------------------------------------------------------------------

#[napi]
pub fn apply_adjustments(input_json: String) -> NapiResult<String> {
    let request: AdjustRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let deal = parse_deal(request.deal)?;
    let adjusted = deal_analyzer_core::sensitivity::apply_adjustments(&deal, &request.adjustments)
        .map_err(to_napi_error)?;
    serde_json::to_string(&adjusted).map_err(to_napi_error)
}

#[napi]
pub fn sensitivity_preview(input_json: String) -> NapiResult<String> {
    let request: AdjustRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let deal = parse_deal(request.deal)?;
    let output = deal_analyzer_core::sensitivity::calculate_preview(&deal, &request.adjustments)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn sensitivity_grid(input_json: String) -> NapiResult<String> {
    let request: GridRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let deal = parse_deal(request.deal)?;
    let spec = request.grid.unwrap_or_default();
    let output =
        deal_analyzer_core::sensitivity::rent_price_grid(&deal, &spec).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_local(deal_json: String) -> NapiResult<String> {
    let value = serde_json::from_str(&deal_json).map_err(to_napi_error)?;
    let deal = parse_deal(value)?;
    let output = deal_analyzer_core::analysis::analyze_deal(&deal).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
