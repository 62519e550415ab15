pub mod engine;
pub mod export;
pub mod insights;

pub use engine::{analyze_deal, build_analysis, DealAnalysis, FinancialMetrics, SensitivityTable};
pub use export::{export_file_name, from_json, read_export, to_json, write_export};
pub use insights::{generate_insights, AiAnalysis};
