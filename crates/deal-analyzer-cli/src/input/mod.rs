pub mod file;
pub mod rent_roll_csv;
pub mod stdin;

use clap::Args;

use deal_analyzer_core::deal::progress::ProgressStore;
use deal_analyzer_core::deal::{DealDraft, DealInput};

use crate::config::AppConfig;

/// Where a command reads its deal from.
#[derive(Args, Debug, Clone, Default)]
pub struct DealSource {
    /// Path to a deal JSON file (a complete DealInput or any partial draft)
    #[arg(long, conflicts_with = "from_draft")]
    pub input: Option<String>,

    /// Use the saved wizard draft instead of a file
    #[arg(long)]
    pub from_draft: bool,
}

/// Resolve the deal, filling defaults exactly as wizard submission does.
pub fn load_deal(
    source: &DealSource,
    config: &AppConfig,
) -> Result<DealInput, Box<dyn std::error::Error>> {
    let draft: DealDraft = if source.from_draft {
        config
            .progress_store()
            .load()
            .ok_or("No saved draft; start one with `deal draft merge`")?
    } else if let Some(ref path) = source.input {
        file::read_json(path)?
    } else if let Some(data) = stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <deal.json>, --from-draft or stdin required".into());
    };
    Ok(draft.finalize()?)
}
