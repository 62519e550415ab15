use clap::{Args, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing::debug;

use deal_analyzer_core::deal::progress::ProgressStore;
use deal_analyzer_core::deal::{bulk_units, DealDraft, RentUnit, Wizard, WizardEvent, WizardStep};

use super::analysis::{run_analyze, AnalyzeArgs};
use crate::config::AppConfig;
use crate::input::{self, DealSource};

#[derive(Subcommand)]
pub enum DraftCommand {
    /// Merge a JSON fragment into the saved draft at a wizard step
    Merge(MergeArgs),
    /// Show per-step validity and the furthest reachable step
    Status,
    /// Print the saved draft
    Show,
    /// Discard the saved draft
    Reset,
    /// Append identical units to the draft's rent roll
    AddUnits(AddUnitsArgs),
    /// Analyze the saved draft and clear it on success
    Submit(SubmitArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StepArg {
    PropertyDetails,
    RentRoll,
    ExpensesFinancing,
    ExitStrategy,
}

impl From<StepArg> for WizardStep {
    fn from(arg: StepArg) -> Self {
        match arg {
            StepArg::PropertyDetails => WizardStep::PropertyDetails,
            StepArg::RentRoll => WizardStep::RentRoll,
            StepArg::ExpensesFinancing => WizardStep::ExpensesFinancing,
            StepArg::ExitStrategy => WizardStep::ExitStrategy,
        }
    }
}

#[derive(Args)]
pub struct MergeArgs {
    /// Wizard step the fragment belongs to
    #[arg(long, value_enum)]
    pub step: StepArg,

    /// Path to a JSON fragment (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Args)]
pub struct AddUnitsArgs {
    /// Number of units to add
    #[arg(long)]
    pub count: usize,

    /// Monthly rent for each unit
    #[arg(long)]
    pub rent: Decimal,

    #[arg(long, default_value = "Standard")]
    pub unit_type: String,

    #[arg(long, default_value_t = 1)]
    pub bedrooms: u32,

    /// Add the units as vacant
    #[arg(long)]
    pub vacant: bool,
}

#[derive(Args)]
pub struct SubmitArgs {
    /// Compute the analysis locally instead of calling the backend
    #[arg(long)]
    pub local: bool,

    #[arg(long)]
    pub export_dir: Option<std::path::PathBuf>,
}

pub async fn run_draft(command: DraftCommand, config: &AppConfig) -> Result<Value, Box<dyn std::error::Error>> {
    match command {
        DraftCommand::Merge(args) => {
            let fragment: DealDraft = match args.input {
                Some(ref path) => input::file::read_json(path)?,
                None => {
                    let data = input::stdin::read_stdin()?
                        .ok_or("--input <fragment.json> or stdin required")?;
                    serde_json::from_value(data)?
                }
            };
            let draft = merge_at_step(config, args.step.into(), fragment)?;
            Ok(status_json(&draft))
        }
        DraftCommand::Status => Ok(status_json(&saved_draft(config))),
        DraftCommand::Show => Ok(serde_json::to_value(saved_draft(config))?),
        DraftCommand::Reset => {
            config.progress_store().clear()?;
            Ok(json!({ "cleared": true }))
        }
        DraftCommand::AddUnits(args) => {
            let draft = saved_draft(config);
            let existing = draft.rent_roll.clone().unwrap_or_default();
            let template = RentUnit {
                unit_type: args.unit_type,
                bedrooms: args.bedrooms,
                monthly_rent: args.rent,
                occupied: !args.vacant,
                ..RentUnit::standard(0)
            };
            let mut rent_roll = existing;
            let start = rent_roll.len() + 1;
            rent_roll.extend(bulk_units(&template, args.count, start));

            let fragment = DealDraft {
                rent_roll: Some(rent_roll),
                ..DealDraft::default()
            };
            let draft = merge_at_step(config, WizardStep::RentRoll, fragment)?;
            Ok(status_json(&draft))
        }
        DraftCommand::Submit(args) => {
            let analyze = AnalyzeArgs {
                source: DealSource {
                    input: None,
                    from_draft: true,
                },
                local: args.local,
                export_dir: args.export_dir,
            };
            run_analyze(analyze, config).await
        }
    }
}

fn saved_draft(config: &AppConfig) -> DealDraft {
    config.progress_store().load().unwrap_or_default()
}

/// Walk the wizard to `step` and merge `fragment` there, then persist.
/// Fails without saving when an earlier step blocks navigation.
pub fn merge_at_step(
    config: &AppConfig,
    step: WizardStep,
    fragment: DealDraft,
) -> Result<DealDraft, Box<dyn std::error::Error>> {
    let store = config.progress_store();
    let draft = store.load().unwrap_or_default();

    let wizard = Wizard::resume(draft).advance_to(step);
    if wizard.step() != step {
        let field = wizard.draft().missing_required_field().unwrap_or("propertyType");
        return Err(format!(
            "Cannot edit '{}' yet: '{}' in {} is missing or not positive",
            step.title(),
            field,
            wizard.step().title()
        )
        .into());
    }

    let draft = wizard.apply(WizardEvent::StepData(fragment)).into_draft();
    store.save(&draft)?;
    debug!(step = step.title(), "merged draft fragment");
    Ok(draft)
}

fn status_json(draft: &DealDraft) -> Value {
    let reachable = Wizard::resume(draft.clone()).advance_to(WizardStep::ExitStrategy).step();
    let steps: Vec<Value> = WizardStep::ALL
        .iter()
        .map(|s| {
            json!({
                "step": s,
                "title": s.title(),
                "valid": draft.is_step_valid(*s),
                "reachable": *s <= reachable,
            })
        })
        .collect();
    json!({
        "empty": draft.is_empty(),
        "furthestStep": reachable,
        "missingField": draft.missing_required_field(),
        "units": draft.rent_roll.as_ref().map_or(0, |r| r.len()),
        "steps": steps,
    })
}
