pub mod draft;
pub mod model;

#[cfg(feature = "progress")]
pub mod progress;

pub use draft::{DealDraft, Wizard, WizardEvent, WizardStep};
pub use model::{
    bulk_units, DealInput, ExitAssumptions, ExpenseLine, LoanTerms, OperatingExpenses,
    PropertyType, RentUnit,
};
