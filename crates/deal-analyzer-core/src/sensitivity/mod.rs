pub mod adjuster;
pub mod grid;

pub use adjuster::{apply_adjustments, calculate_preview, preview, Adjustments, Knob, SensitivityPreview};
pub use grid::{rent_price_grid, GridMetric, GridSpec, SensitivityGrid};
