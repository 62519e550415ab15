pub mod grading;
pub mod quick;

pub use grading::{grade, grade_quick_metrics, Grade, GradeTone, MetricKind, PreviewGrades};
pub use quick::{calculate_quick_metrics, compute_quick_metrics, QuickMetrics};
