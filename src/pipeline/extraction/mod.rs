pub mod types;
pub mod organism;
pub mod cfu;
pub mod date;
pub mod markers;
pub mod specimen;
pub mod susceptibility;
pub mod split;
pub mod orchestrator;

pub use types::*;
pub use orchestrator::*;
pub use split::{needs_review, split_manual_reports, split_report_blocks};
pub use susceptibility::susceptibility_summary;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Could not recover organism or CFU/mL from report; check report format")]
    Unrecoverable,

    #[error("Report text is empty")]
    EmptyInput,
}
