//! Immutable value types shared by the extraction, trend and hypothesis stages.

use thiserror::Error;

pub mod enums;
pub mod report;
pub mod assessment;

pub use enums::*;
pub use report::*;
pub use assessment::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Invalid collection date: {0}")]
    InvalidDate(String),
}
