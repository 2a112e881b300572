pub mod reference; // Static alias / drug-class / contamination tables
pub mod trend; // Temporal trend classifier
pub mod hypothesis; // Confidence + risk-flag rule engine
pub mod messages;
pub mod payload; // Summarizer boundary projection

pub use hypothesis::score;
pub use payload::AssessmentPayload;
pub use reference::{ReferenceError, ReferenceTables};
pub use trend::{analyze, TrendError};
