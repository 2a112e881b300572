pub mod config;
pub mod models;
pub mod pipeline; // Extractor + end-to-end processor
pub mod intelligence; // Trend classifier, hypothesis engine, payload boundary

pub use intelligence::{AssessmentPayload, ReferenceTables};
pub use models::{CultureReport, HypothesisResult, TrendResult};
pub use pipeline::extraction::{CultureExtractor, ExtractionError, ExtractionWarning};
pub use pipeline::{Assessment, CultureProcessor, ProcessError};

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber. `RUST_LOG` wins over the default filter.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
