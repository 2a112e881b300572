use std::sync::Arc;

use super::cfu::extract_cfu;
use super::date::{extract_date, DateExtraction};
use super::markers::extract_markers;
use super::organism::extract_organism;
use super::specimen::extract_specimen;
use super::susceptibility::extract_susceptibility;
use super::types::{CfuStrategy, ExtractedReport, ExtractionWarning, FieldProvenance, ReportExtractor};
use super::ExtractionError;
use crate::intelligence::ReferenceTables;
use crate::models::{CfuCount, CollectionDate, CultureReport, SpecimenType, UNKNOWN_ORGANISM};

/// Concrete rule-based extractor.
/// Holds the reference tables used for organism normalization and
/// contamination detection.
pub struct CultureExtractor {
    tables: Arc<ReferenceTables>,
}

impl CultureExtractor {
    pub fn new(tables: Arc<ReferenceTables>) -> Self {
        Self { tables }
    }

    /// Extractor over the bundled reference tables.
    pub fn builtin() -> Self {
        Self::new(Arc::new(ReferenceTables::builtin()))
    }

    pub fn tables(&self) -> &ReferenceTables {
        &self.tables
    }

    /// Extract one report, returning every soft degradation alongside it.
    ///
    /// Fails only when neither organism nor CFU can be recovered. Every
    /// other missing field is replaced by its sentinel and reported as an
    /// `ExtractionWarning`.
    pub fn extract_with_warnings(&self, raw_text: &str) -> Result<ExtractedReport, ExtractionError> {
        if raw_text.trim().is_empty() {
            return Err(ExtractionError::EmptyInput);
        }

        let organism = extract_organism(raw_text, &self.tables);
        let cfu = extract_cfu(raw_text);
        if organism.is_none() && cfu.is_none() {
            tracing::warn!(text_length = raw_text.len(), "Extraction failed: no organism and no CFU");
            return Err(ExtractionError::Unrecoverable);
        }

        let mut warnings = Vec::new();
        let mut provenance = FieldProvenance::default();

        // ----- [1] ORGANISM -----
        let organism = match organism {
            Some((name, source)) => {
                provenance.organism = Some(source);
                name
            }
            None => {
                warnings.push(ExtractionWarning::OrganismDefaulted);
                UNKNOWN_ORGANISM.to_string()
            }
        };

        // ----- [2] CFU -----
        let cfu = match cfu {
            Some((count, strategy)) => {
                provenance.cfu = Some(strategy);
                if strategy == CfuStrategy::BareNumber {
                    warnings.push(ExtractionWarning::CfuFromBareNumber { value: count.value() });
                }
                count
            }
            None => {
                warnings.push(ExtractionWarning::CfuDefaulted);
                CfuCount::NotReported
            }
        };

        // ----- [3] DATE -----
        let date = match extract_date(raw_text) {
            DateExtraction::Found { date, source, ambiguous } => {
                provenance.date = Some(source);
                let date = CollectionDate::known(date);
                if ambiguous {
                    warnings.push(ExtractionWarning::DateAmbiguous { assumed: date });
                }
                date
            }
            DateExtraction::Invalid { .. } => {
                warnings.push(ExtractionWarning::DateInvalid);
                CollectionDate::unknown()
            }
            DateExtraction::OnlyBirthDate | DateExtraction::Missing => {
                warnings.push(ExtractionWarning::DateMissing);
                CollectionDate::unknown()
            }
        };

        // ----- [4] SPECIMEN -----
        let specimen = match extract_specimen(raw_text) {
            Some((specimen, strategy)) => {
                provenance.specimen = Some(strategy);
                specimen
            }
            None => {
                warnings.push(ExtractionWarning::SpecimenUnknown);
                SpecimenType::Unknown
            }
        };

        // ----- [5] MARKERS + SUSCEPTIBILITY -----
        let markers = extract_markers(raw_text);
        let profile = extract_susceptibility(raw_text);

        let report = CultureReport::new(date, organism, cfu, specimen, &self.tables)
            .with_resistance_markers(markers)
            .with_susceptibility_profile(profile)
            .with_raw_text(raw_text);

        for warning in &warnings {
            tracing::warn!(warning = ?warning, "Extraction degraded");
        }
        tracing::debug!(
            organism = report.organism(),
            cfu = report.cfu().value(),
            markers = report.resistance_markers().len(),
            susceptibility_rows = report.susceptibility_profile().len(),
            warnings = warnings.len(),
            "Report extracted"
        );

        Ok(ExtractedReport { report, warnings, provenance })
    }

    /// Extract one report, discarding warnings.
    pub fn extract_report(&self, raw_text: &str) -> Result<CultureReport, ExtractionError> {
        self.extract_with_warnings(raw_text).map(|extracted| extracted.report)
    }
}

impl Default for CultureExtractor {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ReportExtractor for CultureExtractor {
    fn extract(&self, raw_text: &str) -> Result<ExtractedReport, ExtractionError> {
        self.extract_with_warnings(raw_text)
    }
}
