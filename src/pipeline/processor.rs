//! Culture assessment orchestrator.
//!
//! Single entry point that drives the full deterministic pipeline:
//! extract each report → sort by collection date → classify trend → score.
//!
//! The extractor is injected as a trait object so the orchestrator stays
//! testable with mock implementations.

use std::path::Path;
use std::sync::Arc;

use crate::config::{ClinicalRules, ConfigError};
use crate::intelligence::{self, AssessmentPayload, ReferenceError, ReferenceTables, TrendError};
use crate::models::{Audience, CultureReport, HypothesisResult, TrendResult};
use crate::pipeline::extraction::{
    needs_review, CultureExtractor, ExtractionError, ExtractionWarning, ReportExtractor,
};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("No reports supplied")]
    NoReports,

    #[error("Too many reports: {count} supplied, at most {max} accepted")]
    TooManyReports { count: usize, max: usize },

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Trend analysis failed: {0}")]
    Trend(#[from] TrendError),

    #[error("Reference data error: {0}")]
    Reference(#[from] ReferenceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Everything one run produces. Reports are in ascending collection order;
/// `warnings[i]` belongs to `reports[i]`.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub reports: Vec<CultureReport>,
    pub trend: TrendResult,
    pub hypothesis: HypothesisResult,
    pub warnings: Vec<Vec<ExtractionWarning>>,
}

impl Assessment {
    /// Boundary projection for the downstream summarizer.
    pub fn payload(&self, mode: Audience) -> AssessmentPayload {
        AssessmentPayload::build(mode, &self.trend, &self.hypothesis)
    }

    /// Per-report review flag, same order as `reports`.
    pub fn review_flags(&self) -> Vec<bool> {
        self.reports.iter().map(needs_review).collect()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.iter().map(Vec::len).sum()
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct CultureProcessor {
    extractor: Box<dyn ReportExtractor + Send + Sync>,
    rules: ClinicalRules,
    tables: Arc<ReferenceTables>,
}

impl CultureProcessor {
    /// Rules are validated here, once.
    ///
    /// `extractor` must normalize organisms against the same `tables`;
    /// persistence and recurrence compare the names it produces using
    /// these tables. Prefer [`CultureProcessor::with_tables`] unless a
    /// custom extractor is needed.
    pub fn new(
        extractor: Box<dyn ReportExtractor + Send + Sync>,
        rules: ClinicalRules,
        tables: Arc<ReferenceTables>,
    ) -> Result<Self, ProcessError> {
        rules.validate()?;
        Ok(Self {
            extractor,
            rules,
            tables,
        })
    }

    /// Default rules, bundled reference tables, rule-based extractor.
    pub fn builtin() -> Self {
        let tables = Arc::new(ReferenceTables::builtin());
        Self {
            extractor: Box::new(CultureExtractor::new(Arc::clone(&tables))),
            rules: ClinicalRules::default(),
            tables,
        }
    }

    /// Rule-based extractor built over the same tables the trend stage reads.
    pub fn with_tables(rules: ClinicalRules, tables: Arc<ReferenceTables>) -> Result<Self, ProcessError> {
        let extractor = Box::new(CultureExtractor::new(Arc::clone(&tables)));
        Self::new(extractor, rules, tables)
    }

    /// Rule-based extractor over reference tables loaded from `resources_dir`.
    pub fn from_resources(rules: ClinicalRules, resources_dir: &Path) -> Result<Self, ProcessError> {
        let tables = Arc::new(ReferenceTables::load(resources_dir)?);
        Self::with_tables(rules, tables)
    }

    pub fn rules(&self) -> &ClinicalRules {
        &self.rules
    }

    pub fn tables(&self) -> &ReferenceTables {
        &self.tables
    }

    /// Run the full pipeline over raw report texts.
    ///
    /// 1. Enforce 1..=`max_reports` inputs
    /// 2. Extract every text; the first hard failure aborts the run
    /// 3. Stable sort by collection date, unknown dates last
    /// 4. Classify the trend and score it
    pub fn assess<S: AsRef<str>>(&self, texts: &[S]) -> Result<Assessment, ProcessError> {
        if texts.is_empty() {
            return Err(ProcessError::NoReports);
        }
        if texts.len() > self.rules.max_reports {
            return Err(ProcessError::TooManyReports {
                count: texts.len(),
                max: self.rules.max_reports,
            });
        }

        // Step 1: Extract
        let mut extracted = Vec::with_capacity(texts.len());
        for (index, text) in texts.iter().enumerate() {
            let report = self.extractor.extract(text.as_ref()).map_err(|e| {
                tracing::warn!(report_index = index, error = %e, "Report rejected");
                e
            })?;
            extracted.push(report);
        }

        // Step 2: Order by collection date
        extracted.sort_by_key(|e| {
            let date = e.report.date().date();
            (date.is_none(), date)
        });

        let (reports, warnings): (Vec<CultureReport>, Vec<Vec<ExtractionWarning>>) =
            extracted.into_iter().map(|e| (e.report, e.warnings)).unzip();

        // Step 3: Trend + hypothesis
        let trend = intelligence::analyze(&reports, &self.rules, &self.tables)?;
        let hypothesis = intelligence::score(&trend, reports.len());

        tracing::info!(
            reports = reports.len(),
            trend = %trend.cfu_trend,
            confidence = hypothesis.confidence(),
            flags = hypothesis.risk_flags().len(),
            stewardship_alert = hypothesis.stewardship_alert(),
            "Assessment complete"
        );

        Ok(Assessment {
            reports,
            trend,
            hypothesis,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CfuCount, CfuTrend, CollectionDate, RiskFlag, SpecimenType};
    use crate::pipeline::extraction::{ExtractedReport, FieldProvenance};

    // -- Mock extractor -----------------------------------------------------

    /// Parses `date|organism|cfu` lines; anything else is unrecoverable.
    struct PipeExtractor {
        tables: ReferenceTables,
    }

    impl ReportExtractor for PipeExtractor {
        fn extract(&self, raw_text: &str) -> Result<ExtractedReport, ExtractionError> {
            let parts: Vec<&str> = raw_text.split('|').collect();
            let [date, organism, cfu] = parts.as_slice() else {
                return Err(ExtractionError::Unrecoverable);
            };
            let date: CollectionDate = date.parse().map_err(|_| ExtractionError::Unrecoverable)?;
            let cfu: u64 = cfu.parse().map_err(|_| ExtractionError::Unrecoverable)?;
            let report = CultureReport::new(date, *organism, CfuCount::Measured(cfu), SpecimenType::Urine, &self.tables);
            let warnings = if date.is_known() { vec![] } else { vec![ExtractionWarning::DateMissing] };
            Ok(ExtractedReport {
                report,
                warnings,
                provenance: FieldProvenance::default(),
            })
        }
    }

    fn mock_processor(rules: ClinicalRules) -> CultureProcessor {
        let tables = ReferenceTables::builtin();
        let extractor = Box::new(PipeExtractor { tables: tables.clone() });
        CultureProcessor::new(extractor, rules, Arc::new(tables)).unwrap()
    }

    fn urine_text(date: &str, organism: &str, cfu: &str) -> String {
        format!("Urine culture\nDate: {date}\nOrganism: {organism}\nCFU/mL: {cfu}")
    }

    // -- Input contract -----------------------------------------------------

    #[test]
    fn empty_input_rejected() {
        let texts: [&str; 0] = [];
        assert!(matches!(CultureProcessor::builtin().assess(&texts), Err(ProcessError::NoReports)));
    }

    #[test]
    fn too_many_reports_rejected() {
        let texts = ["a", "b", "c", "d"];
        match CultureProcessor::builtin().assess(&texts) {
            Err(ProcessError::TooManyReports { count, max }) => {
                assert_eq!(count, 4);
                assert_eq!(max, 3);
            }
            other => panic!("expected TooManyReports, got {other:?}"),
        }
    }

    #[test]
    fn first_extraction_failure_aborts() {
        let texts = [
            urine_text("2026-01-01", "E. coli", "90,000"),
            "Patient seen, no lab data.".to_string(),
        ];
        let err = CultureProcessor::builtin().assess(&texts).unwrap_err();
        assert!(matches!(err, ProcessError::Extraction(ExtractionError::Unrecoverable)));
    }

    #[test]
    fn invalid_rules_rejected_at_construction() {
        let rules = ClinicalRules {
            max_reports: 0,
            ..ClinicalRules::default()
        };
        let tables = Arc::new(ReferenceTables::builtin());
        let extractor = Box::new(CultureExtractor::new(Arc::clone(&tables)));
        let result = CultureProcessor::new(extractor, rules, tables);
        assert!(matches!(result, Err(ProcessError::Config(_))));
    }

    #[test]
    fn with_tables_shares_one_table_set() {
        let tables = Arc::new(ReferenceTables::builtin());
        let processor = CultureProcessor::with_tables(ClinicalRules::default(), Arc::clone(&tables)).unwrap();
        assert!(std::ptr::eq(processor.tables(), &*tables));
        // Processor and extractor each hold a handle
        assert_eq!(Arc::strong_count(&tables), 3);
    }

    #[test]
    fn bundled_resources_match_builtin_behaviour() {
        let dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("resources");
        let processor = CultureProcessor::from_resources(ClinicalRules::default(), &dir).unwrap();
        let texts = [
            urine_text("2026-01-01", "E. coli", "90,000"),
            urine_text("2026-01-08", "Escherichia coli", "40,000"),
        ];
        let assessment = processor.assess(&texts).unwrap();
        assert!(assessment.trend.organism_persistent);
        assert_eq!(assessment.trend.organism_list, vec!["Escherichia coli"; 2]);
    }

    #[test]
    fn missing_resources_dir_is_reference_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = CultureProcessor::from_resources(ClinicalRules::default(), &dir.path().join("missing"));
        assert!(matches!(result, Err(ProcessError::Reference(_))));
    }

    // -- Ordering -----------------------------------------------------------

    #[test]
    fn reports_sorted_by_date_before_analysis() {
        let processor = mock_processor(ClinicalRules::default());
        let assessment = processor
            .assess(&[
                "2026-01-20|E. coli|40000",
                "2026-01-01|E. coli|90000",
                "2026-01-10|E. coli|60000",
            ])
            .unwrap();
        assert_eq!(assessment.trend.cfu_values, vec![90_000, 60_000, 40_000]);
        assert_eq!(assessment.trend.cfu_trend, CfuTrend::Decreasing);
    }

    #[test]
    fn unknown_dates_sort_last_and_stay_stable() {
        let processor = mock_processor(ClinicalRules::default());
        let assessment = processor
            .assess(&["unknown|E. coli|5000", "2026-01-10|E. coli|60000", "unknown|E. coli|7000"])
            .unwrap();
        assert_eq!(assessment.trend.cfu_values, vec![60_000, 5_000, 7_000]);
        assert!(assessment.warnings[0].is_empty());
        assert_eq!(assessment.warnings[1], vec![ExtractionWarning::DateMissing]);
        assert_eq!(assessment.warning_count(), 2);
    }

    #[test]
    fn max_reports_comes_from_rules() {
        let rules = ClinicalRules {
            max_reports: 4,
            ..ClinicalRules::default()
        };
        let assessment = mock_processor(rules)
            .assess(&[
                "2026-01-01|E. coli|90000",
                "2026-01-08|E. coli|70000",
                "2026-01-15|E. coli|30000",
                "2026-01-22|E. coli|10000",
            ])
            .unwrap();
        assert_eq!(assessment.reports.len(), 4);
    }

    // -- End to end ---------------------------------------------------------

    #[test]
    fn single_report_flags_insufficient_data() {
        let assessment = CultureProcessor::builtin()
            .assess(&[urine_text("2026-01-01", "E. coli", "120,000")])
            .unwrap();
        assert_eq!(assessment.trend.cfu_trend, CfuTrend::InsufficientData);
        assert!(assessment.hypothesis.has_flag(RiskFlag::InsufficientData));
        assert!(assessment.hypothesis.requires_clinician_review());
    }

    #[test]
    fn cleared_series_scores_ceiling() {
        let texts = [
            urine_text("2026-01-01", "E. coli", "120,000"),
            urine_text("2026-01-08", "E. coli", "40,000"),
            urine_text("2026-01-15", "E. coli", "800"),
        ];
        let assessment = CultureProcessor::builtin().assess(&texts).unwrap();
        assert_eq!(assessment.trend.cfu_trend, CfuTrend::Cleared);
        assert_eq!(assessment.hypothesis.confidence(), 0.95);
        assert!(!assessment.hypothesis.stewardship_alert());
        assert_eq!(assessment.review_flags(), vec![false, false, false]);
    }

    #[test]
    fn payload_carries_trend_and_hypothesis() {
        let texts = [
            urine_text("2026-01-01", "E. coli", "90,000"),
            urine_text("2026-01-08", "E. coli", "80,000"),
        ];
        let assessment = CultureProcessor::builtin().assess(&texts).unwrap();
        let payload = assessment.payload(Audience::Clinician);
        assert_eq!(payload.mode, Audience::Clinician);
        assert_eq!(payload.cfu_values, vec![90_000, 80_000]);
        assert_eq!(payload.cfu_deltas, vec![-10_000]);
        assert_eq!(payload.confidence, assessment.hypothesis.confidence());
        assert!(payload.requires_clinician_review.value());
    }
}
