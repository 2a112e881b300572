//! Projection handed to the external summarizer.
//!
//! Built only from `TrendResult` and `HypothesisResult`. There is no
//! constructor that takes a `CultureReport`, so report text cannot reach
//! this type. Free-text trend fields (`organism_list`,
//! `evolved_antibiotics`) are captured from the reports and stay out.

use serde::{Deserialize, Serialize};

use crate::models::{
    Audience, CfuTrend, ClinicianReviewRequired, CollectionDate, HypothesisResult,
    ResistanceMarker, RiskFlag, TrendResult,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentPayload {
    pub mode: Audience,
    pub cfu_trend: CfuTrend,
    pub cfu_values: Vec<u64>,
    pub cfu_deltas: Vec<i64>,
    pub organism_persistent: bool,
    pub resistance_evolution: bool,
    pub resistance_timeline: Vec<Vec<ResistanceMarker>>,
    pub any_contamination: bool,
    pub report_dates: Vec<CollectionDate>,
    pub multi_drug_resistance: bool,
    pub recurrent_organism_30d: bool,
    pub susceptibility_evolution: bool,
    pub interpretation: String,
    pub confidence: f64,
    pub risk_flags: Vec<RiskFlag>,
    pub stewardship_alert: bool,
    pub requires_clinician_review: ClinicianReviewRequired,
}

impl AssessmentPayload {
    pub fn build(mode: Audience, trend: &TrendResult, hypothesis: &HypothesisResult) -> Self {
        Self {
            mode,
            cfu_trend: trend.cfu_trend,
            cfu_values: trend.cfu_values.clone(),
            cfu_deltas: trend.cfu_deltas.clone(),
            organism_persistent: trend.organism_persistent,
            resistance_evolution: trend.resistance_evolution,
            resistance_timeline: trend.resistance_timeline.clone(),
            any_contamination: trend.any_contamination,
            report_dates: trend.report_dates.clone(),
            multi_drug_resistance: trend.multi_drug_resistance,
            recurrent_organism_30d: trend.recurrent_organism_30d,
            susceptibility_evolution: trend.susceptibility_evolution,
            interpretation: hypothesis.interpretation().to_string(),
            confidence: hypothesis.confidence(),
            risk_flags: hypothesis.risk_flags().to_vec(),
            stewardship_alert: hypothesis.stewardship_alert(),
            requires_clinician_review: ClinicianReviewRequired,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClinicalRules;
    use crate::intelligence::{hypothesis, reference::ReferenceTables, trend};
    use crate::models::{CfuCount, CultureReport, SpecimenType};

    const SECRET: &str = "Patient: Jane Roe, MRN 4471-22";

    fn make_payload(mode: Audience) -> AssessmentPayload {
        let tables = ReferenceTables::builtin();
        let reports = vec![
            CultureReport::new(
                "2026-01-01".parse().unwrap(),
                "Escherichia coli",
                CfuCount::Measured(90_000),
                SpecimenType::Urine,
                &tables,
            )
            .with_raw_text(SECRET),
            CultureReport::new(
                "2026-01-10".parse().unwrap(),
                "Escherichia coli",
                CfuCount::Measured(40_000),
                SpecimenType::Urine,
                &tables,
            )
            .with_raw_text(SECRET),
        ];
        let t = trend::analyze(&reports, &ClinicalRules::default(), &tables).unwrap();
        let h = hypothesis::score(&t, reports.len());
        AssessmentPayload::build(mode, &t, &h)
    }

    #[test]
    fn carries_exactly_the_boundary_fields() {
        let value = serde_json::to_value(make_payload(Audience::Clinician)).unwrap();
        let mut keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();

        let mut expected = vec![
            "mode",
            "cfu_trend",
            "cfu_values",
            "cfu_deltas",
            "organism_persistent",
            "resistance_evolution",
            "resistance_timeline",
            "any_contamination",
            "report_dates",
            "multi_drug_resistance",
            "recurrent_organism_30d",
            "susceptibility_evolution",
            "interpretation",
            "confidence",
            "risk_flags",
            "stewardship_alert",
            "requires_clinician_review",
        ];
        expected.sort_unstable();
        assert_eq!(keys, expected);
    }

    #[test]
    fn raw_text_never_reaches_payload() {
        let json = make_payload(Audience::Patient).to_json().unwrap();
        assert!(!json.contains("raw_text"));
        assert!(!json.contains("Jane Roe"));
        assert!(!json.contains("4471"));
    }

    #[test]
    fn mode_and_review_serialized() {
        let value = serde_json::to_value(make_payload(Audience::Patient)).unwrap();
        assert_eq!(value["mode"], "patient");
        assert_eq!(value["cfu_trend"], "decreasing");
        assert_eq!(value["requires_clinician_review"], true);
    }

    #[test]
    fn payload_deserializes_back() {
        let payload = make_payload(Audience::Clinician);
        let back: AssessmentPayload = serde_json::from_str(&payload.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn payload_with_review_false_is_rejected() {
        let mut value = serde_json::to_value(make_payload(Audience::Clinician)).unwrap();
        value["requires_clinician_review"] = serde_json::Value::Bool(false);
        assert!(serde_json::from_value::<AssessmentPayload>(value).is_err());
    }
}
