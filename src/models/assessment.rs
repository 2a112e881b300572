use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::enums::{CfuTrend, ResistanceMarker, RiskFlag};
use super::report::CollectionDate;

/// Temporal signal bundle computed over an ordered set of reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub cfu_trend: CfuTrend,
    pub cfu_values: Vec<u64>,
    /// `next - previous`; positive means the load went up.
    pub cfu_deltas: Vec<i64>,
    pub organism_persistent: bool,
    pub organism_list: Vec<String>,
    /// Marker-based OR susceptibility-based evolution.
    pub resistance_evolution: bool,
    pub resistance_timeline: Vec<Vec<ResistanceMarker>>,
    pub report_dates: Vec<CollectionDate>,
    pub any_contamination: bool,
    pub multi_drug_resistance: bool,
    pub recurrent_organism_30d: bool,
    pub susceptibility_evolution: bool,
    pub evolved_antibiotics: Vec<String>,
}

/// Marker for the clinician-review contract.
///
/// Has exactly one value, serializes as `true`, and refuses to deserialize
/// from anything else. There is no way to express "review not required".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ClinicianReviewRequired;

impl ClinicianReviewRequired {
    pub const fn value(&self) -> bool {
        true
    }
}

impl Serialize for ClinicianReviewRequired {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(true)
    }
}

impl<'de> Deserialize<'de> for ClinicianReviewRequired {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if bool::deserialize(deserializer)? {
            Ok(Self)
        } else {
            Err(serde::de::Error::custom(
                "requires_clinician_review must be true",
            ))
        }
    }
}

/// Scored hypothesis. Only the hypothesis engine constructs one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HypothesisResult {
    interpretation: String,
    confidence: f64,
    risk_flags: Vec<RiskFlag>,
    stewardship_alert: bool,
    requires_clinician_review: ClinicianReviewRequired,
}

impl HypothesisResult {
    pub(crate) fn new(
        interpretation: String,
        confidence: f64,
        risk_flags: Vec<RiskFlag>,
        stewardship_alert: bool,
    ) -> Self {
        Self {
            interpretation,
            confidence,
            risk_flags,
            stewardship_alert,
            requires_clinician_review: ClinicianReviewRequired,
        }
    }

    pub fn interpretation(&self) -> &str {
        &self.interpretation
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn risk_flags(&self) -> &[RiskFlag] {
        &self.risk_flags
    }

    pub fn has_flag(&self, flag: RiskFlag) -> bool {
        self.risk_flags.contains(&flag)
    }

    pub fn stewardship_alert(&self) -> bool {
        self.stewardship_alert
    }

    pub fn requires_clinician_review(&self) -> bool {
        self.requires_clinician_review.value()
    }
}
