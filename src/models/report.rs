use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::enums::{Interpretation, ResistanceMarker, SpecimenType};
use super::ModelError;
use crate::intelligence::reference::ReferenceTables;

/// Organism placeholder when nothing could be resolved.
pub const UNKNOWN_ORGANISM: &str = "unknown";

/// Numeric stand-in for "too numerous to count" wherever a plain CFU value is needed.
pub const TNTC_SENTINEL: u64 = 999_999;

// ---------------------------------------------------------------------------
// CfuCount
// ---------------------------------------------------------------------------

/// Colony-forming units per mL, with the sentinel cases made explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CfuCount {
    /// Report states no growth / negative culture.
    NoGrowth,
    /// An explicit count.
    Measured(u64),
    /// "TNTC" / "too numerous to count".
    TooNumerousToCount,
    /// Nothing recoverable from the text. Counts as 0 downstream.
    NotReported,
}

impl CfuCount {
    /// Plain numeric value used by the trend stage.
    pub fn value(&self) -> u64 {
        match self {
            Self::NoGrowth | Self::NotReported => 0,
            Self::Measured(n) => *n,
            Self::TooNumerousToCount => TNTC_SENTINEL,
        }
    }

    pub fn is_reported(&self) -> bool {
        !matches!(self, Self::NotReported)
    }
}

impl fmt::Display for CfuCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoGrowth => f.write_str("no growth"),
            Self::Measured(n) => write!(f, "{n}"),
            Self::TooNumerousToCount => f.write_str("TNTC"),
            Self::NotReported => f.write_str("not reported"),
        }
    }
}

// ---------------------------------------------------------------------------
// CollectionDate
// ---------------------------------------------------------------------------

/// Specimen collection date. Serialized as `YYYY-MM-DD` or `"unknown"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CollectionDate(Option<NaiveDate>);

impl CollectionDate {
    pub const UNKNOWN_LABEL: &'static str = "unknown";

    pub fn known(date: NaiveDate) -> Self {
        Self(Some(date))
    }

    pub const fn unknown() -> Self {
        Self(None)
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.0
    }

    pub fn is_known(&self) -> bool {
        self.0.is_some()
    }

    /// Whole days from `self` to `later`; `None` when either side is unknown.
    pub fn days_until(&self, later: &CollectionDate) -> Option<i64> {
        Some((later.0? - self.0?).num_days())
    }
}

impl From<NaiveDate> for CollectionDate {
    fn from(date: NaiveDate) -> Self {
        Self::known(date)
    }
}

impl fmt::Display for CollectionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            None => f.write_str(Self::UNKNOWN_LABEL),
        }
    }
}

impl FromStr for CollectionDate {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(Self::UNKNOWN_LABEL) {
            return Ok(Self::unknown());
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self::known)
            .map_err(|_| ModelError::InvalidDate(s.to_string()))
    }
}

impl Serialize for CollectionDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CollectionDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// AntibioticSusceptibility
// ---------------------------------------------------------------------------

/// One antimicrobial test result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntibioticSusceptibility {
    pub antibiotic: String,
    /// Minimum inhibitory concentration as printed (e.g. "<= 0.25").
    pub mic: String,
    pub interpretation: Interpretation,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub breakpoints: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

impl AntibioticSusceptibility {
    pub fn new(antibiotic: impl Into<String>, mic: impl Into<String>, interpretation: Interpretation) -> Self {
        Self {
            antibiotic: antibiotic.into(),
            mic: mic.into(),
            interpretation,
            breakpoints: String::new(),
            notes: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// CultureReport
// ---------------------------------------------------------------------------

/// One structured lab report.
///
/// Fields are read-only after construction. The contamination flag is
/// derived from the organism name and cannot be set directly. `raw_text`
/// is kept for audit only and is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CultureReport {
    date: CollectionDate,
    organism: String,
    cfu: CfuCount,
    resistance_markers: Vec<ResistanceMarker>,
    susceptibility_profile: Vec<AntibioticSusceptibility>,
    specimen_type: SpecimenType,
    contamination_flag: bool,
    #[serde(skip_serializing)]
    raw_text: String,
}

impl CultureReport {
    pub fn new(
        date: CollectionDate,
        organism: impl Into<String>,
        cfu: CfuCount,
        specimen_type: SpecimenType,
        tables: &ReferenceTables,
    ) -> Self {
        let organism = organism.into();
        let organism = if organism.trim().is_empty() {
            UNKNOWN_ORGANISM.to_string()
        } else {
            organism.trim().to_string()
        };
        let contamination_flag = tables.is_contamination(&organism);

        Self {
            date,
            organism,
            cfu,
            resistance_markers: Vec::new(),
            susceptibility_profile: Vec::new(),
            specimen_type,
            contamination_flag,
            raw_text: String::new(),
        }
    }

    /// Markers are deduplicated, first-seen order preserved.
    pub fn with_resistance_markers(mut self, markers: impl IntoIterator<Item = ResistanceMarker>) -> Self {
        self.resistance_markers.clear();
        for marker in markers {
            if !self.resistance_markers.contains(&marker) {
                self.resistance_markers.push(marker);
            }
        }
        self
    }

    pub fn with_susceptibility_profile(mut self, profile: Vec<AntibioticSusceptibility>) -> Self {
        self.susceptibility_profile = profile;
        self
    }

    pub fn with_raw_text(mut self, raw_text: impl Into<String>) -> Self {
        self.raw_text = raw_text.into();
        self
    }

    pub fn date(&self) -> CollectionDate {
        self.date
    }

    pub fn organism(&self) -> &str {
        &self.organism
    }

    pub fn cfu(&self) -> CfuCount {
        self.cfu
    }

    pub fn resistance_markers(&self) -> &[ResistanceMarker] {
        &self.resistance_markers
    }

    pub fn susceptibility_profile(&self) -> &[AntibioticSusceptibility] {
        &self.susceptibility_profile
    }

    pub fn specimen_type(&self) -> SpecimenType {
        self.specimen_type
    }

    pub fn contamination_flag(&self) -> bool {
        self.contamination_flag
    }

    /// Source text, for audit and review screens only.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn has_known_organism(&self) -> bool {
        self.organism != UNKNOWN_ORGANISM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> ReferenceTables {
        ReferenceTables::builtin()
    }

    #[test]
    fn cfu_sentinels_map_to_values() {
        assert_eq!(CfuCount::NoGrowth.value(), 0);
        assert_eq!(CfuCount::NotReported.value(), 0);
        assert_eq!(CfuCount::Measured(120_000).value(), 120_000);
        assert_eq!(CfuCount::TooNumerousToCount.value(), 999_999);
        assert!(!CfuCount::NotReported.is_reported());
        assert!(CfuCount::NoGrowth.is_reported());
    }

    #[test]
    fn collection_date_serializes_unknown() {
        let json = serde_json::to_string(&CollectionDate::unknown()).unwrap();
        assert_eq!(json, "\"unknown\"");

        let date: CollectionDate = serde_json::from_str("\"2026-01-20\"").unwrap();
        assert_eq!(date.to_string(), "2026-01-20");
    }

    #[test]
    fn collection_date_rejects_garbage() {
        assert!("2026-13-45".parse::<CollectionDate>().is_err());
        assert!(serde_json::from_str::<CollectionDate>("\"soon\"").is_err());
    }

    #[test]
    fn days_until_needs_both_dates() {
        let a: CollectionDate = "2026-02-08".parse().unwrap();
        let b: CollectionDate = "2026-02-20".parse().unwrap();
        assert_eq!(a.days_until(&b), Some(12));
        assert_eq!(a.days_until(&CollectionDate::unknown()), None);
    }

    #[test]
    fn empty_organism_falls_back_to_unknown() {
        let report = CultureReport::new(
            CollectionDate::unknown(),
            "   ",
            CfuCount::Measured(5000),
            SpecimenType::Urine,
            &tables(),
        );
        assert_eq!(report.organism(), UNKNOWN_ORGANISM);
        assert!(!report.has_known_organism());
    }

    #[test]
    fn contamination_is_derived_from_organism() {
        let report = CultureReport::new(
            CollectionDate::unknown(),
            "mixed flora",
            CfuCount::Measured(5000),
            SpecimenType::Urine,
            &tables(),
        );
        assert!(report.contamination_flag());

        let clean = CultureReport::new(
            CollectionDate::unknown(),
            "Escherichia coli",
            CfuCount::Measured(5000),
            SpecimenType::Urine,
            &tables(),
        );
        assert!(!clean.contamination_flag());
    }

    #[test]
    fn markers_are_deduplicated_in_order() {
        let report = CultureReport::new(
            CollectionDate::unknown(),
            "Klebsiella pneumoniae",
            CfuCount::Measured(75_000),
            SpecimenType::Urine,
            &tables(),
        )
        .with_resistance_markers([
            ResistanceMarker::Esbl,
            ResistanceMarker::Cre,
            ResistanceMarker::Esbl,
        ]);
        assert_eq!(
            report.resistance_markers(),
            &[ResistanceMarker::Esbl, ResistanceMarker::Cre]
        );
    }

    #[test]
    fn raw_text_never_serialized() {
        let report = CultureReport::new(
            "2026-01-01".parse().unwrap(),
            "Escherichia coli",
            CfuCount::Measured(120_000),
            SpecimenType::Urine,
            &tables(),
        )
        .with_raw_text("Patient: Jane Roe\nOrganism: E. coli");

        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains("raw_text"));
        assert!(!json.contains("Jane Roe"));
        assert_eq!(report.raw_text(), "Patient: Jane Roe\nOrganism: E. coli");
    }
}
