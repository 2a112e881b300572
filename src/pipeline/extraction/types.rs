use std::fmt;

use serde::Serialize;

use super::ExtractionError;
use crate::models::{CollectionDate, CultureReport};

/// Report extraction entry point. Implementations must be deterministic:
/// the same text always yields the same report.
pub trait ReportExtractor {
    fn extract(&self, raw_text: &str) -> Result<ExtractedReport, ExtractionError>;
}

/// A structured report plus everything the extractor had to guess.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedReport {
    pub report: CultureReport,
    pub warnings: Vec<ExtractionWarning>,
    pub provenance: FieldProvenance,
}

/// Which strategy resolved each field (`None` = fell back to a sentinel).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FieldProvenance {
    pub organism: Option<OrganismSource>,
    pub cfu: Option<CfuStrategy>,
    pub date: Option<DateSource>,
    pub specimen: Option<SpecimenStrategy>,
}

/// Soft degradations. None of these abort extraction; they mark the
/// report for human review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionWarning {
    /// No organism found; recorded as "unknown".
    OrganismDefaulted,
    /// No CFU found; recorded as not reported (0).
    CfuDefaulted,
    /// CFU taken from a bare large number with no unit or label.
    CfuFromBareNumber { value: u64 },
    /// No date found; recorded as unknown.
    DateMissing,
    /// Day and month could be swapped; month-first was assumed.
    DateAmbiguous { assumed: CollectionDate },
    /// A date-shaped string was found but is not a calendar date.
    DateInvalid,
    /// Specimen type could not be determined.
    SpecimenUnknown,
}

impl fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OrganismDefaulted => f.write_str("Organism could not be parsed; using 'unknown'"),
            Self::CfuDefaulted => f.write_str("CFU/mL could not be parsed; defaulting to 0"),
            Self::CfuFromBareNumber { value } => {
                write!(f, "CFU parsed from bare number {value}; review report text")
            }
            Self::DateMissing => f.write_str("Collection date not found"),
            Self::DateAmbiguous { assumed } => {
                write!(f, "Collection date is ambiguous; assumed month-first ({assumed})")
            }
            Self::DateInvalid => f.write_str("Collection date is not a valid calendar date"),
            Self::SpecimenUnknown => f.write_str("Specimen type could not be determined"),
        }
    }
}

/// Organism resolution, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganismSource {
    OrganismLabel,
    OrganismUpperLabel,
    OrganismIdentifiedLabel,
    IsolatedLabel,
    IdentificationLabel,
    CultureResultLabel,
    AliasScan,
}

/// CFU resolution, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CfuStrategy {
    CfuLabel,
    CountLabel,
    TrailingUnit,
    Threshold,
    GroupedNumber,
    TooNumerous,
    NoGrowth,
    Scientific,
    BareNumber,
}

/// Date resolution, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    CollectedLabel,
    DateLabel,
    BareIso,
    SlashDate,
    DashDate,
}

/// Specimen resolution, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecimenStrategy {
    Heading,
    TableCell,
    Label,
    TypeThenNoun,
    NounThenType,
    Keyword,
}

/// Susceptibility matcher that produced a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SusceptibilityFormat {
    TableRow,
    Inline,
    Columnar,
}
