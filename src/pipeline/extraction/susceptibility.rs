use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::types::SusceptibilityFormat;
use crate::models::{AntibioticSusceptibility, Interpretation};

/// `| Antibiotic | MIC | S/I/R | Breakpoints | Notes |`
static RE_TABLE_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\|\s*([^|]+?)\s*\|\s*([^|]+?)\s*\|\s*(Sensitive|Intermediate|Resistant|S|I|R)\s*\|\s*([^|]*)\|\s*([^|]*)\|",
    )
    .unwrap()
});

/// `Antibiotic: Ciprofloxacin, MIC: 0.25, Interpretation: S`
static RE_INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:Antibiotic|Antimicrobial|Agent)[\s:]+([^\n]+?)[\s,]+(?:MIC)?[\s:]*([\d<>.=\s]+(?:ug/mL|mcg/mL|mg/L)?)[\s,]+(?:Interpretation)?[\s:]*(S|I|R|Sensitive|Intermediate|Resistant)",
    )
    .unwrap()
});

/// `Ciprofloxacin   <=0.25   S`, one row per line.
static RE_COLUMNAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*([A-Za-z][A-Za-z \t\-]*?)[ \t]+([<>=\d\.]+[ \t]*(?:ug/ml|mcg/ml|mg/l)?)[ \t]+(S|I|R|Sensitive|Intermediate|Resistant)\b",
    )
    .unwrap()
});

/// Header words that the row matchers can mistake for an antibiotic.
const HEADER_TOKENS: &[&str] = &["antibiotic", "agent", "drug", "name"];

const MIN_ANTIBIOTIC_LEN: usize = 3;

/// Run all three matchers in order and union the results. Deduplicated by
/// lowercased antibiotic name across matchers; first occurrence wins.
pub fn extract_susceptibility(text: &str) -> Vec<AntibioticSusceptibility> {
    let mut profile: Vec<AntibioticSusceptibility> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    let matchers: [(SusceptibilityFormat, &Regex); 3] = [
        (SusceptibilityFormat::TableRow, &*RE_TABLE_ROW),
        (SusceptibilityFormat::Inline, &*RE_INLINE),
        (SusceptibilityFormat::Columnar, &*RE_COLUMNAR),
    ];

    for (format, re) in matchers {
        let before = profile.len();
        for caps in re.captures_iter(text) {
            let Some(row) = parse_row(&caps, format) else {
                continue;
            };
            if seen.insert(row.antibiotic.to_lowercase()) {
                profile.push(row);
            }
        }
        if profile.len() > before {
            tracing::debug!(format = ?format, rows = profile.len() - before, "Susceptibility rows matched");
        }
    }

    profile
}

fn parse_row(caps: &Captures<'_>, format: SusceptibilityFormat) -> Option<AntibioticSusceptibility> {
    let field = |i: usize| caps.get(i).map(|m| m.as_str().trim()).unwrap_or_default();

    let antibiotic = field(1);
    if antibiotic.chars().count() < MIN_ANTIBIOTIC_LEN
        || HEADER_TOKENS.contains(&antibiotic.to_lowercase().as_str())
    {
        return None;
    }
    let interpretation = Interpretation::from_label(field(3))?;

    let mut row = AntibioticSusceptibility::new(antibiotic, field(2), interpretation);
    if format == SusceptibilityFormat::TableRow {
        row.breakpoints = field(4).to_string();
        row.notes = field(5).to_string();
    }
    Some(row)
}

/// `"N antibiotics: xS/yI/zR"`, or empty for an empty profile.
pub fn susceptibility_summary(profile: &[AntibioticSusceptibility]) -> String {
    if profile.is_empty() {
        return String::new();
    }
    let count = |target: Interpretation| profile.iter().filter(|a| a.interpretation == target).count();
    format!(
        "{} antibiotics: {}S/{}I/{}R",
        profile.len(),
        count(Interpretation::Sensitive),
        count(Interpretation::Intermediate),
        count(Interpretation::Resistant),
    )
}
