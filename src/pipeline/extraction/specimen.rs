use std::sync::LazyLock;

use regex::Regex;

use super::types::SpecimenStrategy;
use crate::models::SpecimenType;

/// Captured-word patterns, in priority order.
static CAPTURE_PATTERNS: LazyLock<Vec<(SpecimenStrategy, Regex)>> = LazyLock::new(|| {
    [
        // "## Urine Culture", "**Urine Culture**", "__Stool Culture__"
        (
            SpecimenStrategy::Heading,
            r"(?im)(?:^#{1,3}\s*|\*{2}|_{2}|##\s*)\s*(urine|stool|wound|blood|sputum)\s+culture\b",
        ),
        // "| Specimen Type | Urine |"
        (
            SpecimenStrategy::TableCell,
            r"(?i)\|\s*Specimen\s+(?:Type|Source)\s*\|\s*(urine|stool|wound|blood)\s*\|",
        ),
        (
            SpecimenStrategy::Label,
            r"(?i)(?:Specimen|Sample|Source|Type)[\s:]+(urine|stool|wound|blood|urinary|fecal|faecal)",
        ),
        (
            SpecimenStrategy::TypeThenNoun,
            r"(?i)(urine|stool|wound|blood)\s*(?:culture|specimen|sample|test)",
        ),
        (
            SpecimenStrategy::NounThenType,
            r"(?i)(?:culture|specimen|sample|test)\s*(?:type)?[\s:]+(urine|stool|wound|blood)",
        ),
    ]
    .into_iter()
    .map(|(strategy, pattern)| (strategy, Regex::new(pattern).unwrap()))
    .collect()
});

static RE_URINE_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(urine|urinary|bladder|catheter)\b").unwrap());
static RE_STOOL_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(stool|fecal|faecal|feces|gi)\b").unwrap());

/// Resolve the specimen type. `None` when nothing matched.
pub fn extract_specimen(text: &str) -> Option<(SpecimenType, SpecimenStrategy)> {
    let text = text.trim();

    for (strategy, pattern) in CAPTURE_PATTERNS.iter() {
        let Some(word) = pattern.captures(text).and_then(|c| c.get(1)) else {
            continue;
        };
        if let Some(specimen) = SpecimenType::from_word(word.as_str()) {
            tracing::debug!(strategy = ?strategy, specimen = %specimen, "Specimen matched");
            return Some((specimen, *strategy));
        }
    }

    if RE_URINE_KEYWORD.is_match(text) {
        return Some((SpecimenType::Urine, SpecimenStrategy::Keyword));
    }
    if RE_STOOL_KEYWORD.is_match(text) {
        return Some((SpecimenType::Stool, SpecimenStrategy::Keyword));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specimen(text: &str) -> Option<(SpecimenType, SpecimenStrategy)> {
        extract_specimen(text)
    }

    #[test]
    fn markdown_heading() {
        assert_eq!(
            specimen("## Urine Culture\nOrganism: E. coli"),
            Some((SpecimenType::Urine, SpecimenStrategy::Heading))
        );
        assert_eq!(
            specimen("**Sputum Culture**"),
            Some((SpecimenType::Sputum, SpecimenStrategy::Heading))
        );
    }

    #[test]
    fn table_cell() {
        assert_eq!(
            specimen("| Specimen Type | Stool |\n| Collected | 2026-01-01 |"),
            Some((SpecimenType::Stool, SpecimenStrategy::TableCell))
        );
    }

    #[test]
    fn labelled_variants_normalize() {
        assert_eq!(
            specimen("Specimen: Urinary, midstream"),
            Some((SpecimenType::Urine, SpecimenStrategy::Label))
        );
        assert_eq!(
            specimen("Source: faecal"),
            Some((SpecimenType::Stool, SpecimenStrategy::Label))
        );
    }

    #[test]
    fn generic_phrasing() {
        assert_eq!(
            specimen("Wound swab culture pending; blood sample drawn"),
            Some((SpecimenType::Blood, SpecimenStrategy::TypeThenNoun))
        );
        assert_eq!(
            specimen("Culture: wound"),
            Some((SpecimenType::Wound, SpecimenStrategy::NounThenType))
        );
    }

    #[test]
    fn keyword_fallback() {
        assert_eq!(
            specimen("Indwelling catheter, collected by nurse"),
            Some((SpecimenType::Urine, SpecimenStrategy::Keyword))
        );
        assert_eq!(
            specimen("GI panel requested"),
            Some((SpecimenType::Stool, SpecimenStrategy::Keyword))
        );
    }

    #[test]
    fn unknown_specimen() {
        assert_eq!(specimen("Organism: E. coli\nCFU/mL: 10,000"), None);
    }
}
