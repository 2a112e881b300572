use std::sync::LazyLock;

use regex::Regex;

use super::types::OrganismSource;
use crate::intelligence::reference::ReferenceTables;

/// Labelled organism patterns, tried in order. The capture runs to the end
/// of the line and must not start with a dot.
static LABELED_PATTERNS: LazyLock<Vec<(OrganismSource, Regex)>> = LazyLock::new(|| {
    [
        (OrganismSource::OrganismLabel, r"(?i)Organism:\s*([^.].*?)(?:\n|$)"),
        (OrganismSource::OrganismUpperLabel, r"ORGANISM:\s*([^.].*?)(?:\n|$)"),
        (OrganismSource::OrganismIdentifiedLabel, r"(?i)Organism\s+identified:\s*([^.].*?)(?:\n|$)"),
        (OrganismSource::IsolatedLabel, r"(?i)Isolated:\s*([^.].*?)(?:\n|$)"),
        (OrganismSource::IdentificationLabel, r"(?i)Identification:\s*([^.].*?)(?:\n|$)"),
        (OrganismSource::CultureResultLabel, r"(?i)Culture\s+results?:\s*([^.].*?)(?:\n|$)"),
    ]
    .into_iter()
    .map(|(source, pattern)| (source, Regex::new(pattern).unwrap()))
    .collect()
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Sentence end inside a capture: `;`, `!`, `?`, or a dot followed by
/// whitespace and a capital letter. A dot before lowercase ("E. coli") is
/// kept.
static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[;!?]|\.\s+[A-Z]").unwrap());

/// Resolve the organism name, labelled forms first, then a longest-alias
/// substring scan over the whole text.
pub fn extract_organism(text: &str, tables: &ReferenceTables) -> Option<(String, OrganismSource)> {
    for (source, pattern) in LABELED_PATTERNS.iter() {
        let Some(capture) = pattern.captures(text).and_then(|c| c.get(1)) else {
            continue;
        };
        let cleaned = clean_capture(capture.as_str());
        if cleaned.is_empty() {
            continue;
        }
        tracing::debug!(strategy = ?source, "Organism matched");
        return Some((tables.normalize_organism(&cleaned), *source));
    }

    let found = tables.scan_for_alias(text)?;
    tracing::debug!(strategy = ?OrganismSource::AliasScan, "Organism matched");
    Some((found, OrganismSource::AliasScan))
}

/// Collapse whitespace and cut at the first sentence end.
pub fn clean_capture(raw: &str) -> String {
    let collapsed = WHITESPACE.replace_all(raw.trim(), " ");
    let cut = match SENTENCE_END.find(&collapsed) {
        Some(m) => &collapsed[..m.start()],
        None => &collapsed[..],
    };
    cut.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Option<(String, OrganismSource)> {
        extract_organism(text, &ReferenceTables::builtin())
    }

    #[test]
    fn labelled_alias_is_normalized() {
        let (name, source) = extract("Specimen: Urine\nOrganism: E. coli\nCFU/mL: 120,000").unwrap();
        assert_eq!(name, "Escherichia coli");
        assert_eq!(source, OrganismSource::OrganismLabel);
    }

    #[test]
    fn dotted_abbreviation_survives_cleanup() {
        assert_eq!(clean_capture("E. coli"), "E. coli");
        assert_eq!(clean_capture("E.   coli   "), "E. coli");
    }

    #[test]
    fn capture_cut_at_sentence_end() {
        assert_eq!(clean_capture("Klebsiella pneumoniae; see note"), "Klebsiella pneumoniae");
        assert_eq!(clean_capture("Proteus mirabilis. Repeat culture advised"), "Proteus mirabilis");
        assert_eq!(clean_capture("Enterococcus faecalis!"), "Enterococcus faecalis");
    }

    #[test]
    fn later_labels_used_when_earlier_absent() {
        let (name, source) = extract("Isolated: Pseudomonas\nCount: 60,000").unwrap();
        assert_eq!(name, "Pseudomonas aeruginosa");
        assert_eq!(source, OrganismSource::IsolatedLabel);

        let (name, source) = extract("Culture results: Mixed growth").unwrap();
        assert_eq!(name, "mixed flora");
        assert_eq!(source, OrganismSource::CultureResultLabel);
    }

    #[test]
    fn organism_identified_label() {
        let (name, source) = extract("Organism identified: Staph aureus").unwrap();
        assert_eq!(name, "Staphylococcus aureus");
        assert_eq!(source, OrganismSource::OrganismIdentifiedLabel);
    }

    #[test]
    fn unknown_species_kept_with_capital() {
        let (name, _) = extract("Organism: citrobacter freundii").unwrap();
        assert_eq!(name, "Citrobacter freundii");
    }

    #[test]
    fn alias_scan_fallback() {
        let (name, source) =
            extract("Heavy growth of klebsiella pneumoniae, >100,000 CFU/mL").unwrap();
        assert_eq!(name, "Klebsiella pneumoniae");
        assert_eq!(source, OrganismSource::AliasScan);
    }

    #[test]
    fn nothing_found() {
        assert!(extract("CFU/mL: 50,000\nDate: 2026-01-01").is_none());
    }
}
