use std::sync::LazyLock;

use regex::Regex;

use crate::models::ResistanceMarker;

static RE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(ESBL|CRE|MRSA|VRE|CRKP)\b").unwrap());

/// Lowercase cues that cancel a nearby marker ("no ESBL detected").
const NEGATION_CUES: &[&str] = &[
    "no ",
    "not ",
    "none",
    "without",
    "negative for",
    "undetected",
    "ruled out",
];

/// Characters inspected on each side of a marker for negation cues.
const NEGATION_WINDOW: usize = 60;

/// High-risk resistance markers mentioned without a nearby negation.
/// Deduplicated, first-seen order.
pub fn extract_markers(text: &str) -> Vec<ResistanceMarker> {
    let mut found: Vec<ResistanceMarker> = Vec::new();
    for m in RE_MARKER.find_iter(text) {
        if is_negated(text, m.start(), m.end()) {
            tracing::debug!(marker = %m.as_str().to_uppercase(), "Marker negated by context");
            continue;
        }
        if let Some(marker) = ResistanceMarker::from_code(m.as_str()) {
            if !found.contains(&marker) {
                found.push(marker);
            }
        }
    }
    found
}

fn is_negated(text: &str, start: usize, end: usize) -> bool {
    let lo = text[..start]
        .char_indices()
        .rev()
        .nth(NEGATION_WINDOW - 1)
        .map_or(0, |(i, _)| i);
    let hi = text[end..]
        .char_indices()
        .nth(NEGATION_WINDOW)
        .map_or(text.len(), |(i, _)| end + i);
    let context = text[lo..hi].to_lowercase();
    NEGATION_CUES.iter().any(|cue| context.contains(cue))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_markers_found() {
        assert_eq!(
            extract_markers("Organism: Klebsiella pneumoniae\n\nESBL POSITIVE\n\nCRKP confirmed"),
            vec![ResistanceMarker::Esbl, ResistanceMarker::Crkp]
        );
    }

    #[test]
    fn negated_marker_rejected() {
        assert!(extract_markers("No ESBL detected").is_empty());
        assert!(extract_markers("MRSA ruled out by PCR").is_empty());
        assert!(extract_markers("Screen negative for VRE").is_empty());
    }

    #[test]
    fn case_insensitive_and_deduplicated() {
        let text = format!("esbl producer.{}ESBL again", "\n".repeat(70));
        assert_eq!(extract_markers(&text), vec![ResistanceMarker::Esbl]);
    }

    #[test]
    fn whole_words_only() {
        assert!(extract_markers("CREATININE 1.1 mg/dL, PREVALENCE data").is_empty());
    }

    #[test]
    fn window_counts_characters_not_bytes() {
        // 50 characters but 97 bytes between the cue and the marker
        let text = format!("no {}ESBL", "·".repeat(47));
        assert!(extract_markers(&text).is_empty());

        let after = format!("ESBL{}not confirmed", "·".repeat(50));
        assert!(extract_markers(&after).is_empty());
    }

    #[test]
    fn cue_beyond_window_is_ignored() {
        let text = format!("no {}ESBL", "·".repeat(70));
        assert_eq!(extract_markers(&text), vec![ResistanceMarker::Esbl]);
    }

    #[test]
    fn window_is_char_boundary_safe() {
        let text = format!("{}ESBL positive{}", "é".repeat(40), "ü".repeat(40));
        assert_eq!(extract_markers(&text), vec![ResistanceMarker::Esbl]);
    }
}
