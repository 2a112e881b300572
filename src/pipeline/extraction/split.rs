//! Multi-report documents and review heuristics.
//!
//! A converted PDF or a pasted text area may hold several reports. These
//! helpers cut such input into one block per report before extraction.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{CfuCount, CultureReport, SpecimenType};

static RE_SEPARATOR_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n(?:-{3,}|={3,})[ \t]*\r?\n").unwrap());
static RE_REPORT_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^#{1,2}[ \t]*MICROBIOLOGY\s+REPORT\b").unwrap());
static RE_COLLECTED_ISO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Collected:\s*(\d{4}-\d{2}-\d{2})").unwrap());
static RE_REPORT_N: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?im)^Report\s+\d+").unwrap());
static RE_DATE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Date:\s*\d{4}-\d{2}-\d{2}").unwrap());

/// Split a converted document into report blocks.
///
/// 1. `---` / `===` separator lines.
/// 2. `# MICROBIOLOGY REPORT` headings. Text before the first heading is
///    dropped, and block *n* is prefixed with the *n*-th `Collected:` date
///    in the document so each block carries its own date.
/// 3. Otherwise the whole document is one block.
///
/// Section headings inside a single report ("## CULTURE RESULT") are never
/// treated as boundaries.
pub fn split_report_blocks(text: &str) -> Vec<String> {
    let separated: Vec<&str> = RE_SEPARATOR_LINE.split(text).collect();
    if separated.len() > 1 {
        return non_empty_trimmed(separated);
    }

    let heading_starts: Vec<usize> = RE_REPORT_HEADING.find_iter(text).map(|m| m.start()).collect();
    if !heading_starts.is_empty() {
        let dates: Vec<&str> = RE_COLLECTED_ISO
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .collect();

        let mut blocks = Vec::new();
        for (i, section) in sections(text, &heading_starts).into_iter().enumerate() {
            let section = section.trim();
            if section.is_empty() {
                continue;
            }
            match dates.get(i) {
                Some(date) => blocks.push(format!("Collected: {date}\n\n{section}")),
                None => blocks.push(section.to_string()),
            }
        }
        tracing::debug!(blocks = blocks.len(), dates = dates.len(), "Split on report headings");
        return blocks;
    }

    single_block(text)
}

/// Split manually entered text into report blocks.
///
/// Tries, in order: lines starting `Report N`, blank lines, then repeated
/// `Date: YYYY-MM-DD` lines. Falls back to one block.
pub fn split_manual_reports(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let report_starts: Vec<usize> = RE_REPORT_N
        .find_iter(text)
        .map(|m| m.start())
        .filter(|&start| start > 0)
        .collect();
    if !report_starts.is_empty() {
        let mut starts = vec![0];
        starts.extend(report_starts);
        return non_empty_trimmed(sections(text, &starts));
    }

    let paragraphs: Vec<&str> = text.split("\n\n").collect();
    if paragraphs.len() > 1 {
        return non_empty_trimmed(paragraphs);
    }

    let mut date_starts: Vec<usize> = RE_DATE_LINE.find_iter(text).map(|m| m.start()).collect();
    if date_starts.len() > 1 {
        if date_starts[0] != 0 {
            date_starts.insert(0, 0);
        }
        return non_empty_trimmed(sections(text, &date_starts));
    }

    vec![text.to_string()]
}

/// True when a report looks too generic to trust without a human check.
pub fn needs_review(report: &CultureReport) -> bool {
    let specimen = report.specimen_type();
    !report.has_known_organism()
        || !report.date().is_known()
        || !matches!(specimen, SpecimenType::Urine | SpecimenType::Stool)
        || (report.cfu() == CfuCount::NotReported && specimen != SpecimenType::Stool)
}

/// Slices of `text` from each start offset to the next.
fn sections<'t>(text: &'t str, starts: &[usize]) -> Vec<&'t str> {
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            &text[start..end]
        })
        .collect()
}

fn non_empty_trimmed<'t>(parts: impl IntoIterator<Item = &'t str>) -> Vec<String> {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn single_block(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        Vec::new()
    } else {
        vec![text.to_string()]
    }
}
