use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::types::DateSource;

static RE_COLLECTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Collected:\s*(\d{4}-\d{2}-\d{2}|\d{2}/\d{2}/\d{4}|\d{2}-\d{2}-\d{4})").unwrap()
});
static RE_DATE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:Date|Collected|Reported|Specimen\s+Date|Collection\s+Date|Date\s+Collected|Date\s+Reported)[\s:]*[\*_]*[\s:]+(\d{4}-\d{2}-\d{2}|\d{2}/\d{2}/\d{4}|\d{2}-\d{2}-\d{4})",
    )
    .unwrap()
});
static RE_BARE_ISO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").unwrap());
static RE_SLASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{2}/\d{2}/\d{4})\b").unwrap());
static RE_DASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{2}-\d{2}-\d{4})\b").unwrap());

const BIRTH_DATE_LABEL: &str = "DATE OF BIRTH";

/// Bare ISO dates closer than this (in bytes) to a birth-date label are skipped.
const BIRTH_DATE_PROXIMITY: usize = 50;

/// Outcome of date resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateExtraction {
    Found {
        date: NaiveDate,
        source: DateSource,
        /// Both leading groups were <= 12 and differed; month-first assumed.
        ambiguous: bool,
    },
    /// A date-shaped string that is not a calendar date.
    Invalid { source: DateSource },
    /// Every bare ISO date sits next to a birth-date label.
    OnlyBirthDate,
    Missing,
}

/// Resolve the collection date.
///
/// Order: `Collected:` label, any date label, bare ISO date (skipping a
/// date of birth), bare `NN/NN/YYYY`, bare `NN-NN-YYYY`.
pub fn extract_date(text: &str) -> DateExtraction {
    let labeled = [
        (DateSource::CollectedLabel, &*RE_COLLECTED),
        (DateSource::DateLabel, &*RE_DATE_LABEL),
    ];
    for (source, re) in labeled {
        if let Some(raw) = re.captures(text).and_then(|c| c.get(1)) {
            return resolve(raw.as_str(), source);
        }
    }

    if let Some(outcome) = bare_iso(text) {
        return outcome;
    }

    for (source, re) in [(DateSource::SlashDate, &*RE_SLASH), (DateSource::DashDate, &*RE_DASH)] {
        if let Some(raw) = re.captures(text).and_then(|c| c.get(1)) {
            return resolve(raw.as_str(), source);
        }
    }

    DateExtraction::Missing
}

fn bare_iso(text: &str) -> Option<DateExtraction> {
    let mut candidates = RE_BARE_ISO.find_iter(text).peekable();
    candidates.peek()?;

    let birth_pos = text.to_uppercase().find(BIRTH_DATE_LABEL);
    let Some(birth_pos) = birth_pos else {
        let first = candidates.next()?;
        return Some(resolve(first.as_str(), DateSource::BareIso));
    };

    let outcome = candidates
        .find(|m| m.start().abs_diff(birth_pos) > BIRTH_DATE_PROXIMITY)
        .map(|m| resolve(m.as_str(), DateSource::BareIso))
        .unwrap_or(DateExtraction::OnlyBirthDate);
    Some(outcome)
}

fn resolve(raw: &str, source: DateSource) -> DateExtraction {
    match normalize_date(raw) {
        Some((date, ambiguous)) => {
            tracing::debug!(strategy = ?source, ambiguous, "Date matched");
            DateExtraction::Found { date, source, ambiguous }
        }
        None => DateExtraction::Invalid { source },
    }
}

/// Convert `YYYY-MM-DD`, `NN/NN/YYYY` or `NN-NN-YYYY` to a calendar date.
///
/// For the two-group forms, a first group above 12 is the day (DD/MM);
/// otherwise month-first is assumed. The flag is true when that assumption
/// could have gone either way.
pub fn normalize_date(raw: &str) -> Option<(NaiveDate, bool)> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if raw.len() == 10 && raw.as_bytes()[4] == b'-' {
            return Some((date, false));
        }
    }

    let sep = if raw.contains('/') { '/' } else { '-' };
    let parts: Vec<&str> = raw.split(sep).collect();
    let [first, second, year] = parts.as_slice() else {
        return None;
    };
    if year.len() != 4 {
        return None;
    }
    let first: u32 = first.parse().ok()?;
    let second: u32 = second.parse().ok()?;
    let year: i32 = year.parse().ok()?;

    let (month, day) = if first > 12 { (second, first) } else { (first, second) };
    let ambiguous = first <= 12 && second <= 12 && first != second;
    NaiveDate::from_ymd_opt(year, month, day).map(|d| (d, ambiguous))
}
