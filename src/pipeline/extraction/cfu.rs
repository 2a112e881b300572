use std::sync::LazyLock;

use regex::Regex;

use super::types::CfuStrategy;
use crate::models::CfuCount;

static RE_CFU_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)CFU[/\\]?m?L?:\s*([><]?\s*[\d,]+)").unwrap());
static RE_COUNT_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Count|Quantity|Result):\s*([><]?\s*[\d,]+)").unwrap()
});
static RE_TRAILING_UNIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d[\d,]*)\s*(?:CFU|colonies|cells)").unwrap());
static RE_THRESHOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r">\s*?([\d,]+)").unwrap());
static RE_GROUPED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{1,3},\d{3})").unwrap());
static RE_TNTC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(TNTC|Too\s+Numerous\s+To\s+Count)").unwrap());
static RE_NO_GROWTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(No\s+growth|No\s+significant\s+growth|0\s+CFU|Negative)").unwrap()
});
static RE_SCIENTIFIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"10\^(\d+)").unwrap());
static RE_BARE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{5,})\b").unwrap());

type CfuMatcher = fn(&str) -> Option<CfuCount>;

/// CFU strategies in strict priority order. First `Some` wins; a
/// candidate that fails to parse falls through to the next strategy.
const STRATEGIES: [(CfuStrategy, CfuMatcher); 9] = [
    (CfuStrategy::CfuLabel, cfu_label),
    (CfuStrategy::CountLabel, count_label),
    (CfuStrategy::TrailingUnit, trailing_unit),
    (CfuStrategy::Threshold, threshold),
    (CfuStrategy::GroupedNumber, grouped_number),
    (CfuStrategy::TooNumerous, too_numerous),
    (CfuStrategy::NoGrowth, no_growth),
    (CfuStrategy::Scientific, scientific),
    (CfuStrategy::BareNumber, bare_number),
];

/// Resolve the CFU/mL count. `None` when no strategy matched.
pub fn extract_cfu(text: &str) -> Option<(CfuCount, CfuStrategy)> {
    let text = text.trim();
    STRATEGIES.iter().find_map(|(strategy, matcher)| {
        let count = matcher(text)?;
        tracing::debug!(strategy = ?strategy, "CFU matched");
        Some((count, *strategy))
    })
}

/// Strip thousands separators and `<`/`>` and parse.
pub fn parse_count(raw: &str) -> Option<u64> {
    let cleaned: String = raw.chars().filter(|c| !matches!(c, ',' | '<' | '>')).collect();
    cleaned.trim().parse().ok()
}

fn first_capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

fn cfu_label(text: &str) -> Option<CfuCount> {
    parse_count(first_capture(&RE_CFU_LABEL, text)?).map(CfuCount::Measured)
}

fn count_label(text: &str) -> Option<CfuCount> {
    parse_count(first_capture(&RE_COUNT_LABEL, text)?).map(CfuCount::Measured)
}

/// "<n> CFU|colonies|cells", skipping numbers directly preceded by `<`,
/// a digit, `,` or `;` (threshold statements such as "<5,000 CFU/mL" or an
/// HTML-escaped "&lt;5,000").
fn trailing_unit(text: &str) -> Option<CfuCount> {
    let capture = RE_TRAILING_UNIT
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .find(|m| {
            let preceding = text[..m.start()].chars().next_back();
            !matches!(preceding, Some(c) if c == '<' || c == ',' || c == ';' || c.is_ascii_digit())
        })?;
    parse_count(capture.as_str()).map(CfuCount::Measured)
}

fn threshold(text: &str) -> Option<CfuCount> {
    parse_count(first_capture(&RE_THRESHOLD, text)?).map(CfuCount::Measured)
}

fn grouped_number(text: &str) -> Option<CfuCount> {
    parse_count(first_capture(&RE_GROUPED, text)?).map(CfuCount::Measured)
}

fn too_numerous(text: &str) -> Option<CfuCount> {
    RE_TNTC.is_match(text).then_some(CfuCount::TooNumerousToCount)
}

fn no_growth(text: &str) -> Option<CfuCount> {
    RE_NO_GROWTH.is_match(text).then_some(CfuCount::NoGrowth)
}

fn scientific(text: &str) -> Option<CfuCount> {
    let exponent: u32 = first_capture(&RE_SCIENTIFIC, text)?.parse().ok()?;
    10u64.checked_pow(exponent).map(CfuCount::Measured)
}

fn bare_number(text: &str) -> Option<CfuCount> {
    parse_count(first_capture(&RE_BARE_NUMBER, text)?).map(CfuCount::Measured)
}
