//! Trend classifier: ordered culture reports -> temporal signal bundle.
//!
//! Callers pass reports in ascending collection order; nothing here
//! re-sorts. Every signal is a pure function of the report slice plus the
//! clinical rules and reference tables.

use std::collections::{BTreeSet, HashMap, HashSet};

use thiserror::Error;

use crate::config::ClinicalRules;
use crate::models::{CfuTrend, CultureReport, Interpretation, ResistanceMarker, TrendResult};

use super::reference::ReferenceTables;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrendError {
    #[error("Trend analysis requires at least one report")]
    EmptyReports,
}

/// Compute the full temporal signal bundle for `reports`.
pub fn analyze(
    reports: &[CultureReport],
    rules: &ClinicalRules,
    tables: &ReferenceTables,
) -> Result<TrendResult, TrendError> {
    if reports.is_empty() {
        return Err(TrendError::EmptyReports);
    }

    let cfu_values: Vec<u64> = reports.iter().map(|r| r.cfu().value()).collect();
    let cfu_deltas = compute_deltas(&cfu_values);
    let cfu_trend = classify_cfu_trend(&cfu_values, rules.cleared_threshold);

    let organism_list: Vec<String> = reports.iter().map(|r| r.organism().to_string()).collect();
    let organism_persistent = check_persistence(&organism_list, tables);

    let marker_evolution = check_marker_evolution(reports);
    let evolved_antibiotics = detect_susceptibility_evolution(reports);
    let susceptibility_evolution = !evolved_antibiotics.is_empty();

    let result = TrendResult {
        cfu_trend,
        cfu_values,
        cfu_deltas,
        organism_persistent,
        organism_list,
        resistance_evolution: marker_evolution || susceptibility_evolution,
        resistance_timeline: reports.iter().map(|r| r.resistance_markers().to_vec()).collect(),
        report_dates: reports.iter().map(|r| r.date()).collect(),
        any_contamination: reports.iter().any(|r| r.contamination_flag()),
        multi_drug_resistance: check_multi_drug_resistance(reports, rules, tables),
        recurrent_organism_30d: check_recurrence(reports, rules, tables),
        susceptibility_evolution,
        evolved_antibiotics,
    };

    tracing::debug!(
        reports = reports.len(),
        trend = %result.cfu_trend,
        persistent = result.organism_persistent,
        resistance_evolution = result.resistance_evolution,
        mdr = result.multi_drug_resistance,
        recurrence = result.recurrent_organism_30d,
        "Trend computed"
    );

    Ok(result)
}

// ---------------------------------------------------------------------------
// [1] CFU trajectory
// ---------------------------------------------------------------------------

/// Label the CFU trajectory. First matching rule wins:
/// fewer than two values, final value at or below the cleared threshold,
/// strictly decreasing, strictly increasing, otherwise fluctuating.
pub fn classify_cfu_trend(cfu_values: &[u64], cleared_threshold: u64) -> CfuTrend {
    let Some(&last) = cfu_values.last() else {
        return CfuTrend::InsufficientData;
    };
    if cfu_values.len() < 2 {
        return CfuTrend::InsufficientData;
    }
    if last <= cleared_threshold {
        return CfuTrend::Cleared;
    }
    if cfu_values.windows(2).all(|w| w[0] > w[1]) {
        return CfuTrend::Decreasing;
    }
    if cfu_values.windows(2).all(|w| w[0] < w[1]) {
        return CfuTrend::Increasing;
    }
    CfuTrend::Fluctuating
}

/// Pairwise `next - previous`. Positive = worsening.
pub fn compute_deltas(cfu_values: &[u64]) -> Vec<i64> {
    cfu_values
        .windows(2)
        .map(|w| saturating_i64(w[1]).saturating_sub(saturating_i64(w[0])))
        .collect()
}

fn saturating_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

// ---------------------------------------------------------------------------
// [2] Organism persistence
// ---------------------------------------------------------------------------

/// True when every name collapses to one canonical organism.
pub fn check_persistence(organisms: &[String], tables: &ReferenceTables) -> bool {
    let distinct: HashSet<String> = organisms.iter().map(|o| tables.canonical_key(o)).collect();
    distinct.len() == 1
}

// ---------------------------------------------------------------------------
// [3] Resistance evolution
// ---------------------------------------------------------------------------

/// A marker appears in a later report that the first report did not carry.
pub fn check_marker_evolution(reports: &[CultureReport]) -> bool {
    let Some((first, later)) = reports.split_first() else {
        return false;
    };
    let baseline: HashSet<ResistanceMarker> = first.resistance_markers().iter().copied().collect();
    later
        .iter()
        .flat_map(|r| r.resistance_markers())
        .any(|m| !baseline.contains(m))
}

/// Antibiotics tested in both the first and the last report whose final
/// interpretation is strictly worse than baseline (S->I, S->R, I->R).
///
/// Intermediate reports are ignored: a dip that recovers by the last
/// report is not flagged. Names use the baseline spelling.
pub fn detect_susceptibility_evolution(reports: &[CultureReport]) -> Vec<String> {
    if reports.len() < 2 {
        return Vec::new();
    }
    let (Some(first), Some(last)) = (reports.first(), reports.last()) else {
        return Vec::new();
    };

    let mut baseline: HashMap<String, (&str, Interpretation)> = HashMap::new();
    for s in first.susceptibility_profile() {
        baseline
            .entry(s.antibiotic.trim().to_lowercase())
            .or_insert((s.antibiotic.as_str(), s.interpretation));
    }

    let mut evolved: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for s in last.susceptibility_profile() {
        let key = s.antibiotic.trim().to_lowercase();
        let Some((name, before)) = baseline.get(&key) else {
            continue;
        };
        if s.interpretation.is_worse_than(*before) && seen.insert(key) {
            evolved.push((*name).to_string());
        }
    }
    evolved
}

// ---------------------------------------------------------------------------
// [4] Multi-drug resistance
// ---------------------------------------------------------------------------

/// Any high-risk marker in any report, or one report resistant across at
/// least `multi_drug_class_threshold` distinct drug classes.
pub fn check_multi_drug_resistance(
    reports: &[CultureReport],
    rules: &ClinicalRules,
    tables: &ReferenceTables,
) -> bool {
    let marker_hit = reports
        .iter()
        .flat_map(|r| r.resistance_markers())
        .any(|m| tables.is_high_risk(*m));
    if marker_hit {
        return true;
    }

    reports
        .iter()
        .any(|r| resistant_classes(r, tables).len() >= rules.multi_drug_class_threshold)
}

/// Distinct drug classes the report shows resistance to. Antibiotics
/// absent from the class table are not counted.
pub fn resistant_classes<'t>(report: &CultureReport, tables: &'t ReferenceTables) -> BTreeSet<&'t str> {
    report
        .susceptibility_profile()
        .iter()
        .filter(|s| s.interpretation == Interpretation::Resistant)
        .filter_map(|s| tables.drug_class(&s.antibiotic))
        .collect()
}

// ---------------------------------------------------------------------------
// [5] Recurrence
// ---------------------------------------------------------------------------

/// Clear-then-reappear within the recurrence window.
///
/// A report at or below the cleared threshold must be followed, within
/// `recurrence_window_days`, by a later report above the threshold whose
/// organism matches one already seen up to the clearance. Monitoring an
/// infection that never clears does not count. Reports with unknown dates
/// are skipped.
pub fn check_recurrence(
    reports: &[CultureReport],
    rules: &ClinicalRules,
    tables: &ReferenceTables,
) -> bool {
    let threshold = rules.cleared_threshold;
    let window = rules.recurrence_window_days;

    for (i, cleared) in reports.iter().enumerate() {
        if cleared.cfu().value() > threshold || !cleared.date().is_known() {
            continue;
        }

        let seen: HashSet<String> = reports[..=i]
            .iter()
            .filter(|r| r.has_known_organism())
            .map(|r| tables.canonical_key(r.organism()))
            .collect();
        if seen.is_empty() {
            continue;
        }

        let reappeared = reports[i + 1..].iter().any(|later| {
            later.cfu().value() > threshold
                && later.has_known_organism()
                && seen.contains(&tables.canonical_key(later.organism()))
                && cleared
                    .date()
                    .days_until(&later.date())
                    .is_some_and(|days| (0..=window).contains(&days))
        });
        if reappeared {
            return true;
        }
    }
    false
}
