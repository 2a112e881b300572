//! Hypothesis engine: trend signals + report count -> scored hypothesis.
//!
//! Total function. Confidence is always clamped into
//! `[weights::MIN_CONFIDENCE, weights::MAX_CONFIDENCE]`, and the result
//! always requires clinician review.

use crate::models::{CfuTrend, HypothesisResult, RiskFlag, TrendResult};

use super::messages::InterpretationPhrases;

/// Confidence signal weights. Compile-time only.
pub mod weights {
    /// Starting point: organism, threshold and susceptibility are all clear.
    pub const BASE: f64 = 0.90;
    /// Applied when fewer than two reports are available.
    pub const LONGITUDINAL_PENALTY: f64 = 0.20;
    /// Always applied; there is no symptom channel.
    pub const SYMPTOM_PENALTY: f64 = 0.20;

    // Trend signals, only with two or more reports.
    pub const DECREASING: f64 = 0.30;
    pub const CLEARED: f64 = 0.40;
    pub const INCREASING: f64 = 0.20;
    pub const FLUCTUATING: f64 = -0.10;
    pub const RESISTANCE_EVOLUTION: f64 = -0.10;
    pub const ORGANISM_CHANGE: f64 = -0.05;

    /// Applied regardless of report count.
    pub const CONTAMINATION: f64 = -0.20;

    pub const MIN_CONFIDENCE: f64 = 0.20;
    /// Hard ceiling. Never 1.0.
    pub const MAX_CONFIDENCE: f64 = 0.95;
}

/// Minimum number of reports for longitudinal signals.
const LONGITUDINAL_MIN_REPORTS: usize = 2;

/// Score a trend bundle.
pub fn score(trend: &TrendResult, report_count: usize) -> HypothesisResult {
    let confidence = score_confidence(trend, report_count);
    let risk_flags = assign_risk_flags(trend, report_count);
    let interpretation = build_interpretation(trend);
    let stewardship_alert = stewardship_alert(trend);

    tracing::debug!(
        confidence,
        flags = risk_flags.len(),
        stewardship_alert,
        "Hypothesis scored"
    );

    HypothesisResult::new(interpretation, confidence, risk_flags, stewardship_alert)
}

/// Deterministic confidence, clamped and rounded to four decimals.
pub fn score_confidence(trend: &TrendResult, report_count: usize) -> f64 {
    let longitudinal = report_count >= LONGITUDINAL_MIN_REPORTS;
    let mut confidence = weights::BASE;

    if !longitudinal {
        confidence -= weights::LONGITUDINAL_PENALTY;
    }
    confidence -= weights::SYMPTOM_PENALTY;

    if longitudinal {
        confidence += match trend.cfu_trend {
            CfuTrend::Decreasing => weights::DECREASING,
            CfuTrend::Cleared => weights::CLEARED,
            CfuTrend::Increasing => weights::INCREASING,
            CfuTrend::Fluctuating => weights::FLUCTUATING,
            CfuTrend::InsufficientData => 0.0,
        };
        if trend.resistance_evolution {
            confidence += weights::RESISTANCE_EVOLUTION;
        }
        if !trend.organism_persistent {
            confidence += weights::ORGANISM_CHANGE;
        }
    }

    if trend.any_contamination {
        confidence += weights::CONTAMINATION;
    }

    let clamped = confidence.clamp(weights::MIN_CONFIDENCE, weights::MAX_CONFIDENCE);
    (clamped * 10_000.0).round() / 10_000.0
}

/// Independent flags, in fixed order.
pub fn assign_risk_flags(trend: &TrendResult, report_count: usize) -> Vec<RiskFlag> {
    let checks = [
        (trend.resistance_evolution, RiskFlag::EmergingResistance),
        (trend.any_contamination, RiskFlag::ContaminationSuspected),
        (trend.cfu_trend == CfuTrend::Increasing, RiskFlag::NonResponsePattern),
        (report_count < LONGITUDINAL_MIN_REPORTS, RiskFlag::InsufficientData),
        (!trend.organism_persistent, RiskFlag::OrganismChange),
        (trend.multi_drug_resistance, RiskFlag::MultiDrugResistance),
    ];
    checks
        .into_iter()
        .filter_map(|(hit, flag)| hit.then_some(flag))
        .collect()
}

/// Interpretation text, assembled only from fixed fragments.
pub fn build_interpretation(trend: &TrendResult) -> String {
    let mut parts: Vec<&'static str> = vec![InterpretationPhrases::trend(trend.cfu_trend)];

    if trend.resistance_evolution {
        parts.push(InterpretationPhrases::emerging_resistance());
    }
    // Not reported once the trend is cleared.
    if !trend.organism_persistent && trend.cfu_trend != CfuTrend::Cleared {
        parts.push(InterpretationPhrases::organism_change());
    }
    if trend.any_contamination {
        parts.push(InterpretationPhrases::contamination());
    }
    if trend.multi_drug_resistance {
        parts.push(InterpretationPhrases::multi_drug_resistance());
    }

    parts.join(" ")
}

/// Never fires on a cleared trend. Otherwise: resistance evolved, or MDR
/// without improvement, or a 30-day recurrence.
pub fn stewardship_alert(trend: &TrendResult) -> bool {
    if trend.cfu_trend == CfuTrend::Cleared {
        return false;
    }
    let improving = trend.cfu_trend == CfuTrend::Decreasing;
    trend.resistance_evolution
        || (trend.multi_drug_resistance && !improving)
        || trend.recurrent_organism_30d
}
