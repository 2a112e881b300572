use crate::models::CfuTrend;

/// Fixed phrase fragments for the hypothesis interpretation string.
///
/// Every sentence that can reach an external summarizer comes from here.
/// No fragment takes a parameter, so no report text can leak through.
pub struct InterpretationPhrases;

impl InterpretationPhrases {
    /// Lead sentence for a CFU trend label.
    pub fn trend(trend: CfuTrend) -> &'static str {
        match trend {
            CfuTrend::Decreasing => "Pattern suggests improving infection response.",
            CfuTrend::Cleared => "Pattern suggests possible resolution.",
            CfuTrend::Increasing => "Pattern suggests possible non-response.",
            CfuTrend::Fluctuating => "Pattern is variable — requires clinical context.",
            CfuTrend::InsufficientData => "Insufficient longitudinal data for trend analysis.",
        }
    }

    pub fn emerging_resistance() -> &'static str {
        "Emerging resistance observed."
    }

    pub fn organism_change() -> &'static str {
        "Organism change may indicate reinfection."
    }

    pub fn contamination() -> &'static str {
        "Contamination suspected — interpret with caution."
    }

    pub fn multi_drug_resistance() -> &'static str {
        "Multi-drug resistance pattern detected."
    }

    /// Every fragment that may appear, in emission order.
    pub fn all() -> Vec<&'static str> {
        let mut phrases: Vec<&'static str> =
            CfuTrend::ALL.iter().map(|t| Self::trend(*t)).collect();
        phrases.extend([
            Self::emerging_resistance(),
            Self::organism_change(),
            Self::contamination(),
            Self::multi_drug_resistance(),
        ]);
        phrases
    }
}
