use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "CultureSense";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter used when RUST_LOG is not set.
pub fn default_log_filter() -> &'static str {
    "culturesense=info"
}

/// Clinical thresholds shared by the trend and processing stages.
///
/// Confidence weights are not part of this struct; see
/// `intelligence::hypothesis::weights`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicalRules {
    /// CFU/mL at or below this value is treated as effectively cleared.
    pub cleared_threshold: u64,
    /// Days after an apparent clearance in which reappearance counts as recurrence.
    pub recurrence_window_days: i64,
    /// Distinct resistant drug classes in one report that constitute MDR.
    pub multi_drug_class_threshold: usize,
    /// Maximum number of reports accepted in one assessment.
    pub max_reports: usize,
}

impl Default for ClinicalRules {
    fn default() -> Self {
        Self {
            cleared_threshold: 1_000,
            recurrence_window_days: 30,
            multi_drug_class_threshold: 2,
            max_reports: 3,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read rules file {0}: {1}")]
    Read(String, String),

    #[error("Cannot parse rules file {0}: {1}")]
    Parse(String, String),

    #[error("Invalid rule {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ClinicalRules {
    /// Load rules from a JSON file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.display().to_string(), e.to_string()))?;
        let rules: Self = serde_json::from_str(&json)
            .map_err(|e| ConfigError::Parse(path.display().to_string(), e.to_string()))?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.multi_drug_class_threshold == 0 {
            return Err(ConfigError::Invalid {
                field: "multi_drug_class_threshold",
                reason: "must be at least 1".into(),
            });
        }
        if self.recurrence_window_days < 0 {
            return Err(ConfigError::Invalid {
                field: "recurrence_window_days",
                reason: format!("must not be negative (got {})", self.recurrence_window_days),
            });
        }
        if self.max_reports == 0 {
            return Err(ConfigError::Invalid {
                field: "max_reports",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn app_name_is_culturesense() {
        assert_eq!(APP_NAME, "CultureSense");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn default_filter_targets_crate() {
        assert!(default_log_filter().starts_with("culturesense"));
    }

    #[test]
    fn defaults_are_valid() {
        let rules = ClinicalRules::default();
        assert!(rules.validate().is_ok());
        assert_eq!(rules.cleared_threshold, 1_000);
        assert_eq!(rules.recurrence_window_days, 30);
        assert_eq!(rules.multi_drug_class_threshold, 2);
        assert_eq!(rules.max_reports, 3);
    }

    #[test]
    fn zero_class_threshold_rejected() {
        let rules = ClinicalRules {
            multi_drug_class_threshold: 0,
            ..ClinicalRules::default()
        };
        assert!(matches!(
            rules.validate(),
            Err(ConfigError::Invalid { field: "multi_drug_class_threshold", .. })
        ));
    }

    #[test]
    fn negative_window_rejected() {
        let rules = ClinicalRules {
            recurrence_window_days: -1,
            ..ClinicalRules::default()
        };
        assert!(rules.validate().is_err());
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"cleared_threshold": 500}}"#).unwrap();

        let rules = ClinicalRules::load(file.path()).unwrap();
        assert_eq!(rules.cleared_threshold, 500);
        assert_eq!(rules.recurrence_window_days, 30);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(matches!(
            ClinicalRules::load(file.path()),
            Err(ConfigError::Parse(..))
        ));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"infection_threshold_urine": 100000, "max_reports": 2}}"#).unwrap();

        let rules = ClinicalRules::load(file.path()).unwrap();
        assert_eq!(rules.max_reports, 2);
        assert_eq!(rules, ClinicalRules { max_reports: 2, ..ClinicalRules::default() });
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(ClinicalRules::load(&path), Err(ConfigError::Read(..))));
    }
}
