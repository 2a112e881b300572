use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serde uses the same string as `as_str`, so the wire form and the
/// display form never drift apart.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(SpecimenType {
    Urine => "urine",
    Stool => "stool",
    Wound => "wound",
    Blood => "blood",
    Sputum => "sputum",
    Unknown => "unknown",
});

str_enum!(Interpretation {
    Sensitive => "S",
    Intermediate => "I",
    Resistant => "R",
});

str_enum!(ResistanceMarker {
    Esbl => "ESBL",
    Cre => "CRE",
    Mrsa => "MRSA",
    Vre => "VRE",
    Crkp => "CRKP",
});

str_enum!(CfuTrend {
    Decreasing => "decreasing",
    Increasing => "increasing",
    Fluctuating => "fluctuating",
    Cleared => "cleared",
    InsufficientData => "insufficient_data",
});

str_enum!(RiskFlag {
    EmergingResistance => "EMERGING_RESISTANCE",
    ContaminationSuspected => "CONTAMINATION_SUSPECTED",
    NonResponsePattern => "NON_RESPONSE_PATTERN",
    InsufficientData => "INSUFFICIENT_DATA",
    OrganismChange => "ORGANISM_CHANGE",
    MultiDrugResistance => "MULTI_DRUG_RESISTANCE",
});

str_enum!(Audience {
    Patient => "patient",
    Clinician => "clinician",
});

impl SpecimenType {
    /// Map a raw specimen word (any case) to its standard type.
    pub fn from_word(word: &str) -> Option<Self> {
        match word.trim().to_lowercase().as_str() {
            "urine" | "urinary" => Some(Self::Urine),
            "stool" | "fecal" | "faecal" | "feces" => Some(Self::Stool),
            "wound" => Some(Self::Wound),
            "blood" => Some(Self::Blood),
            "sputum" => Some(Self::Sputum),
            _ => None,
        }
    }
}

impl Interpretation {
    /// Accepts the letter or the full word, any case.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_uppercase().as_str() {
            "S" | "SENSITIVE" => Some(Self::Sensitive),
            "I" | "INTERMEDIATE" => Some(Self::Intermediate),
            "R" | "RESISTANT" => Some(Self::Resistant),
            _ => None,
        }
    }

    /// S < I < R.
    pub fn severity(&self) -> u8 {
        match self {
            Self::Sensitive => 0,
            Self::Intermediate => 1,
            Self::Resistant => 2,
        }
    }

    pub fn is_worse_than(&self, baseline: Interpretation) -> bool {
        self.severity() > baseline.severity()
    }
}

impl ResistanceMarker {
    /// Case-insensitive lookup of a marker code.
    pub fn from_code(code: &str) -> Option<Self> {
        let upper = code.trim().to_uppercase();
        Self::ALL.iter().copied().find(|m| m.as_str() == upper)
    }
}
