//! Static lookup tables: organism aliases, contamination terms, antibiotic
//! drug classes and the high-risk resistance marker set.
//!
//! Built once (bundled or from JSON resources) and passed by reference into
//! every stage. Nothing here is mutated after construction.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::ResistanceMarker;

#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("Failed to load reference data {0}: {1}")]
    Load(String, String),

    #[error("Failed to parse reference data {0}: {1}")]
    Parse(String, String),

    #[error("Invalid reference data in {file}: {reason}")]
    Invalid { file: &'static str, reason: String },
}

/// One shorthand-to-canonical organism mapping (organism_aliases.json).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganismAlias {
    pub alias: String,
    pub canonical: String,
}

/// Shape of organism_aliases.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganismAliasFile {
    pub contamination_terms: Vec<String>,
    pub aliases: Vec<OrganismAlias>,
}

/// One antibiotic-to-drug-class mapping (antibiotic_classes.json).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntibioticClass {
    pub antibiotic: String,
    #[serde(rename = "class")]
    pub drug_class: String,
}

pub const ALIASES_FILE: &str = "organism_aliases.json";
pub const CLASSES_FILE: &str = "antibiotic_classes.json";

/// Loaded reference tables.
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    /// Lowercase alias -> lowercase canonical.
    alias_index: HashMap<String, String>,
    /// Aliases ordered longest first, for substring scanning.
    scan_order: Vec<String>,
    contamination_terms: Vec<String>,
    /// Lowercase antibiotic -> drug class.
    antibiotic_classes: HashMap<String, String>,
    high_risk_markers: Vec<ResistanceMarker>,
}

impl ReferenceTables {
    /// Tables bundled with the binary.
    pub fn builtin() -> Self {
        let aliases = BUILTIN_ALIASES
            .iter()
            .map(|(alias, canonical)| OrganismAlias {
                alias: (*alias).into(),
                canonical: (*canonical).into(),
            })
            .collect();
        let contamination_terms = BUILTIN_CONTAMINATION_TERMS
            .iter()
            .map(|t| (*t).to_string())
            .collect();
        let classes = BUILTIN_ANTIBIOTIC_CLASSES
            .iter()
            .map(|(antibiotic, class)| AntibioticClass {
                antibiotic: (*antibiotic).into(),
                drug_class: (*class).into(),
            })
            .collect();

        Self::from_parts(
            OrganismAliasFile {
                contamination_terms,
                aliases,
            },
            classes,
        )
    }

    /// Load reference tables from a resources directory containing
    /// `organism_aliases.json` and `antibiotic_classes.json`.
    pub fn load(resources_dir: &Path) -> Result<Self, ReferenceError> {
        let aliases_path = resources_dir.join(ALIASES_FILE);
        let classes_path = resources_dir.join(CLASSES_FILE);

        let aliases_json = std::fs::read_to_string(&aliases_path).map_err(|e| {
            ReferenceError::Load(aliases_path.display().to_string(), e.to_string())
        })?;
        let alias_file: OrganismAliasFile = serde_json::from_str(&aliases_json)
            .map_err(|e| ReferenceError::Parse(ALIASES_FILE.into(), e.to_string()))?;

        let classes_json = std::fs::read_to_string(&classes_path).map_err(|e| {
            ReferenceError::Load(classes_path.display().to_string(), e.to_string())
        })?;
        let classes: Vec<AntibioticClass> = serde_json::from_str(&classes_json)
            .map_err(|e| ReferenceError::Parse(CLASSES_FILE.into(), e.to_string()))?;

        validate(&alias_file, &classes)?;

        let tables = Self::from_parts(alias_file, classes);
        tracing::debug!(
            aliases = tables.alias_index.len(),
            antibiotics = tables.antibiotic_classes.len(),
            "Reference tables loaded"
        );
        Ok(tables)
    }

    fn from_parts(alias_file: OrganismAliasFile, classes: Vec<AntibioticClass>) -> Self {
        let alias_index: HashMap<String, String> = alias_file
            .aliases
            .into_iter()
            .map(|a| (a.alias.trim().to_lowercase(), a.canonical.trim().to_lowercase()))
            .collect();

        let mut scan_order: Vec<String> = alias_index.keys().cloned().collect();
        // Longest first so "e coli" never wins inside a longer name; ties
        // broken alphabetically to keep the scan deterministic.
        scan_order.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let contamination_terms = alias_file
            .contamination_terms
            .into_iter()
            .map(|t| t.trim().to_lowercase())
            .collect();

        let antibiotic_classes = classes
            .into_iter()
            .map(|c| (c.antibiotic.trim().to_lowercase(), c.drug_class.trim().to_string()))
            .collect();

        Self {
            alias_index,
            scan_order,
            contamination_terms,
            antibiotic_classes,
            high_risk_markers: ResistanceMarker::ALL.to_vec(),
        }
    }

    /// Lowercase canonical key used for identity comparisons.
    /// Unknown names fall back to their own lowercased form.
    pub fn canonical_key(&self, organism: &str) -> String {
        let key = organism.trim().to_lowercase();
        match self.alias_index.get(&key) {
            Some(canonical) => canonical.clone(),
            None => key,
        }
    }

    /// Display form of an organism name.
    ///
    /// Aliases resolve to their canonical name. Contamination terms stay
    /// lowercase; everything else gets a capitalised first letter.
    pub fn normalize_organism(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        let canonical = self
            .alias_index
            .get(&trimmed.to_lowercase())
            .cloned()
            .unwrap_or_else(|| trimmed.to_string());

        if self.contamination_terms.iter().any(|t| *t == canonical) {
            return canonical;
        }
        capitalize_first(&canonical)
    }

    /// Case-insensitive substring scan, longest alias first.
    /// Returns the normalized organism name of the first alias found.
    pub fn scan_for_alias(&self, text: &str) -> Option<String> {
        let lower = text.to_lowercase();
        self.scan_order
            .iter()
            .find(|alias| lower.contains(alias.as_str()))
            .map(|alias| self.normalize_organism(alias))
    }

    /// True when the organism name contains any contamination term.
    pub fn is_contamination(&self, organism: &str) -> bool {
        let lower = organism.to_lowercase();
        self.contamination_terms.iter().any(|t| lower.contains(t.as_str()))
    }

    /// Drug class for an antibiotic name, if it is in the table.
    pub fn drug_class(&self, antibiotic: &str) -> Option<&str> {
        self.antibiotic_classes
            .get(&antibiotic.trim().to_lowercase())
            .map(String::as_str)
    }

    pub fn is_high_risk(&self, marker: ResistanceMarker) -> bool {
        self.high_risk_markers.contains(&marker)
    }

    pub fn high_risk_markers(&self) -> &[ResistanceMarker] {
        &self.high_risk_markers
    }
}

impl Default for ReferenceTables {
    fn default() -> Self {
        Self::builtin()
    }
}

fn validate(alias_file: &OrganismAliasFile, classes: &[AntibioticClass]) -> Result<(), ReferenceError> {
    if let Some(bad) = alias_file
        .aliases
        .iter()
        .find(|a| a.alias.trim().is_empty() || a.canonical.trim().is_empty())
    {
        return Err(ReferenceError::Invalid {
            file: ALIASES_FILE,
            reason: format!("empty alias or canonical name ({:?} -> {:?})", bad.alias, bad.canonical),
        });
    }
    if alias_file.contamination_terms.iter().any(|t| t.trim().is_empty()) {
        return Err(ReferenceError::Invalid {
            file: ALIASES_FILE,
            reason: "empty contamination term".into(),
        });
    }
    if let Some(bad) = classes
        .iter()
        .find(|c| c.antibiotic.trim().is_empty() || c.drug_class.trim().is_empty())
    {
        return Err(ReferenceError::Invalid {
            file: CLASSES_FILE,
            reason: format!("empty antibiotic or class ({:?})", bad.antibiotic),
        });
    }
    Ok(())
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ═══════════════════════════════════════════
// Bundled tables
// ═══════════════════════════════════════════

const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("e. coli", "escherichia coli"),
    ("e.coli", "escherichia coli"),
    ("e coli", "escherichia coli"),
    ("escherichia coli", "escherichia coli"),
    ("klebsiella", "klebsiella pneumoniae"),
    ("klebsiella pneumoniae", "klebsiella pneumoniae"),
    ("staph aureus", "staphylococcus aureus"),
    ("staphylococcus aureus", "staphylococcus aureus"),
    ("s. aureus", "staphylococcus aureus"),
    ("mrsa", "staphylococcus aureus (mrsa)"),
    ("enterococcus", "enterococcus faecalis"),
    ("enterococcus faecalis", "enterococcus faecalis"),
    ("e. faecalis", "enterococcus faecalis"),
    ("pseudomonas", "pseudomonas aeruginosa"),
    ("pseudomonas aeruginosa", "pseudomonas aeruginosa"),
    ("p. aeruginosa", "pseudomonas aeruginosa"),
    ("proteus", "proteus mirabilis"),
    ("proteus mirabilis", "proteus mirabilis"),
    ("mixed flora", "mixed flora"),
    ("skin flora", "mixed flora"),
    ("normal flora", "mixed flora"),
    ("commensal", "commensal"),
    ("mixed growth", "mixed flora"),
];

const BUILTIN_CONTAMINATION_TERMS: &[&str] = &[
    "mixed flora",
    "skin flora",
    "normal flora",
    "commensal",
    "contamination",
    "mixed growth",
];

const BUILTIN_ANTIBIOTIC_CLASSES: &[(&str, &str)] = &[
    // penicillin
    ("ampicillin", "penicillin"),
    ("amoxicillin", "penicillin"),
    ("penicillin", "penicillin"),
    ("oxacillin", "penicillin"),
    ("nafcillin", "penicillin"),
    // beta-lactam/beta-lactamase inhibitor
    ("amoxicillin-clavulanate", "beta-lactam/beta-lactamase inhibitor"),
    ("amoxicillin/clavulanate", "beta-lactam/beta-lactamase inhibitor"),
    ("ampicillin-sulbactam", "beta-lactam/beta-lactamase inhibitor"),
    ("piperacillin-tazobactam", "beta-lactam/beta-lactamase inhibitor"),
    ("piperacillin/tazobactam", "beta-lactam/beta-lactamase inhibitor"),
    // cephalosporin
    ("cefazolin", "cephalosporin"),
    ("cephalexin", "cephalosporin"),
    ("cefuroxime", "cephalosporin"),
    ("cefoxitin", "cephalosporin"),
    ("ceftriaxone", "cephalosporin"),
    ("cefotaxime", "cephalosporin"),
    ("ceftazidime", "cephalosporin"),
    ("cefepime", "cephalosporin"),
    ("cefpodoxime", "cephalosporin"),
    ("cefixime", "cephalosporin"),
    // carbapenem
    ("imipenem", "carbapenem"),
    ("meropenem", "carbapenem"),
    ("ertapenem", "carbapenem"),
    ("doripenem", "carbapenem"),
    // monobactam
    ("aztreonam", "monobactam"),
    // fluoroquinolone
    ("ciprofloxacin", "fluoroquinolone"),
    ("levofloxacin", "fluoroquinolone"),
    ("moxifloxacin", "fluoroquinolone"),
    ("ofloxacin", "fluoroquinolone"),
    ("norfloxacin", "fluoroquinolone"),
    // aminoglycoside
    ("gentamicin", "aminoglycoside"),
    ("tobramycin", "aminoglycoside"),
    ("amikacin", "aminoglycoside"),
    // folate pathway inhibitor
    ("trimethoprim-sulfamethoxazole", "folate pathway inhibitor"),
    ("trimethoprim/sulfamethoxazole", "folate pathway inhibitor"),
    ("tmp-smx", "folate pathway inhibitor"),
    ("trimethoprim", "folate pathway inhibitor"),
    ("sulfamethoxazole", "folate pathway inhibitor"),
    // nitrofuran
    ("nitrofurantoin", "nitrofuran"),
    // phosphonic acid
    ("fosfomycin", "phosphonic acid"),
    // tetracycline
    ("tetracycline", "tetracycline"),
    ("doxycycline", "tetracycline"),
    ("minocycline", "tetracycline"),
    ("tigecycline", "tetracycline"),
    // glycopeptide
    ("vancomycin", "glycopeptide"),
    ("teicoplanin", "glycopeptide"),
    // oxazolidinone
    ("linezolid", "oxazolidinone"),
    // lipopeptide
    ("daptomycin", "lipopeptide"),
    // macrolide
    ("erythromycin", "macrolide"),
    ("azithromycin", "macrolide"),
    ("clarithromycin", "macrolide"),
    // lincosamide
    ("clindamycin", "lincosamide"),
    // polymyxin
    ("colistin", "polymyxin"),
    ("polymyxin b", "polymyxin"),
];
