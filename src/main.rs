//! CultureSense command-line runner
//!
//! Reads one file per culture report, runs the deterministic pipeline and
//! prints the boundary payload as JSON on stdout. Extraction warnings and
//! review hints go to stderr.
//!
//! **Usage:**
//! ```bash
//! culturesense [--audience clinician] [--split] [--pretty] report1.md report2.md
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use culturesense::config::{self, ClinicalRules};
use culturesense::models::Audience;
use culturesense::pipeline::extraction::split_report_blocks;
use culturesense::{CultureProcessor, ReferenceTables};

/// Longitudinal culture report assessment
#[derive(Parser, Debug)]
#[clap(name = "culturesense", version)]
#[clap(about = "Assess a series of microbiology culture reports")]
struct Args {
    /// Report text files, one report per file unless --split is given
    #[clap(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,

    /// JSON file overriding clinical thresholds
    #[clap(long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// Directory holding organism_aliases.json and antibiotic_classes.json
    #[clap(long, value_name = "DIR", env = "CULTURESENSE_RESOURCES")]
    resources: Option<PathBuf>,

    /// Payload audience
    #[clap(long, default_value = "patient")]
    audience: Audience,

    /// Split each file into several reports on separators or report headings
    #[clap(long)]
    split: bool,

    /// Pretty-print the JSON payload
    #[clap(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    culturesense::init_tracing();
    let args = Args::parse();

    tracing::info!("{} v{}", config::APP_NAME, config::APP_VERSION);

    let rules = match &args.rules {
        Some(path) => ClinicalRules::load(path)
            .with_context(|| format!("Failed to load rules from {}", path.display()))?,
        None => ClinicalRules::default(),
    };

    let processor = match &args.resources {
        Some(dir) => CultureProcessor::from_resources(rules, dir)
            .with_context(|| format!("Failed to load reference tables from {}", dir.display()))?,
        None => CultureProcessor::with_tables(rules, Arc::new(ReferenceTables::builtin()))?,
    };

    let mut texts = Vec::new();
    for path in &args.files {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if args.split {
            let blocks = split_report_blocks(&text);
            tracing::info!(file = %path.display(), blocks = blocks.len(), "Split report file");
            texts.extend(blocks);
        } else {
            texts.push(text);
        }
    }
    if texts.is_empty() {
        bail!("No report text found in the given files");
    }

    let assessment = processor.assess(&texts).context("Assessment failed")?;

    for (i, (warnings, review)) in assessment
        .warnings
        .iter()
        .zip(assessment.review_flags())
        .enumerate()
    {
        for warning in warnings {
            eprintln!("report {}: {}", i + 1, warning);
        }
        if review {
            eprintln!("report {}: low-confidence extraction, review recommended", i + 1);
        }
    }

    let payload = assessment.payload(args.audience);
    let json = if args.pretty {
        payload.to_json_pretty()?
    } else {
        payload.to_json()?
    };
    println!("{json}");

    Ok(())
}
