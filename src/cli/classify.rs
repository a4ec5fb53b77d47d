use std::io::BufRead;

use clap::Args;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::core::pattern::{canonicalize, classify};
use crate::core::types::IdKind;

#[derive(Args)]
pub struct ClassifyArgs {
    /// Identifiers to classify; read one per line from stdin when omitted
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Classification {
    pub input: String,
    /// Shape of the whole string
    pub kind: IdKind,
    /// Canonical identifier extracted from the string, if any
    pub canonical: Option<String>,
    pub canonical_kind: IdKind,
}

impl Classification {
    #[must_use]
    pub fn of(input: &str) -> Self {
        let (canonical_kind, canonical) = match canonicalize(input) {
            Some((kind, id)) => (kind, Some(id)),
            None => (IdKind::Unrecognized, None),
        };
        Self {
            input: input.to_string(),
            kind: classify(input),
            canonical,
            canonical_kind,
        }
    }
}

/// Execute classify subcommand
///
/// # Errors
///
/// Returns an error if stdin cannot be read.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ClassifyArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let ids = if args.ids.is_empty() {
        std::io::stdin()
            .lock()
            .lines()
            .map(|line| line.map(|l| l.trim().to_string()))
            .filter(|line| line.as_ref().map_or(true, |l| !l.is_empty()))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        args.ids
    };
    if verbose {
        eprintln!("Classifying {} identifiers", ids.len());
    }

    let results: Vec<Classification> = ids.iter().map(|id| Classification::of(id)).collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Tsv => {
            println!("input\tkind\tcanonical");
            for r in &results {
                println!(
                    "{}\t{}\t{}",
                    r.input,
                    r.kind,
                    r.canonical.as_deref().unwrap_or("NA")
                );
            }
        }
        OutputFormat::Text => {
            for r in &results {
                match &r.canonical {
                    Some(canonical) if r.kind == IdKind::Unrecognized => {
                        println!("{}: {} {canonical} (extracted)", r.input, r.canonical_kind);
                    }
                    Some(canonical) => println!("{}: {} {canonical}", r.input, r.kind),
                    None => println!("{}: {}", r.input, r.kind),
                }
            }
        }
    }
    Ok(())
}
