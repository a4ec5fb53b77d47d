//! Command-line interface for gwas-harmonize.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **harmonize**: Canonicalize a summary-statistics file (identifiers, build, strand)
//! - **lookup**: Query rsIDs or positional identifiers against the lookup shards
//! - **classify**: Report the identifier shape and canonical form of strings
//!
//! ## Usage
//!
//! ```text
//! # Harmonize an hg19 file to hg38
//! gwas-harmonize harmonize sumstats.tsv.gz out.tsv.gz \
//!     --lookup-dir dbsnp/ --source-build hg19 --chain hg19ToHg38.over.chain.gz
//!
//! # Machine-readable run report
//! gwas-harmonize harmonize sumstats.tsv out.tsv --lookup-dir dbsnp/ --format json
//!
//! # Which rsID is 8:60009:T:G?
//! gwas-harmonize lookup 8:60009:T:G --lookup-dir dbsnp/
//!
//! # Classify identifiers from stdin
//! cut -f1 sumstats.tsv | gwas-harmonize classify --format tsv
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod classify;
pub mod harmonize;
pub mod lookup;

#[derive(Parser)]
#[command(name = "gwas-harmonize")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Harmonize variant identity across GWAS summary statistics")]
#[command(
    long_about = "gwas-harmonize rewrites GWAS summary statistics so every variant carries a canonical identity.\n\nIt:\n- Recognizes rsIDs and positional identifiers (chrom_pos_ref_alt) in many spellings\n- Fills missing coordinates of rsIDs from per-chromosome dbSNP lookup shards\n- Lifts positional variants between hg19 and hg38 with liftOver\n- Recovers rsIDs for positional variants reported with swapped or complemented alleles"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Write log messages to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Harmonize a summary-statistics file
    Harmonize(harmonize::HarmonizeArgs),

    /// Look up identifiers in the lookup shards
    Lookup(lookup::LookupArgs),

    /// Classify identifiers as rsID, positional, or unrecognized
    Classify(classify::ClassifyArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}
