use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use tracing::info;

use crate::cli::OutputFormat;
use crate::core::types::GenomeBuild;
use crate::effects;
use crate::liftover::LiftOverConfig;
use crate::lookup::LookupStore;
use crate::parsing::allowlist::AllowList;
use crate::parsing::columns::ColumnPatterns;
use crate::parsing::sumstats::{read_sumstats, write_sumstats};
use crate::pipeline::{HarmonizeConfig, HarmonizeReport, Harmonizer};
use crate::qc::{QcConfig, QcFilter};

#[derive(Args)]
pub struct HarmonizeArgs {
    /// Input summary statistics (tab-separated, optionally .gz)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output path (.gz output is compressed)
    #[arg(required = true)]
    pub output: PathBuf,

    /// Directory of *.chr{N}.lookup.parquet shards
    #[arg(long, alias = "dbsnp-dir")]
    pub lookup_dir: PathBuf,

    /// Genome build of the input (hg19 or hg38)
    #[arg(long, default_value = "hg38")]
    pub source_build: GenomeBuild,

    /// Genome build of the output (hg19 or hg38)
    #[arg(long, default_value = "hg38")]
    pub target_build: GenomeBuild,

    /// Chain file, required when the builds differ
    #[arg(long)]
    pub chain: Option<PathBuf>,

    /// liftOver executable (searched on PATH when given as a bare name)
    #[arg(long, default_value = crate::liftover::tool::DEFAULT_TOOL)]
    pub liftover_tool: PathBuf,

    /// Seconds to wait for liftOver before giving up
    #[arg(long, default_value = "3600")]
    pub liftover_timeout: u64,

    /// Directory for temporary interval files (defaults to the output directory)
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// JSON file overriding column-name patterns (keys SNP, CHR, BP, A2, A1, AF1, BETA, SE, P, N, Z)
    #[arg(long)]
    pub column_patterns: Option<PathBuf>,

    /// Keep only variants whose chr{CHR}_{BP}_{A2}_{A1} key is in this file's ID column
    #[arg(long)]
    pub allow_list: Option<PathBuf>,

    /// Leave BETA, SE, Z and AF1 as read (no sentinel filtering, no derived Z or AF1)
    #[arg(long)]
    pub raw_statistics: bool,

    /// Skip the final QC filter entirely
    #[arg(long)]
    pub no_qc: bool,

    /// Keep variants outside chromosomes 1-22
    #[arg(long)]
    pub keep_non_autosomal: bool,

    /// Keep A/T and C/G variants
    #[arg(long)]
    pub keep_ambiguous: bool,
}

/// Execute harmonize subcommand
///
/// # Errors
///
/// Returns an error if the input cannot be read, the run fails, or the output
/// cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: HarmonizeArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let patterns = match &args.column_patterns {
        Some(path) => ColumnPatterns::from_json_file(path)
            .with_context(|| format!("Failed to load column patterns from {}", path.display()))?,
        None => ColumnPatterns::default(),
    };

    let table = read_sumstats(&args.input, &patterns)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let store = LookupStore::open(&args.lookup_dir)?;
    if verbose {
        eprintln!(
            "Read {} records; {} lookup shards in {}",
            table.len(),
            store.len(),
            args.lookup_dir.display()
        );
    }

    let config = HarmonizeConfig {
        source_build: args.source_build,
        target_build: args.target_build,
        liftover: LiftOverConfig {
            tool: args.liftover_tool.clone(),
            chain: args.chain.clone(),
            work_dir: args
                .work_dir
                .clone()
                .unwrap_or_else(|| output_dir(&args.output)),
            run_name: run_name(&args.output),
            timeout: Duration::from_secs(args.liftover_timeout),
        },
    };

    let (table, mut report) = Harmonizer::new(&store, config).run(table)?;

    let table = if args.raw_statistics {
        table
    } else {
        let (table, stats) = effects::reformat(table);
        report.effects = stats;
        report.output_records = table.len();
        table
    };

    let table = if args.no_qc {
        table
    } else {
        let allow_list = args
            .allow_list
            .as_deref()
            .map(AllowList::read)
            .transpose()?;
        let qc = QcConfig {
            autosomes_only: !args.keep_non_autosomal,
            drop_ambiguous: !args.keep_ambiguous,
            ..QcConfig::default()
        };
        let mut filter = QcFilter::new(qc);
        if let Some(list) = &allow_list {
            filter = filter.with_allow_list(list);
        }
        let (table, stats) = filter.apply(table);
        report.qc = Some(stats);
        report.output_records = table.len();
        table
    };

    write_sumstats(&args.output, &table)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!("Finished harmonizing {}", args.input.display());

    print_report(&report, format)
}

fn print_report(report: &HarmonizeReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => println!("{report}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Tsv => {
            let value = serde_json::to_value(report)?;
            let mut rows = Vec::new();
            flatten("", &value, &mut rows);
            for (key, value) in rows {
                println!("{key}\t{value}");
            }
        }
    }
    Ok(())
}

/// Flatten nested JSON into `a.b.c` keys
fn flatten(prefix: &str, value: &serde_json::Value, rows: &mut Vec<(String, String)>) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        }
    };
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                flatten(&join(key), child, rows);
            }
        }
        serde_json::Value::Array(items) => {
            let joined: Vec<String> = items
                .iter()
                .map(|item| item.as_str().map_or_else(|| item.to_string(), str::to_string))
                .collect();
            rows.push((prefix.to_string(), joined.join(",")));
        }
        serde_json::Value::String(s) => rows.push((prefix.to_string(), s.clone())),
        other => rows.push((prefix.to_string(), other.to_string())),
    }
}

fn output_dir(output: &Path) -> PathBuf {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Output file name without `.gz` and `.tsv`/`.txt` extensions
fn run_name(output: &Path) -> String {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "gwas-harmonize".to_string());
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    let name = [".tsv", ".txt"]
        .iter()
        .find_map(|ext| name.strip_suffix(ext))
        .unwrap_or(name);
    name.to_string()
}
