use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::core::pattern::{canonicalize, PositionalId};
use crate::core::types::IdKind;
use crate::lookup::shard::key_coordinates;
use crate::lookup::{LookupQuery, LookupStore};
use crate::resolve::{Orientation, StrandResolver};

#[derive(Args)]
pub struct LookupArgs {
    /// rsIDs or positional identifiers (any of `_`, `:`, `+` as separator)
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Directory of *.chr{N}.lookup.parquet shards
    #[arg(long, alias = "dbsnp-dir")]
    pub lookup_dir: PathBuf,
}

/// Outcome of looking up one identifier
#[derive(Debug, Serialize)]
pub struct LookupHit {
    pub query: String,
    pub canonical: Option<String>,
    pub rsid: Option<String>,
    pub key: Option<String>,
    pub chrom: Option<String>,
    pub position: Option<u64>,
    /// Allele orientation that matched, for positional queries
    pub orientation: Option<Orientation>,
}

impl LookupHit {
    fn empty(query: &str) -> Self {
        Self {
            query: query.to_string(),
            canonical: None,
            rsid: None,
            key: None,
            chrom: None,
            position: None,
            orientation: None,
        }
    }
}

/// Execute lookup subcommand
///
/// # Errors
///
/// Returns an error if the lookup directory or a shard cannot be read.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: LookupArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let store = LookupStore::open(&args.lookup_dir)?;
    if verbose {
        eprintln!(
            "Found lookup shards for chromosomes: {}",
            store.chromosomes().collect::<Vec<_>>().join(", ")
        );
    }

    let hits = args
        .ids
        .iter()
        .map(|query| lookup_one(&store, query))
        .collect::<anyhow::Result<Vec<_>>>()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&hits)?),
        OutputFormat::Tsv => {
            println!("query\trsid\tkey\tchrom\tposition\torientation");
            for hit in &hits {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    hit.query,
                    hit.rsid.as_deref().unwrap_or("NA"),
                    hit.key.as_deref().unwrap_or("NA"),
                    hit.chrom.as_deref().unwrap_or("NA"),
                    hit.position.map_or_else(|| "NA".to_string(), |p| p.to_string()),
                    hit.orientation.map_or_else(|| "NA".to_string(), |o| o.to_string())
                );
            }
        }
        OutputFormat::Text => {
            for hit in &hits {
                match (&hit.rsid, &hit.key) {
                    (Some(rsid), Some(key)) => {
                        let via = hit
                            .orientation
                            .map(|o| format!(" (via {o})"))
                            .unwrap_or_default();
                        println!("{}: {rsid} at {key}{via}", hit.query);
                    }
                    _ if hit.canonical.is_none() => {
                        println!("{}: not an rsID or positional identifier", hit.query);
                    }
                    _ => println!("{}: no unique match", hit.query),
                }
            }
        }
    }
    Ok(())
}

fn lookup_one(store: &LookupStore, query: &str) -> anyhow::Result<LookupHit> {
    let mut hit = LookupHit::empty(query);
    let Some((kind, canonical)) = canonicalize(query) else {
        return Ok(hit);
    };
    hit.canonical = Some(canonical.clone());

    match kind {
        IdKind::Rsid => {
            let wanted = LookupQuery::rsids([canonical.as_str()]);
            for chrom in store.chromosomes() {
                let Some(shard) = store.load(chrom, &wanted)? else {
                    continue;
                };
                if let Some(key) = shard.key_for(&canonical) {
                    if let Some((chrom, position)) = key_coordinates(key) {
                        hit.chrom = Some(chrom);
                        hit.position = Some(position);
                    }
                    hit.key = Some(key.to_string());
                    hit.rsid = Some(canonical);
                    break;
                }
            }
        }
        IdKind::Positional => {
            let Some(id) = PositionalId::parse(&canonical) else {
                return Ok(hit);
            };
            hit.chrom = Some(id.chrom.clone());
            hit.position = Some(id.position);
            let wanted = LookupQuery::keys(StrandResolver::candidate_keys(&id));
            if let Some(shard) = store.load(&id.chrom, &wanted)? {
                if let Some((orientation, rsid)) =
                    StrandResolver::find_orientation(&id, |key| shard.rsid_for(key))
                {
                    hit.key = Some(orientation.apply(&id).lookup_key());
                    hit.rsid = Some(rsid.to_string());
                    hit.orientation = Some(orientation);
                }
            }
        }
        IdKind::Unrecognized => {}
    }
    Ok(hit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::LookupShard;

    fn store() -> LookupStore {
        LookupStore::from_shards([LookupShard::from_pairs(
            "8",
            [("chr8_60009_G_T", "rs999")],
        )])
    }

    #[test]
    fn test_lookup_rsid() {
        let hit = lookup_one(&store(), "RS999").unwrap();
        assert_eq!(hit.canonical.as_deref(), Some("rs999"));
        assert_eq!(hit.key.as_deref(), Some("chr8_60009_G_T"));
        assert_eq!(hit.position, Some(60009));
        assert!(hit.orientation.is_none());
    }

    #[test]
    fn test_lookup_positional() {
        let hit = lookup_one(&store(), "8:60009:C:A").unwrap();
        assert_eq!(hit.rsid.as_deref(), Some("rs999"));
        assert_eq!(hit.orientation, Some(Orientation::ReverseComplement));
        assert_eq!(hit.key.as_deref(), Some("chr8_60009_G_T"));
    }

    #[test]
    fn test_lookup_unrecognized() {
        let hit = lookup_one(&store(), "not-a-variant").unwrap();
        assert!(hit.canonical.is_none());
        assert!(hit.rsid.is_none());
    }
}
