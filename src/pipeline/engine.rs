use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::report::{HarmonizeReport, PartitionStats};
use crate::core::table::VariantTable;
use crate::core::types::{GenomeBuild, IdKind};
use crate::error::{HarmonizeError, Result};
use crate::liftover::{BuildLifter, CoordinateMapper, LiftOverConfig, LiftOverTool};
use crate::lookup::LookupStore;
use crate::normalize::normalize;
use crate::resolve::{CoordinateResolver, StrandResolver};

/// Settings for one harmonization run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarmonizeConfig {
    /// Build the input coordinates are reported in
    pub source_build: GenomeBuild,
    /// Build the output coordinates should be in
    pub target_build: GenomeBuild,
    /// External lifting tool, used only when the builds differ
    pub liftover: LiftOverConfig,
}

impl Default for HarmonizeConfig {
    fn default() -> Self {
        Self {
            source_build: GenomeBuild::Hg38,
            target_build: GenomeBuild::Hg38,
            liftover: LiftOverConfig::default(),
        }
    }
}

impl HarmonizeConfig {
    #[must_use]
    pub fn needs_liftover(&self) -> bool {
        self.source_build != self.target_build
    }
}

/// Routes records through normalization, lookup, liftover and strand
/// resolution and recombines them
pub struct Harmonizer<'a> {
    store: &'a LookupStore,
    config: HarmonizeConfig,
    mapper: Option<Box<dyn CoordinateMapper + 'a>>,
}

impl<'a> Harmonizer<'a> {
    pub fn new(store: &'a LookupStore, config: HarmonizeConfig) -> Self {
        Self {
            store,
            config,
            mapper: None,
        }
    }

    /// Use this mapper instead of the configured external tool
    #[must_use]
    pub fn with_mapper(mut self, mapper: Box<dyn CoordinateMapper + 'a>) -> Self {
        self.mapper = Some(mapper);
        self
    }

    #[must_use]
    pub fn config(&self) -> &HarmonizeConfig {
        &self.config
    }

    /// Harmonize a table.
    ///
    /// 1. Normalize identifiers (records that stay unrecognized are dropped).
    /// 2. Partition into complete rsID, rsID missing coordinates, and
    ///    positional records.
    /// 3. Look up coordinates for rsIDs missing them.
    /// 4. When the builds differ, lift positional records and reposition
    ///    complete rsIDs by lookup.
    /// 5. Resolve positional records to rsIDs under four allele orientations.
    /// 6. Concatenate, dropping complete rsID rows whose identifier was also
    ///    produced by step 5.
    ///
    /// # Errors
    ///
    /// Returns `HarmonizeError::Schema` for unusable identity columns,
    /// `HarmonizeError::Config`/`Resource` when a build change cannot be
    /// carried out, and any lookup, lifting or I/O failure.
    pub fn run(&self, table: VariantTable) -> Result<(VariantTable, HarmonizeReport)> {
        let mut report = HarmonizeReport::new(self.config.source_build, self.config.target_build);

        // Fail on an unusable lift setup before any work is done
        let external;
        let mapper: Option<&dyn CoordinateMapper> =
            match (&self.mapper, self.config.needs_liftover()) {
                (_, false) => None,
                (Some(mapper), true) => Some(mapper.as_ref()),
                (None, true) => {
                    external = LiftOverTool::from_config(&self.config.liftover)?;
                    Some(&external)
                }
            };

        let (table, normalization) = normalize(table)?;
        report.normalization = normalization;

        let (positional, rsid) = table.partition(|r| r.kind() == IdKind::Positional);
        let (rsid_complete, rsid_missing) = rsid.partition(|r| r.has_coordinates());
        report.partitions = PartitionStats {
            rsid_complete: rsid_complete.len(),
            rsid_missing_coordinates: rsid_missing.len(),
            positional: positional.len(),
        };
        info!(
            "Partitioned {} records: {} rsIDs with coordinates, {} rsIDs without, {} positional",
            report.normalization.accepted,
            rsid_complete.len(),
            rsid_missing.len(),
            positional.len()
        );

        // Complete rsIDs are repositioned by lookup on a build change. Both
        // rsID partitions share one pass over the shards.
        let mut rsid_tables = [rsid_missing, rsid_complete];
        let resolve_count = if mapper.is_some() { 2 } else { 1 };
        let (coordinates, unresolved) = CoordinateResolver::new(self.store)
            .resolve_tables(&mut rsid_tables[..resolve_count])?;
        report.coordinates = coordinates;
        let [rsid_missing, rsid_complete] = rsid_tables;

        let positional = match mapper {
            Some(mapper) => {
                info!(
                    "Converting from {} to {}",
                    self.config.source_build, self.config.target_build
                );
                if unresolved[1] > 0 {
                    warn!(
                        "{} rsIDs could not be repositioned and keep {} coordinates",
                        unresolved[1], self.config.source_build
                    );
                }
                let (positional, lift) = BuildLifter::new(mapper).lift(positional)?;
                report.liftover = Some(lift);
                positional
            }
            None => positional,
        };

        let (positional, strand) = StrandResolver::new(self.store).resolve(positional)?;
        report.strand = strand;

        let resolved_ids: HashSet<&str> = positional
            .records
            .iter()
            .filter_map(|r| r.id.as_deref())
            .collect();
        let before = rsid_complete.len();
        let (rsid_complete, _duplicates) = rsid_complete.partition(|r| {
            r.id
                .as_deref()
                .map_or(true, |id| !resolved_ids.contains(id))
        });
        report.duplicates_dropped = before - rsid_complete.len();
        if report.duplicates_dropped > 0 {
            info!(
                "Dropped {} rsID rows duplicated by resolved positional records",
                report.duplicates_dropped
            );
        }

        let output = rsid_complete.concat([rsid_missing, positional]);
        report.output_records = output.len();
        info!("{} records harmonized", output.len());
        Ok((output, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::VariantRecord;
    use crate::core::table::IdentityColumns;
    use crate::liftover::{BedInterval, LiftOutput};
    use crate::lookup::LookupShard;

    struct ShiftMapper(u64);

    impl CoordinateMapper for ShiftMapper {
        fn lift(&self, intervals: &[BedInterval]) -> Result<LiftOutput> {
            let mapped = intervals
                .iter()
                .cloned()
                .map(|mut i| {
                    i.start += self.0;
                    i.end += self.0;
                    i
                })
                .collect();
            Ok(LiftOutput {
                mapped,
                unmapped: Vec::new(),
            })
        }
    }

    fn store() -> LookupStore {
        LookupStore::from_shards([
            LookupShard::from_pairs(
                "1",
                [
                    ("chr1_1100_A_G", "rs100"),
                    ("chr1_2000_C_T", "rs200"),
                    ("chr1_5000_G_T", "rs500"),
                ],
            ),
            LookupShard::from_pairs("8", [("chr8_60009_G_T", "rs999")]),
        ])
    }

    fn input() -> VariantTable {
        VariantTable::new(IdentityColumns::all(), Vec::new()).with_records(vec![
            VariantRecord::new()
                .with_id("rs999")
                .with_coordinates("8", 60009)
                .with_alleles("G", "T"),
            VariantRecord::new().with_id("rs200").with_alleles("C", "T"),
            VariantRecord::new()
                .with_id("8:60009:t:g")
                .with_coordinates("8", 60009)
                .with_alleles("T", "G"),
            VariantRecord::new().with_id("garbage"),
        ])
    }

    #[test]
    fn test_run_same_build() {
        let store = store();
        let harmonizer = Harmonizer::new(&store, HarmonizeConfig::default());
        let (output, report) = harmonizer.run(input()).unwrap();

        let ids: Vec<_> = output.records.iter().map(|r| r.id.clone().unwrap()).collect();
        // rs999 with coordinates is superseded by the resolved positional row
        assert_eq!(ids, vec!["rs200", "rs999"]);
        assert_eq!(output.records[0].position, Some(2000));
        assert_eq!(output.records[1].allele_high.as_deref(), Some("T"));

        assert_eq!(report.normalization.dropped, 1);
        assert_eq!(report.partitions.rsid_complete, 1);
        assert_eq!(report.partitions.rsid_missing_coordinates, 1);
        assert_eq!(report.partitions.positional, 1);
        assert_eq!(report.strand.resolved.swap, 1);
        assert_eq!(report.duplicates_dropped, 1);
        assert!(report.liftover.is_none());
        assert_eq!(report.output_records, 2);
    }

    #[test]
    fn test_run_with_build_change() {
        let store = store();
        let config = HarmonizeConfig {
            source_build: GenomeBuild::Hg19,
            ..HarmonizeConfig::default()
        };
        let table = VariantTable::new(IdentityColumns::all(), Vec::new()).with_records(vec![
            VariantRecord::new()
                .with_id("rs500")
                .with_coordinates("1", 4000)
                .with_alleles("G", "T"),
            VariantRecord::new()
                .with_id("1_100_A_G")
                .with_coordinates("1", 100)
                .with_alleles("A", "G"),
        ]);

        let harmonizer = Harmonizer::new(&store, config).with_mapper(Box::new(ShiftMapper(1000)));
        let (output, report) = harmonizer.run(table).unwrap();

        // rsID repositioned by lookup rather than by lifting
        assert_eq!(output.records[0].id.as_deref(), Some("rs500"));
        assert_eq!(output.records[0].position, Some(5000));
        // positional lifted to 1_1100_A_G, then resolved
        assert_eq!(output.records[1].id.as_deref(), Some("rs100"));
        assert_eq!(output.records[1].position, Some(1100));

        let lift = report.liftover.unwrap();
        assert_eq!(lift.mapped, 1);
        assert_eq!(report.strand.resolved.identity, 1);
    }

    #[test]
    fn test_build_change_reads_each_shard_once_for_rsids() {
        let store = store();
        let config = HarmonizeConfig {
            source_build: GenomeBuild::Hg19,
            ..HarmonizeConfig::default()
        };
        let table = VariantTable::new(IdentityColumns::all(), Vec::new()).with_records(vec![
            VariantRecord::new().with_id("rs200").with_alleles("C", "T"),
            VariantRecord::new()
                .with_id("rs999")
                .with_coordinates("8", 59000)
                .with_alleles("G", "T"),
            VariantRecord::new()
                .with_id("rs404")
                .with_coordinates("2", 10)
                .with_alleles("A", "G"),
        ]);

        let harmonizer = Harmonizer::new(&store, config).with_mapper(Box::new(ShiftMapper(0)));
        let (output, report) = harmonizer.run(table).unwrap();

        assert_eq!(report.coordinates.queried, 3);
        assert_eq!(report.coordinates.resolved, 2);
        assert_eq!(report.coordinates.unresolved, 1);
        assert_eq!(report.coordinates.shards_loaded, 2);

        // complete rsIDs first, then the one that was missing coordinates
        let positions: Vec<_> = output.records.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![Some(60009), Some(10), Some(2000)]);
    }

    #[test]
    fn test_build_change_without_chain_fails() {
        let store = store();
        let config = HarmonizeConfig {
            source_build: GenomeBuild::Hg19,
            ..HarmonizeConfig::default()
        };
        let result = Harmonizer::new(&store, config).run(input());
        assert!(matches!(result, Err(HarmonizeError::Config(_))));
    }

    #[test]
    fn test_schema_error_propagates() {
        let store = store();
        let identity = IdentityColumns {
            id: false,
            chrom: true,
            position: true,
            allele_high: false,
            allele_low: true,
        };
        let table = VariantTable::new(identity, Vec::new());
        let result = Harmonizer::new(&store, HarmonizeConfig::default()).run(table);
        assert!(matches!(result, Err(HarmonizeError::Schema(_))));
    }
}
