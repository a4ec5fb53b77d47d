use tracing::{debug, info};

use crate::core::table::VariantTable;
use crate::core::types::IdKind;
use crate::error::Result;
use crate::lookup::shard::key_coordinates;
use crate::lookup::{LookupQuery, LookupStore};
use crate::pipeline::report::CoordinateStats;

/// Fills chromosome and position of rsID records from the lookup store
pub struct CoordinateResolver<'a> {
    store: &'a LookupStore,
}

impl<'a> CoordinateResolver<'a> {
    pub fn new(store: &'a LookupStore) -> Self {
        Self { store }
    }

    /// Look up every rsID record's coordinates.
    ///
    /// Shards are visited in the store's order and only while unresolved
    /// records remain. The first shard that maps an rsID to a single key wins;
    /// records with no match keep their prior (possibly null) coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if a shard cannot be read.
    pub fn resolve(&self, mut table: VariantTable) -> Result<(VariantTable, CoordinateStats)> {
        let (stats, _) = self.resolve_tables(std::slice::from_mut(&mut table))?;
        Ok((table, stats))
    }

    /// Resolve several tables in a single pass over the shards.
    ///
    /// Returns the combined statistics and the number of rsIDs left
    /// unresolved in each table, in input order.
    ///
    /// # Errors
    ///
    /// Returns an error if a shard cannot be read.
    pub fn resolve_tables(
        &self,
        tables: &mut [VariantTable],
    ) -> Result<(CoordinateStats, Vec<usize>)> {
        let mut pending: Vec<(usize, usize)> = Vec::new();
        for (t, table) in tables.iter().enumerate() {
            pending.extend(
                table
                    .records
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| r.kind() == IdKind::Rsid)
                    .map(|(i, _)| (t, i)),
            );
        }

        let mut stats = CoordinateStats {
            queried: pending.len(),
            ..CoordinateStats::default()
        };

        for chrom in self.store.chromosomes() {
            if pending.is_empty() {
                break;
            }
            let query = LookupQuery::rsids(
                pending
                    .iter()
                    .filter_map(|&(t, i)| tables[t].records[i].id.as_deref()),
            );
            let Some(shard) = self.store.load(chrom, &query)? else {
                continue;
            };
            stats.shards_loaded += 1;

            let before = pending.len();
            pending.retain(|&(t, i)| {
                let record = &mut tables[t].records[i];
                let found = record
                    .id
                    .as_deref()
                    .and_then(|rsid| shard.key_for(rsid))
                    .and_then(key_coordinates);
                match found {
                    Some((chrom, position)) => {
                        record.chrom = Some(chrom);
                        record.position = Some(position);
                        false
                    }
                    None => true,
                }
            });
            debug!(
                "Chromosome {chrom} shard resolved {} rsIDs",
                before - pending.len()
            );
        }

        let mut unresolved = vec![0usize; tables.len()];
        for &(t, _) in &pending {
            unresolved[t] += 1;
        }
        stats.unresolved = pending.len();
        stats.resolved = stats.queried - stats.unresolved;
        info!(
            "Resolved coordinates for {}/{} rsIDs ({} shards loaded)",
            stats.resolved, stats.queried, stats.shards_loaded
        );

        Ok((stats, unresolved))
    }
}
