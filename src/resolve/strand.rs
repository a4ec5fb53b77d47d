use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::core::pattern::{classify_canonical, PositionalId};
use crate::core::table::VariantTable;
use crate::core::types::IdKind;
use crate::error::Result;
use crate::lookup::{LookupQuery, LookupStore};
use crate::pipeline::report::StrandStats;
use crate::utils::validation::{chromosome_order, complement_allele};

/// Allele orientation transform applied before a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Alleles as reported
    Identity,
    /// Alleles in swapped order
    Swap,
    /// Each allele base substituted with its pairing base
    ReverseComplement,
    /// Swapped, then complemented
    SwapThenReverseComplement,
}

impl Orientation {
    /// Lookup order; the first orientation that resolves wins
    pub const PRECEDENCE: [Self; 4] = [
        Self::Identity,
        Self::Swap,
        Self::ReverseComplement,
        Self::SwapThenReverseComplement,
    ];

    #[must_use]
    pub fn apply(self, id: &PositionalId) -> PositionalId {
        let (high, low) = match self {
            Self::Identity | Self::ReverseComplement => (&id.allele_high, &id.allele_low),
            Self::Swap | Self::SwapThenReverseComplement => (&id.allele_low, &id.allele_high),
        };
        let (high, low) = match self {
            Self::Identity | Self::Swap => (high.clone(), low.clone()),
            Self::ReverseComplement | Self::SwapThenReverseComplement => {
                (complement_allele(high), complement_allele(low))
            }
        };
        PositionalId::new(id.chrom.clone(), id.position, high, low)
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identity => write!(f, "identity"),
            Self::Swap => write!(f, "swap"),
            Self::ReverseComplement => write!(f, "reverse complement"),
            Self::SwapThenReverseComplement => write!(f, "swap + reverse complement"),
        }
    }
}

/// Replaces positional identifiers with rsIDs, trying all four orientations
pub struct StrandResolver<'a> {
    store: &'a LookupStore,
}

impl<'a> StrandResolver<'a> {
    pub fn new(store: &'a LookupStore) -> Self {
        Self { store }
    }

    /// Every key an identifier may be stored under, in precedence order
    #[must_use]
    pub fn candidate_keys(id: &PositionalId) -> [String; 4] {
        Orientation::PRECEDENCE.map(|orientation| orientation.apply(id).lookup_key())
    }

    /// Match one identifier against a lookup function in precedence order
    pub fn find_orientation<'s>(
        id: &PositionalId,
        lookup: impl Fn(&str) -> Option<&'s str>,
    ) -> Option<(Orientation, &'s str)> {
        Orientation::PRECEDENCE.into_iter().find_map(|orientation| {
            let key = orientation.apply(id).lookup_key();
            lookup(&key)
                .filter(|rsid| classify_canonical(rsid) == IdKind::Rsid)
                .map(|rsid| (orientation, rsid))
        })
    }

    /// Resolve the rsID of every positional record whose chromosome has a
    /// shard. Unresolved records keep their positional identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if a shard cannot be read.
    pub fn resolve(&self, mut table: VariantTable) -> Result<(VariantTable, StrandStats)> {
        let mut by_chrom: BTreeMap<(u8, u32, String), Vec<(usize, PositionalId)>> =
            BTreeMap::new();
        for (i, record) in table.records.iter().enumerate() {
            if let Some(id) = record.positional_id() {
                by_chrom
                    .entry(chromosome_order(&id.chrom))
                    .or_default()
                    .push((i, id));
            }
        }

        let mut stats = StrandStats {
            queried: by_chrom.values().map(Vec::len).sum(),
            ..StrandStats::default()
        };

        for group in by_chrom.into_values() {
            let chrom = group[0].1.chrom.clone();
            let query =
                LookupQuery::keys(group.iter().flat_map(|(_, id)| Self::candidate_keys(id)));
            let Some(shard) = self.store.load(&chrom, &query)? else {
                warn!(
                    "No lookup shard for chromosome {chrom}; {} positional identifiers kept",
                    group.len()
                );
                stats.unresolved += group.len();
                stats.chromosomes_without_shard.push(chrom);
                continue;
            };

            let mut resolved = 0usize;
            for (i, id) in group {
                match Self::find_orientation(&id, |key| shard.rsid_for(key)) {
                    Some((orientation, rsid)) => {
                        table.records[i].id = Some(rsid.to_string());
                        stats.resolved.record(orientation);
                        resolved += 1;
                    }
                    None => stats.unresolved += 1,
                }
            }
            debug!("Chromosome {chrom}: {resolved} positional identifiers resolved to rsIDs");
        }

        info!(
            "Resolved {}/{} positional identifiers to rsIDs",
            stats.resolved.total(),
            stats.queried
        );
        Ok((table, stats))
    }
}
