//! Cohort-level filtering applied to a harmonized table before it is written.
//!
//! Filters run in a fixed order and each record is counted against the first
//! filter that removes it:
//!
//! 1. chromosome outside 1-22
//! 2. any null identity field or passthrough value (or a NaN float)
//! 3. strand-ambiguous allele pair (A/T, C/G)
//! 4. key `chr{CHR}_{BP}_{A2}_{A1}` missing from the allow-list

use tracing::info;

use crate::core::record::VariantRecord;
use crate::core::table::VariantTable;
use crate::core::types::Value;
use crate::parsing::allowlist::AllowList;
use crate::pipeline::report::QcStats;
use crate::utils::validation::{is_ambiguous_pair, is_autosome};

/// Which filters to apply
#[derive(Debug, Clone, Copy)]
pub struct QcConfig {
    pub autosomes_only: bool,
    pub drop_nulls: bool,
    pub drop_ambiguous: bool,
}

impl Default for QcConfig {
    fn default() -> Self {
        Self {
            autosomes_only: true,
            drop_nulls: true,
            drop_ambiguous: true,
        }
    }
}

pub struct QcFilter<'a> {
    config: QcConfig,
    allow_list: Option<&'a AllowList>,
}

impl<'a> QcFilter<'a> {
    #[must_use]
    pub fn new(config: QcConfig) -> Self {
        Self {
            config,
            allow_list: None,
        }
    }

    #[must_use]
    pub fn with_allow_list(mut self, allow_list: &'a AllowList) -> Self {
        self.allow_list = Some(allow_list);
        self
    }

    /// Apply the enabled filters
    #[must_use]
    pub fn apply(&self, table: VariantTable) -> (VariantTable, QcStats) {
        let mut stats = QcStats {
            input: table.len(),
            ..QcStats::default()
        };

        let mut kept = table.empty_like();
        for record in table.records {
            if self.config.autosomes_only && !record.chrom.as_deref().is_some_and(is_autosome) {
                stats.non_autosomal += 1;
            } else if self.config.drop_nulls && has_nulls(&record) {
                stats.null_values += 1;
            } else if self.config.drop_ambiguous && is_ambiguous(&record) {
                stats.ambiguous_alleles += 1;
            } else if self.allow_list.is_some_and(|list| {
                !allow_list_key(&record).is_some_and(|key| list.contains(&key))
            }) {
                stats.not_in_allow_list += 1;
            } else {
                kept.records.push(record);
            }
        }

        stats.retained = kept.len();
        info!(
            "QC retained {}/{} records ({} non-autosomal, {} with nulls, {} ambiguous, {} not allowed)",
            stats.retained,
            stats.input,
            stats.non_autosomal,
            stats.null_values,
            stats.ambiguous_alleles,
            stats.not_in_allow_list
        );
        (kept, stats)
    }
}

fn has_nulls(record: &VariantRecord) -> bool {
    record.id.is_none()
        || record.chrom.is_none()
        || record.position.is_none()
        || record.allele_high.is_none()
        || record.allele_low.is_none()
        || record
            .values
            .iter()
            .any(|v| v.is_null() || matches!(v, Value::Float(f) if f.is_nan()))
}

fn is_ambiguous(record: &VariantRecord) -> bool {
    match (&record.allele_high, &record.allele_low) {
        (Some(high), Some(low)) => is_ambiguous_pair(high, low),
        _ => false,
    }
}

/// Allow-list key of a record: `chr{CHR}_{BP}_{A2}_{A1}`
#[must_use]
pub fn allow_list_key(record: &VariantRecord) -> Option<String> {
    record.positional_from_fields().map(|id| format!("chr{id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::table::{IdentityColumns, PassthroughColumn};
    use crate::core::types::ColumnType;

    fn record(id: &str, chrom: &str, pos: u64, high: &str, low: &str, beta: Value) -> VariantRecord {
        VariantRecord::new()
            .with_id(id)
            .with_coordinates(chrom, pos)
            .with_alleles(high, low)
            .with_values(vec![beta])
    }

    fn table() -> VariantTable {
        VariantTable::new(
            IdentityColumns::all(),
            vec![PassthroughColumn::new("BETA", ColumnType::Float)],
        )
        .with_records(vec![
            record("rs1", "1", 100, "A", "G", Value::Float(0.1)),
            record("rs2", "X", 100, "A", "G", Value::Float(0.1)),
            record("rs3", "2", 100, "A", "T", Value::Float(0.1)),
            record("rs4", "3", 100, "C", "T", Value::Null),
            record("rs5", "4", 100, "C", "T", Value::Float(f64::NAN)),
            record("rs6", "5", 500, "G", "T", Value::Float(0.2)),
        ])
    }

    #[test]
    fn test_default_filters() {
        let (kept, stats) = QcFilter::new(QcConfig::default()).apply(table());
        let ids: Vec<_> = kept.records.iter().map(|r| r.id.as_deref().unwrap()).collect();
        assert_eq!(ids, vec!["rs1", "rs6"]);
        assert_eq!(stats.non_autosomal, 1);
        assert_eq!(stats.ambiguous_alleles, 1);
        assert_eq!(stats.null_values, 2);
        assert_eq!(stats.retained, 2);
        assert_eq!(
            stats.input,
            stats.retained
                + stats.non_autosomal
                + stats.ambiguous_alleles
                + stats.null_values
                + stats.not_in_allow_list
        );
    }

    #[test]
    fn test_allow_list() {
        let list = AllowList::from_keys(["chr5_500_G_T"]);
        let (kept, stats) = QcFilter::new(QcConfig::default())
            .with_allow_list(&list)
            .apply(table());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept.records[0].id.as_deref(), Some("rs6"));
        assert_eq!(stats.not_in_allow_list, 1);
    }

    #[test]
    fn test_disabled_filters_keep_everything() {
        let config = QcConfig {
            autosomes_only: false,
            drop_nulls: false,
            drop_ambiguous: false,
        };
        let (kept, _) = QcFilter::new(config).apply(table());
        assert_eq!(kept.len(), 6);
    }

    #[test]
    fn test_allow_list_key() {
        let r = record("rs1", "X", 7, "C", "T", Value::Null);
        assert_eq!(allow_list_key(&r).as_deref(), Some("chrX_7_C_T"));
    }
}
