use serde::Serialize;

use crate::core::types::GenomeBuild;
use crate::resolve::strand::Orientation;

/// Outcome counts of identity normalization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationStats {
    /// Records entering normalization
    pub input: usize,
    /// Records with a canonical identifier afterwards
    pub accepted: usize,
    /// Records whose identifier matched neither shape after repair
    pub dropped: usize,
    /// Identifiers regenerated from coordinate and allele fields
    pub repaired: usize,
}

/// Sizes of the three routing partitions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PartitionStats {
    pub rsid_complete: usize,
    pub rsid_missing_coordinates: usize,
    pub positional: usize,
}

/// rsID to coordinate lookups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoordinateStats {
    pub queried: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub shards_loaded: usize,
}

/// Interval lifting between builds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LiftStats {
    pub submitted: usize,
    pub mapped: usize,
    pub unmapped: usize,
}

/// How many positional records resolved through each orientation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrientationCounts {
    pub identity: usize,
    pub swap: usize,
    pub reverse_complement: usize,
    pub swap_then_reverse_complement: usize,
}

impl OrientationCounts {
    pub fn record(&mut self, orientation: Orientation) {
        match orientation {
            Orientation::Identity => self.identity += 1,
            Orientation::Swap => self.swap += 1,
            Orientation::ReverseComplement => self.reverse_complement += 1,
            Orientation::SwapThenReverseComplement => self.swap_then_reverse_complement += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.identity + self.swap + self.reverse_complement + self.swap_then_reverse_complement
    }
}

/// Positional to rsID resolution
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StrandStats {
    pub queried: usize,
    pub resolved: OrientationCounts,
    pub unresolved: usize,
    /// Chromosomes present in the input with no lookup shard
    pub chromosomes_without_shard: Vec<String>,
}

/// Where the AF1 column's values came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Af1Source {
    /// Read from the input
    #[default]
    Column,
    /// Derived from `minor_AF` and `minor_allele`
    MinorAllele,
    /// No frequency available, filled with 0.5
    Constant,
}

impl std::fmt::Display for Af1Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Column => write!(f, "input column"),
            Self::MinorAllele => write!(f, "minor allele frequency"),
            Self::Constant => write!(f, "constant 0.5"),
        }
    }
}

/// Effect-size cleanup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EffectStats {
    pub input: usize,
    /// BETA or SE missing, non-numeric, 99 or -99
    pub invalid_effect: usize,
    /// `minor_AF` missing, 99, -99 or below 0.01
    pub low_minor_af: usize,
    pub z_derived: bool,
    pub infinite_z: usize,
    pub af1_source: Af1Source,
    pub retained: usize,
}

/// Removals made by the final cohort filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QcStats {
    pub input: usize,
    pub non_autosomal: usize,
    pub ambiguous_alleles: usize,
    pub null_values: usize,
    pub not_in_allow_list: usize,
    pub retained: usize,
}

/// Run-scoped record of what every stage did to the table
#[derive(Debug, Clone, Serialize)]
pub struct HarmonizeReport {
    pub generated_at: String,
    pub source_build: GenomeBuild,
    pub target_build: GenomeBuild,
    pub normalization: NormalizationStats,
    pub partitions: PartitionStats,
    pub coordinates: CoordinateStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liftover: Option<LiftStats>,
    pub strand: StrandStats,
    pub duplicates_dropped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effects: Option<EffectStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qc: Option<QcStats>,
    pub output_records: usize,
}

impl HarmonizeReport {
    #[must_use]
    pub fn new(source_build: GenomeBuild, target_build: GenomeBuild) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            source_build,
            target_build,
            normalization: NormalizationStats::default(),
            partitions: PartitionStats::default(),
            coordinates: CoordinateStats::default(),
            liftover: None,
            strand: StrandStats::default(),
            duplicates_dropped: 0,
            effects: None,
            qc: None,
            output_records: 0,
        }
    }
}

impl std::fmt::Display for HarmonizeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let n = &self.normalization;
        writeln!(f, "Build: {} -> {}", self.source_build, self.target_build)?;
        writeln!(
            f,
            "Normalization: {}/{} accepted, {} dropped, {} repaired",
            n.accepted, n.input, n.dropped, n.repaired
        )?;
        let p = &self.partitions;
        writeln!(
            f,
            "Partitions: {} rsID, {} rsID missing coordinates, {} positional",
            p.rsid_complete, p.rsid_missing_coordinates, p.positional
        )?;
        let c = &self.coordinates;
        writeln!(
            f,
            "rsID coordinates: {}/{} resolved ({} shards loaded)",
            c.resolved, c.queried, c.shards_loaded
        )?;
        if let Some(lift) = &self.liftover {
            writeln!(
                f,
                "Liftover: {}/{} mapped, {} unmapped",
                lift.mapped, lift.submitted, lift.unmapped
            )?;
        }
        let s = &self.strand;
        writeln!(
            f,
            "Positional to rsID: {}/{} resolved (identity {}, swap {}, reverse complement {}, swap + reverse complement {})",
            s.resolved.total(),
            s.queried,
            s.resolved.identity,
            s.resolved.swap,
            s.resolved.reverse_complement,
            s.resolved.swap_then_reverse_complement
        )?;
        if !s.chromosomes_without_shard.is_empty() {
            writeln!(
                f,
                "No lookup shard for chromosomes: {}",
                s.chromosomes_without_shard.join(", ")
            )?;
        }
        writeln!(f, "Duplicate identifiers dropped: {}", self.duplicates_dropped)?;
        if let Some(e) = &self.effects {
            writeln!(
                f,
                "Effect statistics: {}/{} retained ({} invalid BETA/SE, {} low minor_AF, {} infinite Z), Z {}, AF1 from {}",
                e.retained,
                e.input,
                e.invalid_effect,
                e.low_minor_af,
                e.infinite_z,
                if e.z_derived { "derived" } else { "read" },
                e.af1_source
            )?;
        }
        if let Some(qc) = &self.qc {
            writeln!(
                f,
                "QC: {}/{} retained ({} non-autosomal, {} ambiguous alleles, {} null values, {} not in allow-list)",
                qc.retained,
                qc.input,
                qc.non_autosomal,
                qc.ambiguous_alleles,
                qc.null_values,
                qc.not_in_allow_list
            )?;
        }
        write!(f, "Output records: {}", self.output_records)
    }
}
