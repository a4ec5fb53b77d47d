use serde::{Deserialize, Serialize};

use crate::core::pattern::{classify_canonical, PositionalId};
use crate::core::types::{IdKind, Value};

/// A single summary-statistics row.
///
/// Identity fields are optional until normalization fills them in; the
/// passthrough values are carried untouched in the order of the owning table's
/// passthrough columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VariantRecord {
    /// Variant identifier (SNP column)
    pub id: Option<String>,

    /// Chromosome code without `chr` prefix (CHR column)
    pub chrom: Option<String>,

    /// 1-based position (BP column)
    pub position: Option<u64>,

    /// Non-effect / other allele (A2 column)
    pub allele_high: Option<String>,

    /// Effect / tested allele (A1 column)
    pub allele_low: Option<String>,

    /// Passthrough values (effect size, standard error, ...)
    pub values: Vec<Value>,
}

impl VariantRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_coordinates(mut self, chrom: impl Into<String>, position: u64) -> Self {
        self.chrom = Some(chrom.into());
        self.position = Some(position);
        self
    }

    #[must_use]
    pub fn with_alleles(
        mut self,
        allele_high: impl Into<String>,
        allele_low: impl Into<String>,
    ) -> Self {
        self.allele_high = Some(allele_high.into());
        self.allele_low = Some(allele_low.into());
        self
    }

    #[must_use]
    pub fn with_values(mut self, values: Vec<Value>) -> Self {
        self.values = values;
        self
    }

    /// Shape of the identifier, which must already be canonical
    #[must_use]
    pub fn kind(&self) -> IdKind {
        self.id
            .as_deref()
            .map_or(IdKind::Unrecognized, classify_canonical)
    }

    /// Both chromosome and position are known
    #[must_use]
    pub fn has_coordinates(&self) -> bool {
        self.chrom.is_some() && self.position.is_some()
    }

    /// Build `chrom_position_ALLELEHIGH_ALLELELOW` from the coordinate fields.
    /// Returns `None` if any of the four fields is missing.
    #[must_use]
    pub fn positional_from_fields(&self) -> Option<String> {
        Some(format!(
            "{}_{}_{}_{}",
            self.chrom.as_deref()?,
            self.position?,
            self.allele_high.as_deref()?.to_uppercase(),
            self.allele_low.as_deref()?.to_uppercase()
        ))
    }

    /// Parse the identifier as a positional identifier
    #[must_use]
    pub fn positional_id(&self) -> Option<PositionalId> {
        if self.kind() != IdKind::Positional {
            return None;
        }
        self.id.as_deref().and_then(PositionalId::parse)
    }
}
