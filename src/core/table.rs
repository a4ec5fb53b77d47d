use serde::{Deserialize, Serialize};

use crate::core::record::VariantRecord;
use crate::core::types::ColumnType;

pub const ID_COLUMN: &str = "SNP";
pub const CHROM_COLUMN: &str = "CHR";
pub const POSITION_COLUMN: &str = "BP";
pub const ALLELE_HIGH_COLUMN: &str = "A2";
pub const ALLELE_LOW_COLUMN: &str = "A1";

/// Identity column names in table order
pub const IDENTITY_COLUMNS: [&str; 5] = [
    ID_COLUMN,
    CHROM_COLUMN,
    POSITION_COLUMN,
    ALLELE_HIGH_COLUMN,
    ALLELE_LOW_COLUMN,
];

/// Which identity columns exist in the table (as opposed to per-record nulls)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IdentityColumns {
    pub id: bool,
    pub chrom: bool,
    pub position: bool,
    pub allele_high: bool,
    pub allele_low: bool,
}

impl IdentityColumns {
    /// Every identity column present
    #[must_use]
    pub fn all() -> Self {
        Self {
            id: true,
            chrom: true,
            position: true,
            allele_high: true,
            allele_low: true,
        }
    }

    /// Chromosome, position and both alleles are present
    #[must_use]
    pub fn has_coordinates_and_alleles(&self) -> bool {
        self.chrom && self.position && self.allele_high && self.allele_low
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.id && self.has_coordinates_and_alleles()
    }
}

/// A non-identity column carried through the engine untouched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassthroughColumn {
    pub name: String,
    pub dtype: ColumnType,
}

impl PassthroughColumn {
    pub fn new(name: impl Into<String>, dtype: ColumnType) -> Self {
        Self {
            name: name.into(),
            dtype,
        }
    }
}

/// The working table: a schema shared by every record plus the records
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VariantTable {
    pub identity: IdentityColumns,
    pub columns: Vec<PassthroughColumn>,
    pub records: Vec<VariantRecord>,
}

impl VariantTable {
    #[must_use]
    pub fn new(identity: IdentityColumns, columns: Vec<PassthroughColumn>) -> Self {
        Self {
            identity,
            columns,
            records: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_records(mut self, records: Vec<VariantRecord>) -> Self {
        self.records = records;
        self
    }

    /// A table with the same schema and no records
    #[must_use]
    pub fn empty_like(&self) -> Self {
        Self::new(self.identity, self.columns.clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every column name in table order: identity columns, then passthrough
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        IDENTITY_COLUMNS
            .iter()
            .map(|s| (*s).to_string())
            .chain(self.columns.iter().map(|c| c.name.clone()))
            .collect()
    }

    #[must_use]
    pub fn passthrough_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Split records by a predicate, keeping the schema on both sides.
    /// Returns (matching, rest).
    #[must_use]
    pub fn partition(self, predicate: impl Fn(&VariantRecord) -> bool) -> (Self, Self) {
        let mut matching = self.empty_like();
        let mut rest = self.empty_like();
        for record in self.records {
            if predicate(&record) {
                matching.records.push(record);
            } else {
                rest.records.push(record);
            }
        }
        (matching, rest)
    }

    /// Append the records of tables sharing this table's schema
    #[must_use]
    pub fn concat(mut self, others: impl IntoIterator<Item = Self>) -> Self {
        for other in others {
            debug_assert_eq!(self.columns, other.columns, "schemas must match");
            self.records.extend(other.records);
        }
        self
    }
}
