use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::{ArrowWriter, ProjectionMask};
use tracing::debug;

use super::{LookupError, KEY_COLUMN, RSID_COLUMN};
use crate::utils::validation::canonical_chromosome;

/// One-directional map where a key seen with two distinct values maps to `None`
#[derive(Debug, Default, Clone)]
struct UniqueMap(HashMap<String, Option<String>>);

impl UniqueMap {
    fn insert(&mut self, key: &str, value: &str) {
        match self.0.get_mut(key) {
            None => {
                self.0.insert(key.to_string(), Some(value.to_string()));
            }
            Some(existing) => {
                if existing.as_deref() != Some(value) {
                    *existing = None;
                }
            }
        }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Option::as_deref)
    }

    fn ambiguous(&self) -> usize {
        self.0.values().filter(|v| v.is_none()).count()
    }
}

/// Which side of a shard a lookup is keyed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupDirection {
    /// rsID to positional key
    RsidToKey,
    /// Positional key to rsID
    KeyToRsid,
}

/// The rsIDs or keys a resolver is about to look up.
///
/// A shard read for a query keeps only the rows whose rsID (or key) is
/// wanted, so memory follows the number of queried variants rather than the
/// size of the shard. Every row of a wanted rsID or key is kept, so one with
/// two distinct counterparts still resolves to no match.
#[derive(Debug, Clone)]
pub struct LookupQuery {
    direction: LookupDirection,
    wanted: HashSet<String>,
}

impl LookupQuery {
    /// Query positional keys by rsID
    pub fn rsids<S: Into<String>>(rsids: impl IntoIterator<Item = S>) -> Self {
        Self {
            direction: LookupDirection::RsidToKey,
            wanted: rsids.into_iter().map(Into::into).collect(),
        }
    }

    /// Query rsIDs by `chr`-prefixed positional key
    pub fn keys<S: Into<String>>(keys: impl IntoIterator<Item = S>) -> Self {
        Self {
            direction: LookupDirection::KeyToRsid,
            wanted: keys.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn direction(&self) -> LookupDirection {
        self.direction
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.wanted.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wanted.is_empty()
    }

    fn matches(&self, rsid: &str, key: &str) -> bool {
        match self.direction {
            LookupDirection::RsidToKey => self.wanted.contains(rsid),
            LookupDirection::KeyToRsid => self.wanted.contains(key),
        }
    }
}

/// A single chromosome's rsID <-> positional key table.
///
/// Shards read from parquet hold only the rows and the direction a
/// [`LookupQuery`] asked for; shards built in memory hold both directions.
#[derive(Debug, Default, Clone)]
pub struct LookupShard {
    chrom: String,
    rsid_to_key: UniqueMap,
    key_to_rsid: UniqueMap,
}

impl LookupShard {
    pub fn new(chrom: impl Into<String>) -> Self {
        Self {
            chrom: chrom.into(),
            ..Self::default()
        }
    }

    /// Build a shard from `(key, rsid)` pairs
    pub fn from_pairs<K, R>(
        chrom: impl Into<String>,
        pairs: impl IntoIterator<Item = (K, R)>,
    ) -> Self
    where
        K: AsRef<str>,
        R: AsRef<str>,
    {
        let mut shard = Self::new(chrom);
        for (key, rsid) in pairs {
            shard.insert(key.as_ref(), rsid.as_ref());
        }
        shard
    }

    pub fn insert(&mut self, key: &str, rsid: &str) {
        self.rsid_to_key.insert(rsid, key);
        self.key_to_rsid.insert(key, rsid);
    }

    fn insert_directed(&mut self, direction: LookupDirection, key: &str, rsid: &str) {
        match direction {
            LookupDirection::RsidToKey => self.rsid_to_key.insert(rsid, key),
            LookupDirection::KeyToRsid => self.key_to_rsid.insert(key, rsid),
        }
    }

    /// Read the rows of a parquet shard that answer `query`.
    ///
    /// The shard needs `RSID` and `ID` string columns; rows with a null in
    /// either are skipped. Columns are scanned batch by batch and only
    /// matching rows are copied out.
    ///
    /// # Errors
    ///
    /// Returns `LookupError` if the file cannot be opened or decoded, or lacks
    /// one of the two columns.
    pub fn read_parquet(
        chrom: impl Into<String>,
        path: &Path,
        query: &LookupQuery,
    ) -> Result<Self, LookupError> {
        let mut shard = Self::new(chrom);
        if query.is_empty() {
            return Ok(shard);
        }

        let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?;
        let mask = ProjectionMask::columns(builder.parquet_schema(), [RSID_COLUMN, KEY_COLUMN]);
        let reader = builder.with_projection(mask).build()?;

        let (mut scanned, mut kept) = (0usize, 0usize);
        for batch in reader {
            let batch = batch?;
            let rsids = string_column(&batch, RSID_COLUMN, path)?;
            let keys = string_column(&batch, KEY_COLUMN, path)?;
            scanned += batch.num_rows();
            for i in 0..batch.num_rows() {
                if !(rsids.is_valid(i) && keys.is_valid(i)) {
                    continue;
                }
                let (rsid, key) = (rsids.value(i), keys.value(i));
                if query.matches(rsid, key) {
                    shard.insert_directed(query.direction, key, rsid);
                    kept += 1;
                }
            }
        }

        let ambiguous = match query.direction {
            LookupDirection::RsidToKey => shard.rsid_to_key.ambiguous(),
            LookupDirection::KeyToRsid => shard.key_to_rsid.ambiguous(),
        };
        debug!(
            "Kept {kept}/{scanned} rows for {} queried values on chromosome {} from {} ({ambiguous} ambiguous)",
            query.len(),
            shard.chrom,
            path.display()
        );
        Ok(shard)
    }

    #[must_use]
    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    /// Positional key of an rsID, if it maps to exactly one key
    #[must_use]
    pub fn key_for(&self, rsid: &str) -> Option<&str> {
        self.rsid_to_key.get(rsid)
    }

    /// rsID of a positional key, if it maps to exactly one rsID
    #[must_use]
    pub fn rsid_for(&self, key: &str) -> Option<&str> {
        self.key_to_rsid.get(key)
    }

    /// Number of distinct rsIDs and keys held, in either direction
    #[must_use]
    pub fn len(&self) -> usize {
        self.rsid_to_key.0.len().max(self.key_to_rsid.0.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn string_column(
    batch: &RecordBatch,
    column: &'static str,
    path: &Path,
) -> Result<StringArray, LookupError> {
    let missing = || LookupError::MissingColumn {
        column,
        path: path.to_path_buf(),
    };
    let array = batch.column_by_name(column).ok_or_else(missing)?;
    let utf8 = cast(array, &DataType::Utf8)?;
    utf8.as_any()
        .downcast_ref::<StringArray>()
        .cloned()
        .ok_or_else(missing)
}

/// Split a positional key (`chr8_60009_G_T`) into chromosome and position
#[must_use]
pub fn key_coordinates(key: &str) -> Option<(String, u64)> {
    let mut fields = key.split('_');
    let chrom = fields.next().filter(|c| !c.is_empty())?;
    let position = fields.next()?.parse().ok()?;
    Some((canonical_chromosome(chrom), position))
}

/// Write `(key, rsid)` rows as a parquet shard
///
/// # Errors
///
/// Returns `LookupError` if the file cannot be created or written.
pub fn write_parquet<K, R>(path: &Path, rows: &[(K, R)]) -> Result<(), LookupError>
where
    K: AsRef<str>,
    R: AsRef<str>,
{
    let schema = Arc::new(Schema::new(vec![
        Field::new(RSID_COLUMN, DataType::Utf8, true),
        Field::new(KEY_COLUMN, DataType::Utf8, true),
    ]));
    let rsids: ArrayRef = Arc::new(StringArray::from(
        rows.iter().map(|(_, r)| r.as_ref()).collect::<Vec<_>>(),
    ));
    let keys: ArrayRef = Arc::new(StringArray::from(
        rows.iter().map(|(k, _)| k.as_ref()).collect::<Vec<_>>(),
    ));
    let batch = RecordBatch::try_new(schema.clone(), vec![rsids, keys])?;

    let mut writer = ArrowWriter::try_new(File::create(path)?, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
