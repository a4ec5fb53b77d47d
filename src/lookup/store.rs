use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

use super::shard::{LookupQuery, LookupShard};
use super::LookupError;
use crate::utils::validation::{canonical_chromosome, chromosome_order};

#[allow(clippy::expect_used)] // Constant pattern
static SHARD_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"chr([0-9XY]+)\.lookup\.parquet$").expect("shard pattern must compile")
});

#[derive(Debug, Clone)]
enum ShardSource {
    File(PathBuf),
    Memory(Arc<LookupShard>),
}

#[derive(Debug, Clone)]
struct ShardEntry {
    chrom: String,
    source: ShardSource,
}

/// Set of per-chromosome lookup shards, visited in karyotypic order.
///
/// File-backed shards are read for one [`LookupQuery`] at a time and dropped
/// by the caller when done, so only the queried rows of one chromosome are
/// resident at once.
#[derive(Debug, Clone, Default)]
pub struct LookupStore {
    entries: Vec<ShardEntry>,
}

impl LookupStore {
    /// Discover `*.chr{N}.lookup.parquet` shards in a directory
    ///
    /// # Errors
    ///
    /// Returns `LookupError::NotADirectory` if `dir` is not a directory, or
    /// `LookupError::Io` if it cannot be listed.
    pub fn open(dir: &Path) -> Result<Self, LookupError> {
        if !dir.is_dir() {
            return Err(LookupError::NotADirectory(dir.to_path_buf()));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        let mut store = Self::default();
        for path in files {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(captures) = SHARD_FILE.captures(name) else {
                continue;
            };
            let chrom = canonical_chromosome(&captures[1]);
            if store.contains(&chrom) {
                warn!(
                    "Ignoring {}: a lookup shard for chromosome {chrom} was already found",
                    path.display()
                );
                continue;
            }
            debug!("Found lookup shard for chromosome {chrom}: {}", path.display());
            store.push(chrom, ShardSource::File(path));
        }

        Ok(store)
    }

    /// Build a store from shards already in memory
    pub fn from_shards(shards: impl IntoIterator<Item = LookupShard>) -> Self {
        let mut store = Self::default();
        for shard in shards {
            let chrom = shard.chrom().to_string();
            store.push(chrom, ShardSource::Memory(Arc::new(shard)));
        }
        store
    }

    fn push(&mut self, chrom: String, source: ShardSource) {
        self.entries.retain(|e| e.chrom != chrom);
        self.entries.push(ShardEntry { chrom, source });
        self.entries.sort_by_key(|e| chromosome_order(&e.chrom));
    }

    /// Chromosomes with a shard, in visitation order
    pub fn chromosomes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.chrom.as_str())
    }

    #[must_use]
    pub fn contains(&self, chrom: &str) -> bool {
        self.entries.iter().any(|e| e.chrom == chrom)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load the part of one chromosome's shard that answers `query`;
    /// `Ok(None)` when the chromosome has no shard. In-memory shards are
    /// returned whole.
    ///
    /// # Errors
    ///
    /// Returns `LookupError` if a file-backed shard cannot be read.
    pub fn load(
        &self,
        chrom: &str,
        query: &LookupQuery,
    ) -> Result<Option<Arc<LookupShard>>, LookupError> {
        let Some(entry) = self.entries.iter().find(|e| e.chrom == chrom) else {
            return Ok(None);
        };
        match &entry.source {
            ShardSource::Memory(shard) => Ok(Some(Arc::clone(shard))),
            ShardSource::File(path) => {
                LookupShard::read_parquet(chrom, path, query).map(|shard| Some(Arc::new(shard)))
            }
        }
    }
}
