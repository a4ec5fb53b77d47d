//! Chromosome-sharded rsID lookup tables.
//!
//! Each shard is a parquet file holding one chromosome's `RSID` / `ID` pairs,
//! where `ID` is a `chr`-prefixed positional key such as `chr8_60009_G_T`.
//! Shards are discovered by file name (`*.chr{N}.lookup.parquet`) and read
//! lazily, only when a resolver needs that chromosome. A read is scoped to a
//! [`LookupQuery`]: only rows for the rsIDs or keys being resolved are kept.
//!
//! ## Ambiguity
//!
//! Exact duplicate rows collapse. A key with more than one distinct
//! counterpart (an rsID placed at two positions, or a position carrying two
//! rsIDs) is kept in the shard but resolves to no match:
//!
//! ```rust
//! use gwas_harmonize::lookup::shard::LookupShard;
//!
//! let shard = LookupShard::from_pairs(
//!     "1",
//!     [
//!         ("chr1_100_A_G", "rs1"),
//!         ("chr1_100_A_G", "rs2"),
//!         ("chr1_200_C_T", "rs3"),
//!         ("chr1_200_C_T", "rs3"),
//!     ],
//! );
//! assert_eq!(shard.rsid_for("chr1_100_A_G"), None);
//! assert_eq!(shard.rsid_for("chr1_200_C_T"), Some("rs3"));
//! ```

use std::path::PathBuf;
use thiserror::Error;

pub mod shard;
pub mod store;

pub use shard::{LookupDirection, LookupQuery, LookupShard};
pub use store::LookupStore;

/// Column holding rsIDs
pub const RSID_COLUMN: &str = "RSID";

/// Column holding `chr`-prefixed positional keys
pub const KEY_COLUMN: &str = "ID";

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Failed to read lookup shard: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Failed to decode arrow data: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Lookup shard {} has no '{column}' column", path.display())]
    MissingColumn { column: &'static str, path: PathBuf },

    #[error("Lookup directory {} does not exist or is not a directory", .0.display())]
    NotADirectory(PathBuf),
}
