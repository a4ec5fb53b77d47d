//! # gwas-harmonize
//!
//! A library for giving every variant in a GWAS summary-statistics file a
//! canonical identity.
//!
//! Summary statistics from different providers identify variants in
//! incompatible ways: some use rsIDs (`rs123`, sometimes with extra tokens such
//! as `rs123:384923:A:G`), others positional identifiers (`8:60009:G:T`,
//! `chr8_60009_g_t`), some only separate chromosome/position/allele columns.
//! Coordinates may be on hg19 or hg38, and alleles may be swapped or reported
//! on the opposite strand.
//!
//! `gwas-harmonize` normalizes all of this:
//!
//! ## Features
//!
//! - **Identifier recognition**: rsID and positional shapes, case- and separator-insensitive
//! - **Field derivation**: identifier from coordinates and coordinates from identifier
//! - **Coordinate lookup**: rsID positions from per-chromosome dbSNP parquet shards
//! - **Liftover**: hg19 <-> hg38 through an external `liftOver` with a timeout
//! - **Strand/switch resolution**: rsIDs for positional variants under four allele orientations
//! - **Effect statistics**: sentinel filtering, derived Z, AF1 from minor allele frequencies
//! - **Run report**: per-stage accepted, dropped and resolved counts
//!
//! ## Example
//!
//! ```rust
//! use gwas_harmonize::core::record::VariantRecord;
//! use gwas_harmonize::core::table::{IdentityColumns, VariantTable};
//! use gwas_harmonize::lookup::{LookupShard, LookupStore};
//! use gwas_harmonize::pipeline::{HarmonizeConfig, Harmonizer};
//!
//! let store = LookupStore::from_shards([LookupShard::from_pairs(
//!     "8",
//!     [("chr8_60009_G_T", "rs999")],
//! )]);
//!
//! // A positional identifier reported with swapped alleles
//! let table = VariantTable::new(IdentityColumns::all(), Vec::new()).with_records(vec![
//!     VariantRecord::new()
//!         .with_id("8:60009:T:G")
//!         .with_coordinates("8", 60009)
//!         .with_alleles("T", "G"),
//! ]);
//!
//! let harmonizer = Harmonizer::new(&store, HarmonizeConfig::default());
//! let (table, report) = harmonizer.run(table).unwrap();
//!
//! assert_eq!(table.records[0].id.as_deref(), Some("rs999"));
//! assert_eq!(report.strand.resolved.swap, 1);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Identifier patterns, records, tables and value types
//! - [`normalize`]: Identity normalization
//! - [`lookup`]: Per-chromosome rsID lookup shards
//! - [`resolve`]: Coordinate and strand/switch resolution
//! - [`liftover`]: Build conversion through BED intervals
//! - [`pipeline`]: The end-to-end harmonizer and its report
//! - [`parsing`]: Summary-statistics and allow-list files
//! - [`effects`]: BETA, SE, Z and AF1 cleanup
//! - [`qc`]: Final cohort filter
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod effects;
pub mod error;
pub mod liftover;
pub mod lookup;
pub mod normalize;
pub mod parsing;
pub mod pipeline;
pub mod qc;
pub mod resolve;
pub mod utils;

// Re-export commonly used types for convenience
pub use core::record::VariantRecord;
pub use core::table::VariantTable;
pub use core::types::*;
pub use error::{HarmonizeError, Result};
pub use lookup::LookupStore;
pub use pipeline::{HarmonizeConfig, HarmonizeReport, Harmonizer};
