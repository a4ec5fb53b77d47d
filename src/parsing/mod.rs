//! Reading and writing summary-statistics files.
//!
//! - [`columns`]: maps provider-specific column names onto canonical ones
//! - [`sumstats`]: tab-separated summary statistics, optionally gzipped
//! - [`allowlist`]: the variant allow-list used by the final filter
//!
//! ## Canonical columns
//!
//! | Column | Meaning | Required |
//! |--------|---------|----------|
//! | SNP  | Variant identifier | No, if the four below exist |
//! | CHR  | Chromosome | Only without SNP |
//! | BP   | Position | Only without SNP |
//! | A2   | Other (non-effect) allele | Only without SNP |
//! | A1   | Effect allele | Only without SNP |
//! | AF1  | Effect allele frequency | No |
//! | BETA | Effect size | No |
//! | SE   | Standard error | No |
//! | P    | P-value | No |
//! | N    | Sample size | No |
//! | Z    | Z-score | No |
//!
//! Any other column is carried through unchanged.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error;

pub mod allowlist;
pub mod columns;
pub mod sumstats;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid delimited file: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid column pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid column pattern file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Schema error: {0}")]
    Schema(String),
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

/// Open a file for reading, decompressing when the name ends in `.gz`
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened.
pub fn open_text(path: &Path) -> Result<Box<dyn Read>, ParseError> {
    let file = BufReader::new(File::open(path)?);
    if is_gzip(path) {
        Ok(Box::new(MultiGzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Create a file for writing, compressing when the name ends in `.gz`
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be created.
pub fn create_text(path: &Path) -> Result<Box<dyn Write>, ParseError> {
    let file = BufWriter::new(File::create(path)?);
    if is_gzip(path) {
        Ok(Box::new(GzEncoder::new(file, Compression::default())))
    } else {
        Ok(Box::new(file))
    }
}
