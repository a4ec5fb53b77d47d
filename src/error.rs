use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::lookup::LookupError;

/// Structural and configuration failures that abort a run (or a sub-table).
///
/// Per-record outcomes such as an unresolvable identity or an ambiguous lookup
/// are not errors: they are counted on the run report.
#[derive(Error, Debug)]
pub enum HarmonizeError {
    /// Required identity columns absent or ambiguous
    #[error("Schema error: {0}")]
    Schema(String),

    /// External tool or mapping resource missing
    #[error("Missing {kind}: {} does not exist", path.display())]
    Resource { kind: &'static str, path: PathBuf },

    /// Run settings that cannot work together
    #[error("Configuration error: {0}")]
    Config(String),

    /// External tool output could not be parsed back into the table
    #[error("Format error: {0}")]
    Format(String),

    /// External tool did not finish in time
    #[error("{tool} did not finish within {timeout:?}")]
    Timeout { tool: String, timeout: Duration },

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HarmonizeError>;
