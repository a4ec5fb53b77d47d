use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{HarmonizeError, Result};
use crate::utils::validation::canonical_chromosome;

/// Separator between the serialized columns inside the interval name field
pub const PAYLOAD_SEPARATOR: char = ',';

/// liftOver splits BED lines on any whitespace, so the name field cannot hold it
fn is_reserved(c: char) -> bool {
    c == PAYLOAD_SEPARATOR || c.is_whitespace()
}

/// A BED interval carrying a record's columns in its name field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BedInterval {
    /// Chromosome with a `chr` prefix
    pub chrom: String,
    /// 0-based start
    pub start: u64,
    /// 1-based inclusive end, i.e. the variant position
    pub end: u64,
    pub payload: String,
}

impl BedInterval {
    /// Single-base interval `[position - 1, position)` on `chr{chrom}`
    pub fn at_position(chrom: &str, position: u64, payload: impl Into<String>) -> Self {
        Self {
            chrom: format!("chr{}", canonical_chromosome(chrom)),
            start: position.saturating_sub(1),
            end: position,
            payload: payload.into(),
        }
    }

    /// Chromosome without the `chr` prefix
    #[must_use]
    pub fn bare_chrom(&self) -> String {
        canonical_chromosome(&self.chrom)
    }

    /// Variant position, taken from the interval end
    #[must_use]
    pub fn position(&self) -> u64 {
        self.end
    }

    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}",
            self.chrom, self.start, self.end, self.payload
        )
    }

    /// Parse a BED line with at least four fields; extra fields are ignored
    ///
    /// # Errors
    ///
    /// Returns `HarmonizeError::Format` for short lines or non-numeric bounds.
    pub fn parse_line(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 4 {
            return Err(HarmonizeError::Format(format!(
                "expected at least 4 tab-separated fields, found {}: {line:?}",
                fields.len()
            )));
        }
        let coordinate = |raw: &str| {
            raw.trim().parse::<u64>().map_err(|_| {
                HarmonizeError::Format(format!("invalid interval coordinate {raw:?}"))
            })
        };
        Ok(Self {
            chrom: fields[0].to_string(),
            start: coordinate(fields[1])?,
            end: coordinate(fields[2])?,
            payload: fields[3].to_string(),
        })
    }
}

/// Join column values into a payload.
///
/// # Errors
///
/// Returns `HarmonizeError::Format` if a value contains the payload separator
/// or whitespace, which would split the interval's name field.
pub fn encode_payload<S: AsRef<str>>(fields: &[S]) -> Result<String> {
    let mut payload = String::new();
    for (i, field) in fields.iter().enumerate() {
        let field = field.as_ref();
        if field.contains(is_reserved) {
            return Err(HarmonizeError::Format(format!(
                "value {field:?} cannot be carried through liftover: \
                 values must not contain '{PAYLOAD_SEPARATOR}' or whitespace"
            )));
        }
        if i > 0 {
            payload.push(PAYLOAD_SEPARATOR);
        }
        payload.push_str(field);
    }
    Ok(payload)
}

/// Split a payload back into exactly `expected` values
///
/// # Errors
///
/// Returns `HarmonizeError::Format` on a field count mismatch.
pub fn decode_payload(payload: &str, expected: usize) -> Result<Vec<&str>> {
    let fields: Vec<&str> = payload.split(PAYLOAD_SEPARATOR).collect();
    if fields.len() != expected {
        return Err(HarmonizeError::Format(format!(
            "lifted payload has {} fields, expected {expected}: {payload:?}",
            fields.len()
        )));
    }
    Ok(fields)
}

/// Write intervals one per line
///
/// # Errors
///
/// Returns an I/O error if the file cannot be written.
pub fn write_intervals(path: &Path, intervals: &[BedInterval]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for interval in intervals {
        writeln!(writer, "{}", interval.to_line())?;
    }
    writer.flush()?;
    Ok(())
}

/// Read intervals, skipping blank and `#` comment lines.
/// A missing file reads as empty.
///
/// # Errors
///
/// Returns an I/O error, or `HarmonizeError::Format` for a malformed line.
pub fn read_intervals(path: &Path) -> Result<Vec<BedInterval>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let reader = BufReader::new(File::open(path)?);
    let mut intervals = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        intervals.push(BedInterval::parse_line(&line)?);
    }
    Ok(intervals)
}
