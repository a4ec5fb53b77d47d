use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::Path;

use tracing::{debug, info};

use super::columns::{resolve_column, ColumnPatterns};
use super::{create_text, open_text, ParseError};
use crate::core::record::VariantRecord;
use crate::core::table::{IdentityColumns, PassthroughColumn, VariantTable};
use crate::core::types::{ColumnType, Value, NULL_TOKENS};

/// Neale-lab QC flag column, dropped on ingest
pub const LOW_CONFIDENCE_COLUMN: &str = "low_confidence_variant";

/// Read a tab-separated summary-statistics file (gzipped when it ends in `.gz`)
///
/// # Errors
///
/// Returns `ParseError` if the file cannot be read or lacks usable identity
/// columns.
pub fn read_sumstats(path: &Path, patterns: &ColumnPatterns) -> Result<VariantTable, ParseError> {
    let table = read_sumstats_from(open_text(path)?, patterns)?;
    info!("Read {} records from {}", table.len(), path.display());
    Ok(table)
}

/// Read tab-separated summary statistics from any reader.
///
/// Identity columns are located with `patterns`; the identifier is optional
/// but without it chromosome, position and both alleles are required. Other
/// recognized statistic columns are renamed to their canonical names and every
/// remaining column is carried through with an inferred type.
///
/// # Errors
///
/// Returns `ParseError::Schema` for missing or ambiguous required columns and
/// `ParseError::Csv` for malformed rows.
pub fn read_sumstats_from<R: Read>(
    reader: R,
    patterns: &ColumnPatterns,
) -> Result<VariantTable, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let layout = ColumnLayout::resolve(&headers, patterns)?;

    let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>()?;

    let columns: Vec<PassthroughColumn> = layout
        .passthrough
        .iter()
        .map(|(index, name)| {
            let dtype = ColumnType::infer(rows.iter().filter_map(|row| row.get(*index)));
            debug!("Column {name} read as {dtype:?}");
            PassthroughColumn::new(name.clone(), dtype)
        })
        .collect();

    let records = rows
        .iter()
        .map(|row| layout.record(row, &columns))
        .collect();

    Ok(VariantTable::new(layout.identity, columns).with_records(records))
}

/// Where each canonical column sits in the input
#[derive(Debug, Default)]
struct ColumnLayout {
    identity: IdentityColumns,
    id: Option<usize>,
    chrom: Option<usize>,
    position: Option<usize>,
    allele_high: Option<usize>,
    allele_low: Option<usize>,
    /// `(input index, output name)` of every other kept column
    passthrough: Vec<(usize, String)>,
}

impl ColumnLayout {
    fn resolve(headers: &[String], patterns: &ColumnPatterns) -> Result<Self, ParseError> {
        let index_of = |name: Option<&str>| {
            name.and_then(|n| headers.iter().position(|h| h == n))
        };

        let id = index_of(resolve_column(&patterns.snp, headers, false)?);
        let required = id.is_none();
        let chrom = index_of(resolve_column(&patterns.chrom, headers, required)?);
        let position = index_of(resolve_column(&patterns.position, headers, required)?);
        let allele_high = index_of(resolve_column(&patterns.allele_high, headers, required)?);
        let allele_low = index_of(resolve_column(&patterns.allele_low, headers, required)?);

        let identity_indices: HashSet<usize> = [id, chrom, position, allele_high, allele_low]
            .into_iter()
            .flatten()
            .collect();

        let mut renames: Vec<(usize, &'static str)> = Vec::new();
        for (canonical, pattern) in patterns.statistics() {
            let Some(index) = index_of(resolve_column(pattern, headers, false)?) else {
                continue;
            };
            if identity_indices.contains(&index) || renames.iter().any(|(i, _)| *i == index) {
                continue;
            }
            renames.push((index, canonical));
        }

        let mut passthrough = Vec::new();
        let mut names: HashSet<String> = HashSet::new();
        for (index, header) in headers.iter().enumerate() {
            if identity_indices.contains(&index) || header == LOW_CONFIDENCE_COLUMN {
                continue;
            }
            let name = renames
                .iter()
                .find(|(i, _)| *i == index)
                .map_or_else(|| header.clone(), |(_, canonical)| (*canonical).to_string());
            if !names.insert(name.clone()) {
                return Err(ParseError::Schema(format!(
                    "column {header:?} collides with canonical column {name}"
                )));
            }
            passthrough.push((index, name));
        }

        Ok(Self {
            identity: IdentityColumns {
                id: id.is_some(),
                chrom: chrom.is_some(),
                position: position.is_some(),
                allele_high: allele_high.is_some(),
                allele_low: allele_low.is_some(),
            },
            id,
            chrom,
            position,
            allele_high,
            allele_low,
            passthrough,
        })
    }

    fn record(&self, row: &csv::StringRecord, columns: &[PassthroughColumn]) -> VariantRecord {
        let text = |index: Option<usize>| {
            index
                .and_then(|i| row.get(i))
                .map(str::trim)
                .filter(|raw| !NULL_TOKENS.contains(raw))
                .map(str::to_string)
        };

        let values = self
            .passthrough
            .iter()
            .zip(columns)
            .map(|((index, _), column)| {
                row.get(*index)
                    .and_then(|raw| Value::parse_as(raw, column.dtype))
                    .unwrap_or(Value::Null)
            })
            .collect();

        VariantRecord {
            id: text(self.id),
            chrom: text(self.chrom),
            position: text(self.position).and_then(|raw| parse_position(&raw)),
            allele_high: text(self.allele_high),
            allele_low: text(self.allele_low),
            values,
        }
    }
}

/// Positions are integers, but some providers write them as `12345.0`
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)] // Checked integral and in range
fn parse_position(raw: &str) -> Option<u64> {
    raw.parse::<u64>().ok().or_else(|| {
        let value = raw.parse::<f64>().ok()?;
        (value.fract() == 0.0 && value >= 0.0 && value < u64::MAX as f64).then(|| value as u64)
    })
}

/// Write a table as tab-separated text (gzipped when the path ends in `.gz`)
///
/// # Errors
///
/// Returns `ParseError` if the file cannot be written.
pub fn write_sumstats(path: &Path, table: &VariantTable) -> Result<(), ParseError> {
    let mut writer = create_text(path)?;
    write_sumstats_to(&mut writer, table)?;
    writer.flush()?;
    info!("Wrote {} records to {}", table.len(), path.display());
    Ok(())
}

/// Write a table as tab-separated text: identity columns, then passthrough
/// columns in input order. Nulls are written as `NA`.
///
/// # Errors
///
/// Returns `ParseError` if a row cannot be written.
pub fn write_sumstats_to<W: Write>(writer: W, table: &VariantTable) -> Result<(), ParseError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(writer);

    writer.write_record(table.column_names())?;

    let na = || "NA".to_string();
    for record in &table.records {
        let mut row = vec![
            record.id.clone().unwrap_or_else(na),
            record.chrom.clone().unwrap_or_else(na),
            record.position.map_or_else(na, |p| p.to_string()),
            record.allele_high.clone().unwrap_or_else(na),
            record.allele_low.clone().unwrap_or_else(na),
        ];
        row.extend(record.values.iter().map(|v| {
            if v.is_null() {
                na()
            } else {
                v.render()
            }
        }));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}
