//! Effect-size cleanup applied to a harmonized table before QC.
//!
//! Runs only when the table has both BETA and SE columns:
//!
//! 1. drop records whose BETA or SE is missing, non-numeric, 99 or -99
//! 2. add `Z = BETA / SE` when there is no Z column
//! 3. with `minor_AF` and `minor_allele` columns, drop records whose minor
//!    allele frequency is missing, 99, -99 or below 0.01, and set AF1 to the
//!    frequency of A1
//! 4. add a constant AF1 of 0.5 when there is still no AF1 column
//! 5. null infinite Z values

use tracing::info;

use crate::core::record::VariantRecord;
use crate::core::table::{PassthroughColumn, VariantTable};
use crate::core::types::{ColumnType, Value};
use crate::pipeline::report::{Af1Source, EffectStats};

pub const BETA_COLUMN: &str = "BETA";
pub const SE_COLUMN: &str = "SE";
pub const Z_COLUMN: &str = "Z";
pub const AF1_COLUMN: &str = "AF1";
pub const MINOR_AF_COLUMN: &str = "minor_AF";
pub const MINOR_ALLELE_COLUMN: &str = "minor_allele";

/// Records with a smaller minor allele frequency are dropped
pub const MIN_MINOR_AF: f64 = 0.01;

/// AF1 written when no frequency is available
pub const DEFAULT_AF1: f64 = 0.5;

/// Values some providers write instead of leaving a cell empty
const MISSING_SENTINELS: [f64; 2] = [99.0, -99.0];

/// Clean up BETA, SE, Z and AF1.
///
/// Returns the table unchanged and no stats when BETA or SE is absent.
#[must_use]
pub fn reformat(mut table: VariantTable) -> (VariantTable, Option<EffectStats>) {
    let (Some(beta), Some(se)) = (
        table.passthrough_index(BETA_COLUMN),
        table.passthrough_index(SE_COLUMN),
    ) else {
        info!("No BETA and SE columns; effect statistics left as read");
        return (table, None);
    };

    let mut stats = EffectStats {
        input: table.len(),
        ..EffectStats::default()
    };
    let minor = table
        .passthrough_index(MINOR_AF_COLUMN)
        .zip(table.passthrough_index(MINOR_ALLELE_COLUMN));

    table.columns[beta].dtype = ColumnType::Float;
    table.columns[se].dtype = ColumnType::Float;
    if let Some((minor_af, _)) = minor {
        table.columns[minor_af].dtype = ColumnType::Float;
    }
    let z = match table.passthrough_index(Z_COLUMN) {
        Some(index) => index,
        None => {
            stats.z_derived = true;
            push_column(&mut table, Z_COLUMN)
        }
    };
    let af1 = match table.passthrough_index(AF1_COLUMN) {
        Some(index) => {
            if minor.is_some() {
                table.columns[index].dtype = ColumnType::Float;
                stats.af1_source = Af1Source::MinorAllele;
            }
            index
        }
        None => {
            stats.af1_source = if minor.is_some() {
                Af1Source::MinorAllele
            } else {
                Af1Source::Constant
            };
            push_column(&mut table, AF1_COLUMN)
        }
    };

    let width = table.columns.len();
    let mut kept = Vec::with_capacity(table.len());
    for mut record in std::mem::take(&mut table.records) {
        let (Some(b), Some(s)) = (numeric_at(&record, beta), numeric_at(&record, se)) else {
            stats.invalid_effect += 1;
            continue;
        };
        let minor_af = match minor {
            Some((index, _)) => {
                match numeric_at(&record, index).filter(|af| *af >= MIN_MINOR_AF) {
                    Some(af) => Some(af),
                    None => {
                        stats.low_minor_af += 1;
                        continue;
                    }
                }
            }
            None => None,
        };

        record.values.resize(width, Value::Null);
        record.values[beta] = Value::Float(b);
        record.values[se] = Value::Float(s);
        if stats.z_derived {
            record.values[z] = Value::Float(b / s);
        }
        if let Value::Float(v) = record.values[z] {
            if v.is_infinite() {
                record.values[z] = Value::Null;
                stats.infinite_z += 1;
            }
        }

        match (minor, minor_af) {
            (Some((index, allele)), Some(af)) => {
                let minor_allele = record.values[allele].render();
                let minor_is_a1 = record
                    .allele_low
                    .as_deref()
                    .is_some_and(|a1| minor_allele.trim().eq_ignore_ascii_case(a1));
                record.values[index] = Value::Float(af);
                record.values[af1] = Value::Float(if minor_is_a1 { af } else { 1.0 - af });
            }
            _ if stats.af1_source == Af1Source::Constant => {
                record.values[af1] = Value::Float(DEFAULT_AF1);
            }
            _ => {}
        }
        kept.push(record);
    }
    table.records = kept;

    stats.retained = table.len();
    info!(
        "Effect statistics kept {}/{} records ({} invalid BETA/SE, {} low minor_AF, {} infinite Z)",
        stats.retained, stats.input, stats.invalid_effect, stats.low_minor_af, stats.infinite_z
    );
    (table, Some(stats))
}

fn push_column(table: &mut VariantTable, name: &str) -> usize {
    table
        .columns
        .push(PassthroughColumn::new(name, ColumnType::Float));
    table.columns.len() - 1
}

/// Usable number in a cell; text cells are parsed, sentinels and NaN are not usable
fn numeric_at(record: &VariantRecord, index: usize) -> Option<f64> {
    let value = match record.values.get(index)? {
        Value::Text(raw) => raw.trim().parse().ok(),
        other => other.as_f64(),
    }?;
    (!value.is_nan() && !MISSING_SENTINELS.contains(&value)).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::table::IdentityColumns;

    fn table(columns: &[(&str, ColumnType)], rows: Vec<(&str, &str, Vec<Value>)>) -> VariantTable {
        let columns = columns
            .iter()
            .map(|(name, dtype)| PassthroughColumn::new(*name, *dtype))
            .collect();
        VariantTable::new(IdentityColumns::all(), columns).with_records(
            rows.into_iter()
                .map(|(id, a1, values)| {
                    VariantRecord::new()
                        .with_id(id)
                        .with_coordinates("1", 100)
                        .with_alleles("C", a1)
                        .with_values(values)
                })
                .collect(),
        )
    }

    fn ids(table: &VariantTable) -> Vec<&str> {
        table.records.iter().filter_map(|r| r.id.as_deref()).collect()
    }

    #[test]
    fn test_drops_sentinel_and_missing_effects_and_derives_z() {
        let input = table(
            &[("BETA", ColumnType::Float), ("SE", ColumnType::Int)],
            vec![
                ("rs1", "T", vec![Value::Float(0.5), Value::Int(2)]),
                ("rs2", "T", vec![Value::Int(99), Value::Int(1)]),
                ("rs3", "T", vec![Value::Float(0.1), Value::Int(-99)]),
                ("rs4", "T", vec![Value::Null, Value::Int(1)]),
                ("rs5", "T", vec![Value::Float(1.0), Value::Int(0)]),
            ],
        );
        let (out, stats) = reformat(input);
        let stats = stats.unwrap();

        assert_eq!(ids(&out), vec!["rs1", "rs5"]);
        assert_eq!(
            out.column_names(),
            vec!["SNP", "CHR", "BP", "A2", "A1", "BETA", "SE", "Z", "AF1"]
        );
        assert_eq!(out.columns[1].dtype, ColumnType::Float);
        assert_eq!(
            out.records[0].values,
            vec![
                Value::Float(0.5),
                Value::Float(2.0),
                Value::Float(0.25),
                Value::Float(0.5)
            ]
        );
        // 1 / 0 is infinite and is nulled
        assert_eq!(out.records[1].values[2], Value::Null);

        assert_eq!(stats.input, 5);
        assert_eq!(stats.invalid_effect, 3);
        assert_eq!(stats.infinite_z, 1);
        assert!(stats.z_derived);
        assert_eq!(stats.af1_source, Af1Source::Constant);
        assert_eq!(stats.retained, 2);
    }

    #[test]
    fn test_existing_z_and_af1_are_kept() {
        let input = table(
            &[
                ("BETA", ColumnType::Float),
                ("SE", ColumnType::Float),
                ("Z", ColumnType::Float),
                ("AF1", ColumnType::Float),
            ],
            vec![
                (
                    "rs1",
                    "T",
                    vec![
                        Value::Float(0.5),
                        Value::Float(0.25),
                        Value::Float(1.5),
                        Value::Float(0.3),
                    ],
                ),
                (
                    "rs2",
                    "T",
                    vec![
                        Value::Float(0.5),
                        Value::Float(0.25),
                        Value::Float(f64::NEG_INFINITY),
                        Value::Float(0.3),
                    ],
                ),
            ],
        );
        let (out, stats) = reformat(input);
        let stats = stats.unwrap();

        assert_eq!(out.columns.len(), 4);
        assert_eq!(out.records[0].values[2], Value::Float(1.5));
        assert_eq!(out.records[0].values[3], Value::Float(0.3));
        assert_eq!(out.records[1].values[2], Value::Null);
        assert!(!stats.z_derived);
        assert_eq!(stats.af1_source, Af1Source::Column);
    }

    #[test]
    fn test_af1_from_minor_allele() {
        let input = table(
            &[
                ("BETA", ColumnType::Float),
                ("SE", ColumnType::Float),
                ("minor_AF", ColumnType::Float),
                ("minor_allele", ColumnType::Text),
            ],
            vec![
                (
                    "rs1",
                    "T",
                    vec![
                        Value::Float(0.1),
                        Value::Float(0.1),
                        Value::Float(0.2),
                        Value::Text("t".to_string()),
                    ],
                ),
                (
                    "rs2",
                    "T",
                    vec![
                        Value::Float(0.1),
                        Value::Float(0.1),
                        Value::Float(0.25),
                        Value::Text("C".to_string()),
                    ],
                ),
                (
                    "rs3",
                    "T",
                    vec![
                        Value::Float(0.1),
                        Value::Float(0.1),
                        Value::Float(0.005),
                        Value::Text("T".to_string()),
                    ],
                ),
                (
                    "rs4",
                    "T",
                    vec![
                        Value::Float(0.1),
                        Value::Float(0.1),
                        Value::Float(99.0),
                        Value::Text("T".to_string()),
                    ],
                ),
            ],
        );
        let (out, stats) = reformat(input);
        let stats = stats.unwrap();

        assert_eq!(ids(&out), vec!["rs1", "rs2"]);
        let af1 = out.passthrough_index("AF1").unwrap();
        // minor allele is A1
        assert_eq!(out.records[0].values[af1], Value::Float(0.2));
        // minor allele is A2
        assert_eq!(out.records[1].values[af1], Value::Float(0.75));
        assert_eq!(stats.low_minor_af, 2);
        assert_eq!(stats.af1_source, Af1Source::MinorAllele);
    }

    #[test]
    fn test_text_effects_are_parsed() {
        let input = table(
            &[("BETA", ColumnType::Text), ("SE", ColumnType::Float)],
            vec![
                ("rs1", "T", vec![Value::Text(" 0.4".to_string()), Value::Float(0.2)]),
                ("rs2", "T", vec![Value::Text("n/a".to_string()), Value::Float(0.2)]),
            ],
        );
        let (out, stats) = reformat(input);
        assert_eq!(ids(&out), vec!["rs1"]);
        assert_eq!(out.records[0].values[0], Value::Float(0.4));
        assert_eq!(out.records[0].values[2], Value::Float(2.0));
        assert_eq!(stats.unwrap().invalid_effect, 1);
    }

    #[test]
    fn test_without_standard_error_nothing_changes() {
        let input = table(
            &[("BETA", ColumnType::Float)],
            vec![("rs1", "T", vec![Value::Int(99)])],
        );
        let (out, stats) = reformat(input.clone());
        assert!(stats.is_none());
        assert_eq!(out, input);
    }
}
