use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::bed::{decode_payload, encode_payload, BedInterval};
use super::tool::CoordinateMapper;
use crate::core::pattern::classify_canonical;
use crate::core::record::VariantRecord;
use crate::core::table::{VariantTable, IDENTITY_COLUMNS};
use crate::core::types::{IdKind, Value};
use crate::error::{HarmonizeError, Result};
use crate::pipeline::report::LiftStats;

/// Moves records between genome builds through a [`CoordinateMapper`]
pub struct BuildLifter<'a> {
    mapper: &'a dyn CoordinateMapper,
}

impl<'a> BuildLifter<'a> {
    pub fn new(mapper: &'a dyn CoordinateMapper) -> Self {
        Self { mapper }
    }

    /// Lift every record with coordinates to the mapper's target build.
    ///
    /// Each record travels as a single-base interval whose name field holds
    /// all of its columns. Mapped records take chromosome and position from the
    /// lifted interval and positional identifiers are rebuilt from them.
    /// Records without coordinates, unmapped records, and records whose
    /// rebuilt identifier is not canonical are dropped. Mapped intervals beyond
    /// what was submitted are ignored, so each record keeps its first mapped
    /// location.
    ///
    /// # Errors
    ///
    /// Returns `HarmonizeError::Format` if a value cannot be carried in the
    /// interval name or the mapped output cannot be split back into the
    /// table's columns, and any error from the mapper.
    pub fn lift(&self, table: VariantTable) -> Result<(VariantTable, LiftStats)> {
        let mut stats = LiftStats {
            submitted: table.len(),
            ..LiftStats::default()
        };

        let mut intervals = Vec::with_capacity(table.len());
        for record in &table.records {
            let (Some(chrom), Some(position)) = (record.chrom.as_deref(), record.position) else {
                continue;
            };
            intervals.push(BedInterval::at_position(chrom, position, encode_record(record)?));
        }
        if intervals.len() < table.len() {
            debug!(
                "{} records without coordinates skipped for liftover",
                table.len() - intervals.len()
            );
        }

        let output = self.mapper.lift(&intervals)?;
        debug!(
            "Mapper returned {} mapped and {} unmapped intervals",
            output.mapped.len(),
            output.unmapped.len()
        );

        let mut lifted = table.empty_like();
        // Identical input rows share a payload; each may come back once per copy
        let mut remaining: HashMap<&str, usize> = HashMap::with_capacity(intervals.len());
        for interval in &intervals {
            *remaining.entry(interval.payload.as_str()).or_default() += 1;
        }
        let mut repeated = 0usize;
        for interval in &output.mapped {
            match remaining.get_mut(interval.payload.as_str()) {
                Some(0) => {
                    repeated += 1;
                    continue;
                }
                Some(count) => *count -= 1,
                None => {}
            }
            let record = decode_record(interval, &table)?;
            if record.kind() == IdKind::Unrecognized {
                debug!(
                    "Dropping lifted record on {}: identifier is not canonical",
                    interval.chrom
                );
                continue;
            }
            lifted.records.push(record);
        }

        if repeated > 0 {
            warn!("Ignored {repeated} repeated intervals in the mapped output");
        }

        stats.mapped = lifted.len();
        stats.unmapped = stats.submitted.saturating_sub(stats.mapped);
        info!(
            "Lifted {}/{} records ({} dropped)",
            stats.mapped, stats.submitted, stats.unmapped
        );
        Ok((lifted, stats))
    }
}

fn encode_record(record: &VariantRecord) -> Result<String> {
    let mut fields = vec![
        record.id.clone().unwrap_or_default(),
        record.chrom.clone().unwrap_or_default(),
        record.position.map(|p| p.to_string()).unwrap_or_default(),
        record.allele_high.clone().unwrap_or_default(),
        record.allele_low.clone().unwrap_or_default(),
    ];
    fields.extend(record.values.iter().map(Value::render));
    encode_payload(&fields)
}

fn decode_record(interval: &BedInterval, table: &VariantTable) -> Result<VariantRecord> {
    let expected = IDENTITY_COLUMNS.len() + table.columns.len();
    let fields = decode_payload(&interval.payload, expected)?;
    let non_empty = |raw: &str| (!raw.is_empty()).then(|| raw.to_string());

    let mut values = Vec::with_capacity(table.columns.len());
    for (column, raw) in table.columns.iter().zip(&fields[IDENTITY_COLUMNS.len()..]) {
        let value = Value::parse_as(raw, column.dtype).ok_or_else(|| {
            HarmonizeError::Format(format!(
                "lifted value {raw:?} is not a valid {:?} for column {}",
                column.dtype, column.name
            ))
        })?;
        values.push(value);
    }

    let mut record = VariantRecord {
        id: non_empty(fields[0]),
        chrom: Some(interval.bare_chrom()),
        position: Some(interval.position()),
        allele_high: non_empty(fields[3]).map(|a| a.to_uppercase()),
        allele_low: non_empty(fields[4]).map(|a| a.to_uppercase()),
        values,
    };

    let original_kind = record.id.as_deref().map_or(IdKind::Unrecognized, classify_canonical);
    if original_kind == IdKind::Positional {
        record.id = record.positional_from_fields();
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::table::{IdentityColumns, PassthroughColumn};
    use crate::core::types::ColumnType;
    use crate::liftover::tool::LiftOutput;

    /// Shifts every interval by a fixed offset; intervals on chromosome 2 fail
    struct ShiftMapper(u64);

    impl CoordinateMapper for ShiftMapper {
        fn lift(&self, intervals: &[BedInterval]) -> Result<LiftOutput> {
            let (unmapped, mapped): (Vec<_>, Vec<_>) =
                intervals.iter().cloned().partition(|i| i.chrom == "chr2");
            let mapped = mapped
                .into_iter()
                .map(|mut i| {
                    i.start += self.0;
                    i.end += self.0;
                    i
                })
                .collect();
            Ok(LiftOutput { mapped, unmapped })
        }
    }

    /// Returns each payload with one field missing
    struct TruncatingMapper;

    impl CoordinateMapper for TruncatingMapper {
        fn lift(&self, intervals: &[BedInterval]) -> Result<LiftOutput> {
            let mapped = intervals
                .iter()
                .cloned()
                .map(|mut i| {
                    if let Some(cut) = i.payload.rfind(',') {
                        i.payload.truncate(cut);
                    }
                    i
                })
                .collect();
            Ok(LiftOutput {
                mapped,
                unmapped: Vec::new(),
            })
        }
    }

    /// Reports every interval as mapped to two locations
    struct DuplicatingMapper;

    impl CoordinateMapper for DuplicatingMapper {
        fn lift(&self, intervals: &[BedInterval]) -> Result<LiftOutput> {
            let mapped = intervals
                .iter()
                .flat_map(|i| {
                    let mut elsewhere = i.clone();
                    elsewhere.start += 50;
                    elsewhere.end += 50;
                    [i.clone(), elsewhere]
                })
                .collect();
            Ok(LiftOutput {
                mapped,
                unmapped: Vec::new(),
            })
        }
    }

    /// Returns the input plus a record it was never given
    struct InventingMapper;

    impl CoordinateMapper for InventingMapper {
        fn lift(&self, intervals: &[BedInterval]) -> Result<LiftOutput> {
            let mut mapped = intervals.to_vec();
            mapped.push(BedInterval::at_position(
                "1",
                900,
                "1_900_A_G,1,900,A,G,1.0,7,".to_string(),
            ));
            Ok(LiftOutput {
                mapped,
                unmapped: Vec::new(),
            })
        }
    }

    fn table() -> VariantTable {
        VariantTable::new(
            IdentityColumns::all(),
            vec![
                PassthroughColumn::new("BETA", ColumnType::Float),
                PassthroughColumn::new("N", ColumnType::Int),
                PassthroughColumn::new("NOTE", ColumnType::Text),
            ],
        )
        .with_records(vec![
            VariantRecord::new()
                .with_id("1_100_A_G")
                .with_coordinates("1", 100)
                .with_alleles("A", "G")
                .with_values(vec![
                    Value::Float(-0.0031),
                    Value::Int(5000),
                    Value::Text("kept-as-is".to_string()),
                ]),
            VariantRecord::new()
                .with_id("rs42")
                .with_coordinates("1", 200)
                .with_alleles("C", "T")
                .with_values(vec![Value::Null, Value::Int(1), Value::Null]),
            VariantRecord::new()
                .with_id("2_300_A_C")
                .with_coordinates("2", 300)
                .with_alleles("A", "C")
                .with_values(vec![Value::Float(1.0), Value::Int(2), Value::Null]),
        ])
    }

    #[test]
    fn test_lift_rebuilds_positional_identifiers() {
        let mapper = ShiftMapper(1000);
        let (lifted, stats) = BuildLifter::new(&mapper).lift(table()).unwrap();

        assert_eq!(lifted.len(), 2);
        let first = &lifted.records[0];
        assert_eq!(first.id.as_deref(), Some("1_1100_A_G"));
        assert_eq!(first.chrom.as_deref(), Some("1"));
        assert_eq!(first.position, Some(1100));
        assert_eq!(
            first.values,
            vec![
                Value::Float(-0.0031),
                Value::Int(5000),
                Value::Text("kept-as-is".to_string())
            ]
        );

        // rsIDs keep their identifier, only coordinates move
        let second = &lifted.records[1];
        assert_eq!(second.id.as_deref(), Some("rs42"));
        assert_eq!(second.position, Some(1200));
        assert_eq!(second.values, vec![Value::Null, Value::Int(1), Value::Null]);

        assert_eq!(stats.submitted, 3);
        assert_eq!(stats.mapped, 2);
        assert_eq!(stats.unmapped, 1);
    }

    #[test]
    fn test_repeated_mapped_intervals_keep_first_location() {
        let (lifted, stats) = BuildLifter::new(&DuplicatingMapper).lift(table()).unwrap();

        assert_eq!(lifted.len(), 3);
        let positions: Vec<_> = lifted.records.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![Some(100), Some(200), Some(300)]);
        assert_eq!(lifted.records[0].id.as_deref(), Some("1_100_A_G"));

        assert_eq!(stats.submitted, 3);
        assert_eq!(stats.mapped, 3);
        assert_eq!(stats.unmapped, 0);
    }

    #[test]
    fn test_more_mapped_than_submitted_does_not_underflow() {
        let (lifted, stats) = BuildLifter::new(&InventingMapper).lift(table()).unwrap();
        assert_eq!(lifted.len(), 4);
        assert_eq!(stats.submitted, 3);
        assert_eq!(stats.mapped, 4);
        assert_eq!(stats.unmapped, 0);
    }

    #[test]
    fn test_payload_field_mismatch_is_format_error() {
        let result = BuildLifter::new(&TruncatingMapper).lift(table());
        assert!(matches!(result, Err(HarmonizeError::Format(_))));
    }

    #[test]
    fn test_value_with_separator_is_rejected() {
        let table = VariantTable::new(
            IdentityColumns::all(),
            vec![PassthroughColumn::new("NOTE", ColumnType::Text)],
        )
        .with_records(vec![VariantRecord::new()
            .with_id("rs1")
            .with_coordinates("1", 5)
            .with_values(vec![Value::Text("a,b".to_string())])]);
        let result = BuildLifter::new(&ShiftMapper(0)).lift(table);
        assert!(matches!(result, Err(HarmonizeError::Format(_))));
    }

    #[test]
    fn test_value_with_space_is_rejected() {
        let table = VariantTable::new(
            IdentityColumns::all(),
            vec![PassthroughColumn::new("NOTE", ColumnType::Text)],
        )
        .with_records(vec![VariantRecord::new()
            .with_id("rs1")
            .with_coordinates("1", 5)
            .with_values(vec![Value::Text("kept as is".to_string())])]);
        let result = BuildLifter::new(&ShiftMapper(0)).lift(table);
        assert!(matches!(result, Err(HarmonizeError::Format(_))));
    }
}
