//! Identity normalization.
//!
//! Every record leaves this stage with an identifier in canonical rsID or
//! positional form, or it is dropped and counted.

use tracing::{debug, info};

use crate::core::pattern::{canonicalize, classify_canonical, PositionalId};
use crate::core::record::VariantRecord;
use crate::core::table::{IdentityColumns, VariantTable};
use crate::core::types::IdKind;
use crate::error::{HarmonizeError, Result};
use crate::pipeline::report::NormalizationStats;
use crate::utils::validation::canonical_chromosome;

/// Normalize the identity columns of a table.
///
/// # Errors
///
/// Returns `HarmonizeError::Schema` when the table has neither an identifier
/// column nor all four of chromosome, position and the two alleles.
pub fn normalize(table: VariantTable) -> Result<(VariantTable, NormalizationStats)> {
    let present = table.identity;
    if !present.id && !present.has_coordinates_and_alleles() {
        return Err(HarmonizeError::Schema(
            "need an identifier column or all of CHR, BP, A2 and A1".to_string(),
        ));
    }

    let mut stats = NormalizationStats {
        input: table.len(),
        ..NormalizationStats::default()
    };

    let mut output = table.empty_like();
    output.identity = IdentityColumns::all();

    for mut record in table.records {
        canonicalize_fields(&mut record);

        if !present.id {
            record.id = record.positional_from_fields();
        }

        // rsID extraction precedes positional extraction
        if let Some((_, canonical)) = record.id.as_deref().and_then(canonicalize) {
            record.id = Some(canonical);
        }

        if !present.has_coordinates_and_alleles() {
            derive_missing_fields(&mut record, present);
        }

        if !is_identifiable(&record) {
            if let Some(regenerated) = record.positional_from_fields() {
                if classify_canonical(&regenerated) == IdKind::Positional {
                    debug!(
                        "Regenerated identifier {regenerated} from {:?}",
                        record.id.as_deref().unwrap_or("")
                    );
                    record.id = Some(regenerated);
                    stats.repaired += 1;
                }
            }
        }

        if is_identifiable(&record) {
            stats.accepted += 1;
            output.records.push(record);
        } else {
            stats.dropped += 1;
        }
    }

    info!(
        "{}/{} lines will be preserved while {}/{} will be dropped; identifiers must be rsIDs or positional",
        stats.accepted, stats.input, stats.dropped, stats.input
    );

    Ok((output, stats))
}

/// Canonical rsID, or canonical positional identifier whose fields parse
fn is_identifiable(record: &VariantRecord) -> bool {
    match record.kind() {
        IdKind::Rsid => true,
        // Shape alone admits positions too large to parse
        IdKind::Positional => record.positional_id().is_some(),
        IdKind::Unrecognized => false,
    }
}

/// Upper-case alleles, strip `chr` and map `23`/`24` on the chromosome
fn canonicalize_fields(record: &mut VariantRecord) {
    if let Some(chrom) = record.chrom.as_deref() {
        record.chrom = Some(canonical_chromosome(chrom));
    }
    for allele in [&mut record.allele_high, &mut record.allele_low] {
        if let Some(value) = allele.as_deref() {
            *allele = Some(value.trim().to_uppercase());
        }
    }
}

/// Fill absent identity columns from a positional identifier.
/// Non-positional records keep nulls for those columns.
fn derive_missing_fields(record: &mut VariantRecord, present: IdentityColumns) {
    let Some(parsed) = record
        .id
        .as_deref()
        .filter(|id| classify_canonical(id) == IdKind::Positional)
        .and_then(PositionalId::parse)
    else {
        return;
    };

    if !present.chrom {
        record.chrom = Some(parsed.chrom);
    }
    if !present.position {
        record.position = Some(parsed.position);
    }
    if !present.allele_high {
        record.allele_high = Some(parsed.allele_high);
    }
    if !present.allele_low {
        record.allele_low = Some(parsed.allele_low);
    }
}
