//! Core data types for variant identity harmonization.
//!
//! - [`VariantRecord`](record::VariantRecord): one summary-statistics row with its identity fields
//! - [`VariantTable`](table::VariantTable): records plus the schema they share
//! - [`pattern`]: rsID / positional identifier recognition
//! - [`types`]: genome builds, identifier kinds, passthrough value types
//!
//! ## Identity columns
//!
//! | Column | Meaning |
//! |--------|---------|
//! | SNP | Identifier: `rs123` or `8_60009_G_T` |
//! | CHR | Chromosome, no `chr` prefix, `1`-`22`, `X`, `Y` |
//! | BP  | 1-based position |
//! | A2  | Non-effect / other allele |
//! | A1  | Effect / tested allele |

pub mod pattern;
pub mod record;
pub mod table;
pub mod types;
