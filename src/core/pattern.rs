//! Identifier shape recognition.
//!
//! Two identifier families are accepted:
//!
//! | Shape | Input form | Canonical form |
//! |-------|------------|----------------|
//! | rsID | `rs123`, `RS123`, `rs123:384923:A:G` | `rs123` |
//! | positional | `8:60009:g:t`, `X+100+A+AT` | `8_60009_G_T`, `X_100_A_AT` |
//!
//! Classification is anchored (the whole string must have the shape), while
//! extraction finds the first embedded occurrence. rsID extraction always runs
//! before positional extraction so that compound rsID strings never resolve to
//! their positional-looking tail.

use regex::Regex;
use std::sync::LazyLock;

use crate::core::types::IdKind;
use crate::utils::validation::canonical_chromosome;

const RSID_BODY: &str = r"rs[0-9]+";
const POSITIONAL_BODY: &str = r"[0-9XY]{1,2}[_:+][0-9]+[_:+][AGCT]+[_:+][AGCT]+";

static RSID_FIND: LazyLock<Regex> = LazyLock::new(|| compile(&format!("(?i){RSID_BODY}")));
static POSITIONAL_FIND: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!("(?i){POSITIONAL_BODY}")));
static RSID_FULL: LazyLock<Regex> = LazyLock::new(|| compile(&format!("(?i)^{RSID_BODY}$")));
static POSITIONAL_FULL: LazyLock<Regex> =
    LazyLock::new(|| compile(&format!("(?i)^{POSITIONAL_BODY}$")));
static CANONICAL_RSID: LazyLock<Regex> = LazyLock::new(|| compile(r"^rs[0-9]+$"));
static CANONICAL_POSITIONAL: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^[0-9XY]{1,2}_[0-9]+_[ACGT]+_[ACGT]+$"));

#[allow(clippy::expect_used)] // Patterns are compile-time constants
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("identifier pattern must compile")
}

/// Classify a whole string as an rsID, a positional identifier, or neither.
///
/// Matching is case-insensitive and accepts `_`, `:` or `+` as positional
/// separators.
#[must_use]
pub fn classify(s: &str) -> IdKind {
    if RSID_FULL.is_match(s) {
        IdKind::Rsid
    } else if POSITIONAL_FULL.is_match(s) {
        IdKind::Positional
    } else {
        IdKind::Unrecognized
    }
}

/// Classify a string that must already be in canonical form.
#[must_use]
pub fn classify_canonical(s: &str) -> IdKind {
    if CANONICAL_RSID.is_match(s) {
        IdKind::Rsid
    } else if CANONICAL_POSITIONAL.is_match(s) {
        IdKind::Positional
    } else {
        IdKind::Unrecognized
    }
}

/// Extract the first embedded rsID, lower-cased
#[must_use]
pub fn extract_rsid(s: &str) -> Option<String> {
    RSID_FIND.find(s).map(|m| m.as_str().to_lowercase())
}

/// Extract the first embedded positional identifier in canonical form
#[must_use]
pub fn extract_positional(s: &str) -> Option<String> {
    let found = POSITIONAL_FIND.find(s)?;
    let normalized: String = found
        .as_str()
        .chars()
        .map(|c| match c {
            ':' | '+' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect();
    PositionalId::parse(&normalized).map(|id| id.to_string())
}

/// Canonicalize an arbitrary identifier.
///
/// rsID extraction takes precedence over positional extraction.
#[must_use]
pub fn canonicalize(s: &str) -> Option<(IdKind, String)> {
    if let Some(rsid) = extract_rsid(s) {
        return Some((IdKind::Rsid, rsid));
    }
    extract_positional(s).map(|id| (IdKind::Positional, id))
}

/// The four components of a positional identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionalId {
    pub chrom: String,
    pub position: u64,
    pub allele_high: String,
    pub allele_low: String,
}

impl PositionalId {
    pub fn new(
        chrom: impl Into<String>,
        position: u64,
        allele_high: impl Into<String>,
        allele_low: impl Into<String>,
    ) -> Self {
        Self {
            chrom: chrom.into(),
            position,
            allele_high: allele_high.into(),
            allele_low: allele_low.into(),
        }
    }

    /// Parse an `_`-separated identifier with exactly four fields.
    ///
    /// The chromosome is canonicalized (`chr` stripped, `23`/`24` mapped to
    /// `X`/`Y`) and alleles are upper-cased.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let mut fields = s.split('_');
        let chrom = fields.next()?;
        let position = fields.next()?.parse().ok()?;
        let allele_high = fields.next()?;
        let allele_low = fields.next()?;
        if fields.next().is_some() || allele_high.is_empty() || allele_low.is_empty() {
            return None;
        }
        Some(Self::new(
            canonical_chromosome(chrom),
            position,
            allele_high.to_uppercase(),
            allele_low.to_uppercase(),
        ))
    }

    /// Lookup-table key: the identifier with a `chr` prefix
    #[must_use]
    pub fn lookup_key(&self) -> String {
        format!("chr{self}")
    }
}

impl std::fmt::Display for PositionalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.chrom, self.position, self.allele_high, self.allele_low
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("rs123"), IdKind::Rsid);
        assert_eq!(classify("RS123"), IdKind::Rsid);
        assert_eq!(classify("8_60009_G_T"), IdKind::Positional);
        assert_eq!(classify("x:100:a:g"), IdKind::Positional);
        assert_eq!(classify("1+100+AC+G"), IdKind::Positional);
        assert_eq!(classify("rs123:384923:A:G"), IdKind::Unrecognized);
        assert_eq!(classify("chr1:100:A:G"), IdKind::Unrecognized);
        assert_eq!(classify("1_100_A_<DEL>"), IdKind::Unrecognized);
        assert_eq!(classify("rs"), IdKind::Unrecognized);
        assert_eq!(classify(""), IdKind::Unrecognized);
    }

    #[test]
    fn test_classify_canonical_is_strict() {
        assert_eq!(classify_canonical("rs1"), IdKind::Rsid);
        assert_eq!(classify_canonical("RS1"), IdKind::Unrecognized);
        assert_eq!(classify_canonical("1_100_A_G"), IdKind::Positional);
        assert_eq!(classify_canonical("1:100:A:G"), IdKind::Unrecognized);
        assert_eq!(classify_canonical("1_100_a_G"), IdKind::Unrecognized);
    }

    #[test]
    fn test_compound_rsid_prefers_rsid() {
        assert_eq!(
            canonicalize("rs1283920:384923:A:G"),
            Some((IdKind::Rsid, "rs1283920".to_string()))
        );
        assert_eq!(
            canonicalize("RS77:1:100:a:g"),
            Some((IdKind::Rsid, "rs77".to_string()))
        );
    }

    #[test]
    fn test_extract_positional() {
        assert_eq!(
            extract_positional("chr8:60009:g:t").as_deref(),
            Some("8_60009_G_T")
        );
        assert_eq!(
            extract_positional("23+100+A+C").as_deref(),
            Some("X_100_A_C")
        );
        assert_eq!(extract_positional("variant_one"), None);
    }

    #[test]
    fn test_positional_parse_and_key() {
        let id = PositionalId::parse("8_60009_G_T").unwrap();
        assert_eq!(id.chrom, "8");
        assert_eq!(id.position, 60009);
        assert_eq!(id.allele_high, "G");
        assert_eq!(id.allele_low, "T");
        assert_eq!(id.lookup_key(), "chr8_60009_G_T");
        assert_eq!(id.to_string(), "8_60009_G_T");

        assert!(PositionalId::parse("8_60009_G").is_none());
        assert!(PositionalId::parse("8_60009_G_T_A").is_none());
        assert!(PositionalId::parse("8_pos_G_T").is_none());
    }
}
