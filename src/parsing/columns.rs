use std::path::Path;

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::ParseError;

/// Prefix carried by harmonized-statistics columns (e.g. `hm_rsid`)
pub const HARMONIZED_PREFIX: &str = "hm_";

/// Case-insensitive regular expressions recognizing each canonical column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnPatterns {
    #[serde(rename = "SNP")]
    pub snp: String,
    #[serde(rename = "CHR")]
    pub chrom: String,
    #[serde(rename = "BP")]
    pub position: String,
    #[serde(rename = "A2")]
    pub allele_high: String,
    #[serde(rename = "A1")]
    pub allele_low: String,
    #[serde(rename = "AF1")]
    pub allele_frequency: String,
    #[serde(rename = "BETA")]
    pub beta: String,
    #[serde(rename = "SE")]
    pub standard_error: String,
    #[serde(rename = "P")]
    pub p_value: String,
    #[serde(rename = "N")]
    pub sample_size: String,
    #[serde(rename = "Z")]
    pub z_score: String,
}

impl Default for ColumnPatterns {
    fn default() -> Self {
        Self {
            snp: r"^snp(s)?$|^rs[\-]?id(s)?$|^variant(s)?$|^id(s)?$|^marker[_\+\-]?name(s)?$|^name(s)?$|^hm_rsid$".to_string(),
            chrom: r"^chr([_\-\+\(]?(b|hg)[0-9]+\)?)?$|^#?chrom(osome(s)?)?([_\-\+\(]?(b|hg)[0-9]+\)?)?$|^hm_chrom$".to_string(),
            position: r"^bp([_\-\+\(]?(b|hg)[0-9]+\)?)?$|^pos(ition)?([_\-\+\(]?(b|hg)[0-9]+\)?)?$|^base[_\-\+]?pair([_\-\+]?loc(ation)?)?$|^hm_pos$".to_string(),
            allele_high: r"^a2$|^ref([_\-]?allele)?$|^no(n|t)[_\+\-]?eff(ect)?[_\+\-]?allele$|^other[_\+\-]?allele$|^allele2$|^hm_other_allele$".to_string(),
            allele_low: r"^a1$|^alt([_\-]?allele)?$|^eff(ect)?[_\+\-]?allele$|^tested[_\+\-]?allele$|^allele1$|^hm_effect_allele$".to_string(),
            allele_frequency: r"(^(.*a1|.*alt|.*eff(ect)?|test(ed)?)[_\+\-]?(allele)?[_\+\-]?(fr(e)?q(s|uency)?)$)|(^(fr(e)?q(s|uency)?)[_\+\-]?(a1|alt|eff(ect)?|test(ed)?)[_\+\-]?(allele)?$)|^af1?$|^fr(e)?q1$|^af_alt$".to_string(),
            beta: r"^beta(s)?$|^eff(ect)?(s)?[_\-\+]?(size(s)?)?$|^log_odd(s)?$|^hm_beta$".to_string(),
            standard_error: r"^se(_.*)?(beta)?$|^stand(ard)?[_\-\+]?err(or)?(s)?$|^log_odd(s)?_se$|^std[_\+\-]?err$".to_string(),
            p_value: r"^p([_\-\+].*)?$|^pval(ue)?$".to_string(),
            sample_size: r"^n$|^n(_complete)?_samples$".to_string(),
            z_score: r"^z$|^z[_\-\+]?score(s)?".to_string(),
        }
    }
}

impl ColumnPatterns {
    /// Load patterns from a JSON object keyed by canonical column name.
    /// Keys that are absent keep their default pattern.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` or `ParseError::Json` if the file cannot be read
    /// or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self, ParseError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Identity columns as `(canonical name, pattern)`
    #[must_use]
    pub fn identity(&self) -> [(&'static str, &str); 5] {
        [
            ("SNP", &self.snp),
            ("CHR", &self.chrom),
            ("BP", &self.position),
            ("A2", &self.allele_high),
            ("A1", &self.allele_low),
        ]
    }

    /// Statistic columns as `(canonical name, pattern)`
    #[must_use]
    pub fn statistics(&self) -> [(&'static str, &str); 6] {
        [
            ("AF1", &self.allele_frequency),
            ("BETA", &self.beta),
            ("SE", &self.standard_error),
            ("P", &self.p_value),
            ("N", &self.sample_size),
            ("Z", &self.z_score),
        ]
    }
}

/// Find the one column whose name matches `pattern` (case-insensitively).
///
/// When several columns match but exactly one of them carries the
/// [`HARMONIZED_PREFIX`], that column is chosen. Otherwise zero or several
/// matches resolve to `None`, or to an error when `required`.
///
/// # Errors
///
/// Returns `ParseError::Pattern` for an invalid pattern and
/// `ParseError::Schema` when a required column is absent or ambiguous.
pub fn resolve_column<'c, S: AsRef<str>>(
    pattern: &str,
    columns: &'c [S],
    required: bool,
) -> Result<Option<&'c str>, ParseError> {
    let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
    let matched: Vec<&str> = columns
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| regex.is_match(name))
        .collect();

    let chosen = match matched.as_slice() {
        [single] => Some(*single),
        [] => None,
        several => {
            let harmonized: Vec<&str> = several
                .iter()
                .copied()
                .filter(|name| name.starts_with(HARMONIZED_PREFIX))
                .collect();
            match harmonized.as_slice() {
                [single] => {
                    debug!("Pattern {pattern} matched {several:?}; using {single}");
                    Some(*single)
                }
                _ => None,
            }
        }
    };

    match chosen {
        Some(name) => Ok(Some(name)),
        None if required => {
            let names: Vec<&str> = columns.iter().map(AsRef::as_ref).collect();
            Err(ParseError::Schema(format!(
                "required pattern {pattern} does not match exactly one of {names:?}"
            )))
        }
        None => {
            if matched.len() > 1 {
                warn!("Pattern {pattern} matched several columns {matched:?}; ignoring them");
            }
            Ok(None)
        }
    }
}
