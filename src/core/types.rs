use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Genome build of a working table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenomeBuild {
    /// GRCh37 / hg19
    Hg19,
    /// GRCh38 / hg38
    Hg38,
}

impl std::fmt::Display for GenomeBuild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hg19 => write!(f, "hg19"),
            Self::Hg38 => write!(f, "hg38"),
        }
    }
}

impl FromStr for GenomeBuild {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hg19" | "grch37" | "b37" => Ok(Self::Hg19),
            "hg38" | "grch38" | "b38" => Ok(Self::Hg38),
            other => Err(format!(
                "Unsupported genome build '{other}': must be hg19 or hg38"
            )),
        }
    }
}

/// Shape of a variant identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdKind {
    /// `rs` followed by digits
    Rsid,
    /// `{chrom}_{position}_{allele}_{allele}`
    Positional,
    /// Neither accepted shape
    Unrecognized,
}

impl std::fmt::Display for IdKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rsid => write!(f, "rsid"),
            Self::Positional => write!(f, "positional"),
            Self::Unrecognized => write!(f, "none"),
        }
    }
}

/// Storage type of a passthrough column, inferred at ingest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Int,
    Float,
    Text,
}

/// A single passthrough cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

/// Tokens read as missing values
pub const NULL_TOKENS: &[&str] = &["", "NA", "na", "NaN", "nan", "."];

impl Value {
    /// Parse raw text as a value of the given column type.
    /// Returns `None` when the text is not a valid instance of the type.
    #[must_use]
    pub fn parse_as(raw: &str, dtype: ColumnType) -> Option<Self> {
        let trimmed = raw.trim();
        if NULL_TOKENS.contains(&trimmed) {
            return Some(Self::Null);
        }
        match dtype {
            ColumnType::Int => trimmed.parse().ok().map(Self::Int),
            ColumnType::Float => trimmed.parse().ok().map(Self::Float),
            ColumnType::Text => Some(Self::Text(raw.to_string())),
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Render as text; null renders as the empty string
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Int(v) => v.to_string(),
            Self::Float(v) => render_float(*v),
            Self::Text(v) => v.clone(),
        }
    }

    /// Numeric value of an `Int` or `Float` cell
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Null | Self::Text(_) => None,
        }
    }
}

/// Magnitudes outside `[1e-4, 1e15)` are written in scientific notation
const PLAIN_FLOAT_RANGE: std::ops::Range<f64> = 1e-4..1e15;

/// Shortest text that parses back to the same float
fn render_float(v: f64) -> String {
    let magnitude = v.abs();
    if magnitude != 0.0 && magnitude.is_finite() && !PLAIN_FLOAT_RANGE.contains(&magnitude) {
        format!("{v:e}")
    } else {
        v.to_string()
    }
}

impl ColumnType {
    /// Infer the narrowest type able to hold every non-null raw value
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut dtype = Self::Int;
        for raw in values {
            let trimmed = raw.trim();
            if NULL_TOKENS.contains(&trimmed) {
                continue;
            }
            if dtype == Self::Int && trimmed.parse::<i64>().is_err() {
                dtype = Self::Float;
            }
            if dtype == Self::Float && trimmed.parse::<f64>().is_err() {
                return Self::Text;
            }
        }
        dtype
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genome_build_parse() {
        assert_eq!("hg19".parse::<GenomeBuild>().unwrap(), GenomeBuild::Hg19);
        assert_eq!("GRCh37".parse::<GenomeBuild>().unwrap(), GenomeBuild::Hg19);
        assert_eq!("HG38".parse::<GenomeBuild>().unwrap(), GenomeBuild::Hg38);
        assert!("hg18".parse::<GenomeBuild>().is_err());
    }

    #[test]
    fn test_infer_column_type() {
        assert_eq!(ColumnType::infer(["1", "2", "NA"]), ColumnType::Int);
        assert_eq!(ColumnType::infer(["1", "2.5", ""]), ColumnType::Float);
        assert_eq!(ColumnType::infer(["1", "abc"]), ColumnType::Text);
        assert_eq!(ColumnType::infer(Vec::<&str>::new()), ColumnType::Int);
    }

    #[test]
    fn test_value_parse_and_render() {
        assert_eq!(Value::parse_as("42", ColumnType::Int), Some(Value::Int(42)));
        assert_eq!(Value::parse_as("NA", ColumnType::Float), Some(Value::Null));
        assert_eq!(Value::parse_as("x", ColumnType::Int), None);
        assert_eq!(Value::Float(0.25).render(), "0.25");
        assert_eq!(Value::Null.render(), "");
    }

    #[test]
    fn test_tiny_and_huge_floats_render_in_scientific_notation() {
        assert_eq!(Value::Float(1e-300).render(), "1e-300");
        assert_eq!(Value::Float(5e-8).render(), "5e-8");
        assert_eq!(Value::Float(-2.5e-12).render(), "-2.5e-12");
        assert_eq!(Value::Float(3.2e20).render(), "3.2e20");
        assert_eq!(Value::Float(0.0001).render(), "0.0001");
        assert_eq!(Value::Float(0.0).render(), "0");
        assert_eq!(Value::Float(361_194.0).render(), "361194");

        for v in [1e-300, 5e-8, 7.123_456_789e-45, 1.5e300] {
            let back = Value::parse_as(&Value::Float(v).render(), ColumnType::Float);
            assert_eq!(back, Some(Value::Float(v)));
        }
    }
}
