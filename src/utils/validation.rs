//! Centralized chromosome and allele helpers.

/// Canonicalize a chromosome code.
///
/// Strips any `chr` prefix (case-insensitive), upper-cases the remainder and
/// maps the numeric sex-chromosome codes `23`/`24` to `X`/`Y`.
///
/// # Examples
///
/// ```
/// use gwas_harmonize::utils::validation::canonical_chromosome;
///
/// assert_eq!(canonical_chromosome("chr1"), "1");
/// assert_eq!(canonical_chromosome("23"), "X");
/// assert_eq!(canonical_chromosome("chrx"), "X");
/// ```
#[must_use]
pub fn canonical_chromosome(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = match trimmed.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("chr") => &trimmed[3..],
        _ => trimmed,
    };
    match stripped.to_uppercase().as_str() {
        "23" => "X".to_string(),
        "24" => "Y".to_string(),
        other => other.to_string(),
    }
}

/// Pairing base of a nucleotide (A<->T, C<->G), case-insensitive.
/// Other characters are returned upper-cased and unchanged.
#[must_use]
pub fn complement_base(base: char) -> char {
    match base.to_ascii_uppercase() {
        'A' => 'T',
        'T' => 'A',
        'C' => 'G',
        'G' => 'C',
        other => other,
    }
}

/// Substitute every base of an allele with its pairing base.
///
/// The base order is kept; this is a per-base substitution, not a reversal.
#[must_use]
pub fn complement_allele(allele: &str) -> String {
    allele.chars().map(complement_base).collect()
}

/// A/T and C/G pairs cannot be strand-resolved from alleles alone
#[must_use]
pub fn is_ambiguous_pair(a: &str, b: &str) -> bool {
    a.len() == 1 && b.len() == 1 && complement_allele(a) == b.to_uppercase()
}

/// Chromosomes 1 through 22
#[must_use]
pub fn is_autosome(chrom: &str) -> bool {
    chrom
        .parse::<u8>()
        .is_ok_and(|n| (1..=22).contains(&n))
}

/// Sort key putting chromosomes in karyotypic order:
/// numbered chromosomes ascending, then X, then Y, then anything else lexically.
#[must_use]
pub fn chromosome_order(chrom: &str) -> (u8, u32, String) {
    if let Ok(n) = chrom.parse::<u32>() {
        return (0, n, String::new());
    }
    match chrom {
        "X" => (1, 0, String::new()),
        "Y" => (2, 0, String::new()),
        other => (3, 0, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_chromosome() {
        assert_eq!(canonical_chromosome("chr1"), "1");
        assert_eq!(canonical_chromosome("CHR22"), "22");
        assert_eq!(canonical_chromosome("23"), "X");
        assert_eq!(canonical_chromosome("24"), "Y");
        assert_eq!(canonical_chromosome("x"), "X");
        assert_eq!(canonical_chromosome(" 7 "), "7");
        assert_eq!(canonical_chromosome("MT"), "MT");
    }

    #[test]
    fn test_complement_is_substitution_not_reversal() {
        assert_eq!(complement_allele("G"), "C");
        assert_eq!(complement_allele("t"), "A");
        assert_eq!(complement_allele("AC"), "TG");
        assert_eq!(complement_allele("GTA"), "CAT");
    }

    #[test]
    fn test_ambiguous_pairs() {
        assert!(is_ambiguous_pair("A", "T"));
        assert!(is_ambiguous_pair("g", "C"));
        assert!(!is_ambiguous_pair("A", "G"));
        assert!(!is_ambiguous_pair("AT", "TA"));
    }

    #[test]
    fn test_chromosome_order() {
        let mut chroms = vec!["X", "10", "2", "Y", "1", "MT"];
        chroms.sort_by_key(|c| chromosome_order(c));
        assert_eq!(chroms, vec!["1", "2", "10", "X", "Y", "MT"]);
    }
}
