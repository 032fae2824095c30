//! Structural identifier checks: digit counts and national checksums.
//!
//! All functions are pure and allocation-light; they run before any I/O.

/// Strip separators (whitespace, `-`, `/`, `.`) and return the digits, if the
/// remainder is all ASCII digits of the expected length.
pub fn digits(raw: &str, len: usize) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '/' | '.'))
        .collect();

    (cleaned.len() == len && cleaned.bytes().all(|b| b.is_ascii_digit())).then_some(cleaned)
}

fn digit_values(value: &str) -> Vec<u32> {
    value.chars().filter_map(|c| c.to_digit(10)).collect()
}

/// Czech IČO: 8 digits, weights 8..2, check digit `(11 - sum mod 11) mod 10`.
pub fn cz_ico_checksum(ico: &str) -> bool {
    let d = digit_values(ico);
    if d.len() != 8 || ico.len() != 8 {
        return false;
    }
    let sum: u32 = d[..7]
        .iter()
        .zip((2..=8).rev())
        .map(|(digit, weight)| digit * weight)
        .sum();
    (11 - sum % 11) % 10 == d[7]
}

/// Polish NIP: 10 digits, weights 6,5,7,2,3,4,5,6,7, check digit `sum mod 11`
/// (a remainder of 10 is never issued).
pub fn pl_nip_checksum(nip: &str) -> bool {
    const WEIGHTS: [u32; 9] = [6, 5, 7, 2, 3, 4, 5, 6, 7];
    let d = digit_values(nip);
    if d.len() != 10 || nip.len() != 10 {
        return false;
    }
    let remainder = d[..9]
        .iter()
        .zip(WEIGHTS)
        .map(|(digit, weight)| digit * weight)
        .sum::<u32>()
        % 11;
    remainder != 10 && remainder == d[9]
}

/// Polish KRS number: 10 digits, zero-padded, so always leading `0`.
pub fn pl_krs_shape(krs: &str) -> bool {
    krs.len() == 10 && krs.starts_with('0') && krs.bytes().all(|b| b.is_ascii_digit())
}

/// Hungarian adószám (`NNNNNNNN-N-NN`): base of 8 digits whose last digit is
/// a check digit over weights 9,7,3,1,9,7,3; VAT code 1-5; two-digit county code.
pub fn hu_tax_number(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let parts: Vec<&str> = trimmed.split('-').collect();
    let value = match parts.as_slice() {
        [base, vat, county] if base.len() == 8 && vat.len() == 1 && county.len() == 2 => {
            digits(trimmed, 11)?
        }
        [single] if single.len() == 11 => digits(single, 11)?,
        _ => return None,
    };

    const WEIGHTS: [u32; 7] = [9, 7, 3, 1, 9, 7, 3];
    let d = digit_values(&value);
    let sum: u32 = d[..7]
        .iter()
        .zip(WEIGHTS)
        .map(|(digit, weight)| digit * weight)
        .sum();
    let check_ok = (10 - sum % 10) % 10 == d[7];
    let vat_ok = (1..=5).contains(&d[8]);

    (check_ok && vat_ok).then_some(value)
}

/// Free-text legal name: at least three characters, at least one letter.
pub fn name_query(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (collapsed.chars().count() >= 3 && collapsed.chars().any(char::is_alphabetic))
        .then(|| collapsed.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_strips_separators() {
        assert_eq!(digits("888 888 88", 8), Some("88888888".to_string()));
        assert_eq!(digits("12-34-56-78", 8), Some("12345678".to_string()));
        assert_eq!(digits("1234567", 8), None);
        assert_eq!(digits("1234567a", 8), None);
    }

    #[test]
    fn test_cz_ico_checksum() {
        assert!(cz_ico_checksum("25596641"));
        assert!(!cz_ico_checksum("25596642"));
        // Slovak test entities do not carry a valid Czech check digit
        assert!(!cz_ico_checksum("88888888"));
        assert!(!cz_ico_checksum("12345678"));
    }

    #[test]
    fn test_pl_nip_checksum() {
        assert!(pl_nip_checksum("5260250274"));
        assert!(!pl_nip_checksum("5260250275"));
        assert!(!pl_nip_checksum("526025027"));
    }

    #[test]
    fn test_pl_krs_shape() {
        assert!(pl_krs_shape("0000019193"));
        assert!(!pl_krs_shape("1000019193"));
        assert!(!pl_krs_shape("000001919"));
    }

    #[test]
    fn test_hu_tax_number() {
        assert_eq!(
            hu_tax_number("10773381-2-44"),
            Some("10773381244".to_string())
        );
        assert_eq!(hu_tax_number("10773381244"), Some("10773381244".to_string()));
        // Bad check digit
        assert_eq!(hu_tax_number("10773382-2-44"), None);
        // VAT code out of range
        assert_eq!(hu_tax_number("10773381-7-44"), None);
        // Wrong grouping
        assert_eq!(hu_tax_number("1077338-12-44"), None);
    }

    #[test]
    fn test_name_query() {
        assert_eq!(
            name_query("  Seznam.cz   a.s. "),
            Some("seznam.cz a.s.".to_string())
        );
        assert_eq!(name_query("ab"), None);
        assert_eq!(name_query("12345"), None);
    }
}
