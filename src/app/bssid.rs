//! BSSID validation and normalization.

/// Validates and normalizes a BSSID into canonical `AA:BB:CC:DD:EE:FF` form.
///
/// Accepts colon- or dash-separated pairs and bare 12-digit hex strings.
/// Returns `None` for anything that is not exactly six hex octets, so
/// malformed capture lines never reach the resolver or the upstream API.
pub fn validate_and_normalize_bssid(raw: &str) -> Option<String> {
    let hex: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ':' && *c != '-')
        .collect();

    if hex.len() != 12 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let upper = hex.to_ascii_uppercase();
    let octets: Vec<&str> = (0..6).map(|i| &upper[i * 2..i * 2 + 2]).collect();
    Some(octets.join(":"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_form_passes_through() {
        assert_eq!(
            validate_and_normalize_bssid("AA:BB:CC:DD:EE:FF").as_deref(),
            Some("AA:BB:CC:DD:EE:FF")
        );
    }

    #[test]
    fn test_lowercase_and_dashes_are_normalized() {
        assert_eq!(
            validate_and_normalize_bssid("aa-bb-cc-dd-ee-ff").as_deref(),
            Some("AA:BB:CC:DD:EE:FF")
        );
        assert_eq!(
            validate_and_normalize_bssid("de:ad:be:ef:00:01").as_deref(),
            Some("DE:AD:BE:EF:00:01")
        );
    }

    #[test]
    fn test_bare_hex_is_accepted() {
        assert_eq!(
            validate_and_normalize_bssid("deadbeef0001").as_deref(),
            Some("DE:AD:BE:EF:00:01")
        );
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        assert_eq!(
            validate_and_normalize_bssid("  aa:bb:cc:dd:ee:ff \n").as_deref(),
            Some("AA:BB:CC:DD:EE:FF")
        );
    }

    #[test]
    fn test_malformed_identifiers_are_rejected() {
        assert_eq!(validate_and_normalize_bssid(""), None);
        assert_eq!(validate_and_normalize_bssid("not a mac"), None);
        assert_eq!(validate_and_normalize_bssid("aa:bb:cc:dd:ee"), None);
        assert_eq!(validate_and_normalize_bssid("aa:bb:cc:dd:ee:ff:00"), None);
        assert_eq!(validate_and_normalize_bssid("gg:bb:cc:dd:ee:ff"), None);
    }
}
