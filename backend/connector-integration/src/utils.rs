use std::collections::HashMap;

/// Header lookup that tolerates whatever casing the host's HTTP stack hands
/// us; header names are case-insensitive on the wire.
pub fn get_header_ignore_case<'a>(
    headers: &'a HashMap<String, String>,
    name: &str,
) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let headers = HashMap::from([(
            "QUICKPAY-CHECKSUM-SHA256".to_string(),
            "abcdef".to_string(),
        )]);
        assert_eq!(
            get_header_ignore_case(&headers, "Quickpay-Checksum-Sha256"),
            Some("abcdef")
        );
        assert_eq!(get_header_ignore_case(&headers, "X-Missing"), None);
    }
}
