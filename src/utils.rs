/// Get library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Render bytes as concatenated two-digit lowercase hex pairs.
pub fn hex_pairs(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Space separated hex dump, used for debug logging of file buffers.
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| hex::encode([*b]))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_pairs_are_zero_padded() {
        assert_eq!(hex_pairs(&[0x00, 0x0a, 0xff]), "000aff");
        assert_eq!(hex_pairs(&[]), "");
    }

    #[test]
    fn hex_pairs_are_lowercase() {
        assert_eq!(hex_pairs(&[0xAB, 0xCD]), "abcd");
        assert_eq!(hex_dump(&[0xAB, 0x0C]), "ab 0c");
    }

    #[test]
    fn hex_dump_separates_bytes() {
        assert_eq!(hex_dump(&[0xcc, 0x06, 0x00]), "cc 06 00");
    }

    #[test]
    fn version_is_set() {
        assert!(!version().is_empty());
    }
}
