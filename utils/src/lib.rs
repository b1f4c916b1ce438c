//! Leverage common functionality across governance primitives.

mod time;
pub use time::SystemTimeExt;

/// Converts bytes to a hexadecimal string.
pub fn hex(bytes: &[u8]) -> String {
    let mut hex = String::with_capacity(bytes.len() * 2);
    for byte in bytes.iter() {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

/// Converts a hexadecimal string to bytes.
pub fn from_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return None;
    }

    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}

/// Converts a hexadecimal string to bytes, stripping whitespace and/or a `0x` prefix. Commonly used
/// to accept addresses and keys as operators paste them.
pub fn from_hex_formatted(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.replace(['\t', '\n', '\r', ' '], "");
    let res = hex.strip_prefix("0x").unwrap_or(&hex);
    from_hex(res)
}

/// Compute the signing threshold `m` required from a signer set of size `n`.
///
/// The threshold is `floor((5n + 6) / 7)`, an integer approximation of a two-thirds-plus-one
/// supermajority. Verifiers recompute this exact value, so it must not be replaced with a
/// rounded or floating-point variant.
///
/// Returns `None` if `n` is zero.
pub fn quorum(n: u32) -> Option<u32> {
    if n == 0 {
        return None;
    }
    let n = n as u64;
    Some(((5 * n + 6) / 7) as u32)
}

/// Computes the union of two byte slices.
pub fn union(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut union = Vec::with_capacity(a.len() + b.len());
    union.extend_from_slice(a);
    union.extend_from_slice(b);
    union
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_hex() {
        // Test case 0: empty bytes
        let b = &[];
        let h = hex(b);
        assert_eq!(h, "");
        assert_eq!(from_hex(&h).unwrap(), b.to_vec());

        // Test case 1: single byte
        let b = &[0x01];
        let h = hex(b);
        assert_eq!(h, "01");
        assert_eq!(from_hex(&h).unwrap(), b.to_vec());

        // Test case 2: multiple bytes
        let b = &[0x01, 0x02, 0x03];
        let h = hex(b);
        assert_eq!(h, "010203");
        assert_eq!(from_hex(&h).unwrap(), b.to_vec());

        // Test case 3: odd number of bytes
        let h = "0102030";
        assert!(from_hex(h).is_none());

        // Test case 4: invalid hexadecimal character
        let h = "01g3";
        assert!(from_hex(h).is_none());

        // Test case 5: multi-byte character
        let h = "0é";
        assert!(from_hex(h).is_none());
    }

    #[test]
    fn test_from_hex_formatted() {
        let b = &[0x01, 0x02, 0x03];

        // Test case 0: whitespace
        let h = "01 02 03";
        assert_eq!(from_hex_formatted(h).unwrap(), b.to_vec());

        // Test case 1: 0x prefix
        let h = "0x010203";
        assert_eq!(from_hex_formatted(h).unwrap(), b.to_vec());

        // Test case 2: 0x prefix + different whitespace chars
        let h = "    \n\n0x\r\n01
                            02\t03\n";
        assert_eq!(from_hex_formatted(h).unwrap(), b.to_vec());

        // Test case 3: invalid after stripping
        assert!(from_hex_formatted("0x0g").is_none());
    }

    #[test_case(1, 1)]
    #[test_case(2, 2)]
    #[test_case(3, 3)]
    #[test_case(4, 3)]
    #[test_case(5, 4)]
    #[test_case(7, 5)]
    #[test_case(9, 7)]
    #[test_case(10, 8)]
    #[test_case(21, 15)]
    fn test_quorum(n: u32, m: u32) {
        assert_eq!(quorum(n), Some(m));
    }

    #[test]
    fn test_quorum_empty() {
        assert_eq!(quorum(0), None);
    }

    #[test]
    fn test_quorum_formula() {
        for n in 1..=1024u32 {
            let m = quorum(n).unwrap();
            assert_eq!(m, (5 * n + 6) / 7);
            assert!(m >= 1 && m <= n);
        }
        assert_eq!(quorum(u32::MAX), Some(((5 * u32::MAX as u64 + 6) / 7) as u32));
    }

    #[test]
    fn test_union() {
        assert_eq!(union(b"ab", b"cd"), b"abcd".to_vec());
        assert_eq!(union(b"", b""), Vec::<u8>::new());
    }
}
