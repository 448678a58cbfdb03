//! Hex encoding for keys, addresses and signatures.

pub(crate) fn encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

pub(crate) fn decode(hex: &str) -> Result<Vec<u8>, String> {
    if hex.len() % 2 != 0 {
        return Err("hex string must have even length".to_string());
    }
    if let Some(i) = hex.bytes().position(|b| !b.is_ascii_hexdigit()) {
        return Err(format!("invalid hex character at position {i}"));
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| format!("invalid hex at position {i}: {e}"))
        })
        .collect()
}

pub(crate) fn strip_0x(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        assert_eq!(decode(&encode(&[0, 1, 0xab, 0xff])).unwrap(), vec![0, 1, 0xab, 0xff]);
    }

    #[test]
    fn rejects_odd_length_and_non_hex() {
        assert!(decode("abc").is_err());
        assert!(decode("zz").is_err());
        assert!(decode("é0").is_err());
    }

    #[test]
    fn rejects_signs_inside_digit_pairs() {
        assert!(decode("+f").is_err());
        assert!(decode("-1").is_err());
        assert!(decode("ab+f").is_err());
    }
}
