/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// 32-bit polynomial string hash with base 31 over UTF-16 code units,
/// wrapped in signed 32-bit arithmetic. Returns the absolute value.
pub fn string_hash(input: &str) -> u32 {
    let hash = input
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32));
    hash.unsigned_abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round1() {
        assert_eq!(round1(6.04), 6.0);
        assert_eq!(round1(6.05), 6.1);
        assert_eq!(round1(12.345), 12.3);
    }

    #[test]
    fn test_string_hash_known_values() {
        assert_eq!(string_hash(""), 0);
        assert_eq!(string_hash("a"), 97);
        // 'a' * 31 + 'b'
        assert_eq!(string_hash("ab"), 97 * 31 + 98);
    }

    #[test]
    fn test_string_hash_wraps_to_absolute() {
        // Long inputs overflow i32; the result must still be stable.
        let id = "vehicle-0000000000000000000000000042";
        assert_eq!(string_hash(id), string_hash(id));
    }
}
