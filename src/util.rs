use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// 32-bit string hash used to address nodes and links on the layout wire.
///
/// Same recurrence as the classic `h = h * 31 + c` over UTF-16 code units, so
/// ids hash identically no matter which side of the wire computes them.
pub fn value_hash(value: &str) -> i32 {
    value
        .encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(unit as i32))
}

pub fn pair_hash(a: &str, b: &str) -> i32 {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    value_hash(low)
        .wrapping_mul(31)
        .wrapping_add(value_hash(high))
}

pub fn abbreviate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_owned();
    }

    let mut abbreviated = value.chars().take(max_chars).collect::<String>();
    abbreviated.push_str("...");
    abbreviated
}

pub fn push_unique<T: PartialEq>(values: &mut Vec<T>, value: T) -> bool {
    if values.contains(&value) {
        return false;
    }
    values.push(value);
    true
}

pub fn stable_pair(key: impl Hash) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_hash_matches_known_values() {
        assert_eq!(value_hash(""), 0);
        assert_eq!(value_hash("a"), 97);
        assert_eq!(value_hash("ab"), 97 * 31 + 98);
        // wraps instead of overflowing
        let long = "x".repeat(64);
        let _ = value_hash(&long);
    }

    #[test]
    fn pair_hash_is_unordered() {
        assert_eq!(pair_hash("client", "server"), pair_hash("server", "client"));
        assert_ne!(pair_hash("a", "b"), pair_hash("a", "c"));
    }

    #[test]
    fn abbreviate_counts_characters() {
        assert_eq!(abbreviate("short", 40), "short");
        assert_eq!(abbreviate("ééééé", 3), "ééé...");
    }

    #[test]
    fn stable_pair_is_deterministic_and_bounded() {
        let (x, y) = stable_pair("node");
        assert_eq!((x, y), stable_pair("node"));
        assert!((-1.0..=1.0).contains(&x));
        assert!((-1.0..=1.0).contains(&y));
    }
}
