// Helpers for generating UUIDv7 (timestamp-sortable UUIDs)
//
// Record ids and transaction hashcodes are generated app-side so that
// both stores (Postgres and in-memory) hand out the same shape of id and
// hashcodes sort by issue time.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}

/// Generate a fresh transaction hashcode.
///
/// Hashcodes are hyphenated UUIDv7 strings: unique, opaque to clients and
/// ordered by creation time.
pub fn new_hashcode() -> String {
    uuidv7().hyphenated().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuidv7_is_valid() {
        let id = uuidv7();
        assert_eq!(id.get_version(), Some(uuid::Version::SortRand));
    }

    #[test]
    fn uuidv7_is_monotonic() {
        let a = uuidv7();
        let b = uuidv7();
        assert!(b >= a);
    }

    #[test]
    fn hashcodes_are_unique_and_parseable() {
        let a = new_hashcode();
        let b = new_hashcode();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
        assert!(Uuid::parse_str(&a).is_ok());
    }
}
