//! Assembly name digests.
//!
//! Both tables in a blob and every manifest row are keyed on xxHash of the
//! assembly name's UTF-8 bytes, seed 0.  The 32-bit digest is zero-extended
//! to 64 bits when stored in the hash32 table.

use xxhash_rust::xxh32::xxh32;
use xxhash_rust::xxh64::xxh64;

pub fn hash32(name: &str) -> u32 {
    xxh32(name.as_bytes(), 0)
}

pub fn hash64(name: &str) -> u64 {
    xxh64(name.as_bytes(), 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference values for the empty input, seed 0.
    #[test]
    fn empty_name_matches_reference() {
        assert_eq!(hash32(""), 0x02cc_5d05);
        assert_eq!(hash64(""), 0xef46_db37_51d8_e999);
    }

    #[test]
    fn digests_are_deterministic_and_distinct() {
        assert_eq!(hash32("test"), hash32("test"));
        assert_eq!(hash64("test2"), hash64("test2"));
        assert_ne!(hash32("test"), hash32("test2"));
        assert_ne!(hash64("test"), hash64("test2"));
    }
}
