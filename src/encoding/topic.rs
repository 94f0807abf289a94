//! Digital twin topic hashing.

use sha2::{Digest, Sha256};

/// Hash a topic name the way digital twin `set_source` expects it:
/// sha256 over the UTF-8 bytes, rendered as `0x` hex.
pub fn dt_encode_topic(topic: &str) -> String {
    format!("0x{}", hex::encode(Sha256::digest(topic.as_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digests() {
        assert_eq!(
            dt_encode_topic(""),
            "0xe3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            dt_encode_topic("abc"),
            "0xba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_deterministic_and_distinct() {
        assert_eq!(dt_encode_topic("temperature"), dt_encode_topic("temperature"));
        assert_ne!(dt_encode_topic("temperature"), dt_encode_topic("humidity"));
    }
}
