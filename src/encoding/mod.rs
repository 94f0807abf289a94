//! Encoding helpers shared by the domain modules.
//!
//! # Responsibilities
//! - IPFS `Qm...` multihash <-> 32-byte hex conversion
//! - Digital twin topic hashing
//! - ss58 address encoding with an explicit network prefix
//! - 32-byte hex parsing for `H256` call arguments
//!
//! # Design Decisions
//! - Pure functions only; nothing here touches the network
//! - SCALE encoding is left to `subxt::ext::codec`

pub mod ipfs_hash;
pub mod ss58;
pub mod topic;

pub use ipfs_hash::{ipfs_32_bytes_to_qm_hash, ipfs_qm_hash_to_32_bytes};
pub use topic::dt_encode_topic;

use crate::chain::types::{RobonomicsError, RobonomicsResult};

/// Parse a `0x`-prefixed (or bare) 64-character hex string into 32 bytes.
pub fn parse_h256(value: &str) -> RobonomicsResult<[u8; 32]> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    let bytes = hex::decode(stripped)
        .map_err(|e| RobonomicsError::InvalidHash(format!("'{}' is not hex: {}", value, e)))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| {
            RobonomicsError::InvalidHash(format!("expected 32 bytes, got {}", b.len()))
        })
}

/// Parse `0x`-prefixed (or bare) hex of any length.
pub fn parse_hex(value: &str) -> RobonomicsResult<Vec<u8>> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(stripped).map_err(|e| RobonomicsError::InvalidHash(format!("'{}' is not hex: {}", value, e)))
}

/// Accept either a `Qm...` IPFS hash or 32-byte hex and return the raw bytes.
pub fn hash_or_ipfs_to_bytes(value: &str) -> RobonomicsResult<[u8; 32]> {
    if value.starts_with("Qm") {
        parse_h256(&ipfs_qm_hash_to_32_bytes(value)?)
    } else {
        parse_h256(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_h256_with_and_without_prefix() {
        let hex_str = "11".repeat(32);
        assert_eq!(parse_h256(&hex_str).unwrap(), [0x11; 32]);
        assert_eq!(parse_h256(&format!("0x{}", hex_str)).unwrap(), [0x11; 32]);
    }

    #[test]
    fn test_parse_h256_wrong_length() {
        let err = parse_h256("0xdeadbeef").unwrap_err();
        assert!(err.to_string().contains("expected 32 bytes"));
    }

    #[test]
    fn test_parse_hex_any_length() {
        assert_eq!(parse_hex("0xdeadbeef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert!(parse_hex("0xzz").is_err());
    }

    #[test]
    fn test_hash_or_ipfs_accepts_qm() {
        let raw = format!("0x{}", "ab".repeat(32));
        let qm = ipfs_32_bytes_to_qm_hash(&raw).unwrap();
        assert_eq!(hash_or_ipfs_to_bytes(&qm).unwrap(), [0xab; 32]);
        assert_eq!(hash_or_ipfs_to_bytes(&raw).unwrap(), [0xab; 32]);
    }
}
