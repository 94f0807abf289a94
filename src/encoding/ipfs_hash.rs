//! IPFS CIDv0 (`Qm...`) conversion.
//!
//! A CIDv0 is base58 of a sha2-256 multihash: `0x12` (sha2-256), `0x20`
//! (32-byte digest length), then the digest. On-chain we only store the digest.

use crate::chain::types::{RobonomicsError, RobonomicsResult};

const MULTIHASH_PREFIX: [u8; 2] = [0x12, 0x20];

/// Convert a 32-byte hex digest (with or without `0x`) into an IPFS `Qm...` hash.
pub fn ipfs_32_bytes_to_qm_hash(string_32_bytes: &str) -> RobonomicsResult<String> {
    let digest = super::parse_h256(string_32_bytes)?;

    let mut multihash = Vec::with_capacity(34);
    multihash.extend_from_slice(&MULTIHASH_PREFIX);
    multihash.extend_from_slice(&digest);

    Ok(bs58::encode(multihash).into_string())
}

/// Convert an IPFS `Qm...` hash into a `0x`-prefixed 32-byte hex digest.
pub fn ipfs_qm_hash_to_32_bytes(ipfs_qm: &str) -> RobonomicsResult<String> {
    let decoded = bs58::decode(ipfs_qm)
        .into_vec()
        .map_err(|e| RobonomicsError::InvalidHash(format!("'{}' is not base58: {}", ipfs_qm, e)))?;

    if decoded.len() != 34 || decoded[..2] != MULTIHASH_PREFIX {
        return Err(RobonomicsError::InvalidHash(format!(
            "'{}' is not a sha2-256 CIDv0",
            ipfs_qm
        )));
    }

    Ok(format!("0x{}", hex::encode(&decoded[2..])))
}
