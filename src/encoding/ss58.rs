//! ss58 address encoding.
//!
//! `subxt::utils::AccountId32` always renders with the generic prefix 42,
//! while Robonomics addresses use prefix 32, so encoding takes the prefix
//! explicitly. Decoding accepts any prefix and returns it.

use blake2::{Blake2b512, Digest};

use crate::chain::types::{RobonomicsError, RobonomicsResult};

/// Default Robonomics ss58 network prefix.
pub const ROBONOMICS_PREFIX: u16 = 32;

const CHECKSUM_PREAMBLE: &[u8] = b"SS58PRE";
const CHECKSUM_LEN: usize = 2;

fn checksum(data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut hasher = Blake2b512::new();
    hasher.update(CHECKSUM_PREAMBLE);
    hasher.update(data);
    let digest = hasher.finalize();
    [digest[0], digest[1]]
}

/// Encode a 32-byte public key as an ss58 address with the given prefix.
///
/// Prefixes above 16383 are not representable and are masked to 14 bits.
pub fn encode(prefix: u16, public_key: &[u8; 32]) -> String {
    let ident = prefix & 0b0011_1111_1111_1111;
    let mut data = match ident {
        0..=63 => vec![ident as u8],
        _ => {
            let first = ((ident & 0b0000_0000_1111_1100) as u8) >> 2 | 0b0100_0000;
            let second = ((ident >> 8) as u8) | (((ident & 0b0000_0000_0000_0011) as u8) << 6);
            vec![first, second]
        }
    };
    data.extend_from_slice(public_key);
    let sum = checksum(&data);
    data.extend_from_slice(&sum);
    bs58::encode(data).into_string()
}

/// Decode an ss58 address into `(prefix, public key)`.
pub fn decode(address: &str) -> RobonomicsResult<(u16, [u8; 32])> {
    let invalid = |reason: &str| RobonomicsError::InvalidAddress(format!("{}: {}", address, reason));

    let data = bs58::decode(address)
        .into_vec()
        .map_err(|_| invalid("not base58"))?;
    if data.len() < 2 {
        return Err(invalid("too short"));
    }

    let (prefix_len, prefix) = match data[0] {
        0..=63 => (1, data[0] as u16),
        64..=127 => {
            let lower = (data[0] << 2) | (data[1] >> 6);
            let upper = data[1] & 0b0011_1111;
            (2, (lower as u16) | ((upper as u16) << 8))
        }
        _ => return Err(invalid("reserved prefix")),
    };

    if data.len() != prefix_len + 32 + CHECKSUM_LEN {
        return Err(invalid("wrong length"));
    }

    let body_end = prefix_len + 32;
    if checksum(&data[..body_end]) != data[body_end..] {
        return Err(invalid("bad checksum"));
    }

    let mut key = [0u8; 32];
    key.copy_from_slice(&data[prefix_len..body_end]);
    Ok((prefix, key))
}

/// Decode an address into raw account bytes, ignoring its prefix.
pub fn account_bytes(address: &str) -> RobonomicsResult<[u8; 32]> {
    decode(address).map(|(_, key)| key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE_PUBLIC: &str = "d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";
    const ALICE_SUBSTRATE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";

    fn alice() -> [u8; 32] {
        hex::decode(ALICE_PUBLIC).unwrap().try_into().unwrap()
    }

    #[test]
    fn test_known_generic_substrate_address() {
        assert_eq!(encode(42, &alice()), ALICE_SUBSTRATE);
        assert_eq!(decode(ALICE_SUBSTRATE).unwrap(), (42, alice()));
    }

    #[test]
    fn test_robonomics_prefix_round_trip() {
        let address = encode(ROBONOMICS_PREFIX, &alice());
        assert_ne!(address, ALICE_SUBSTRATE);
        assert_eq!(decode(&address).unwrap(), (ROBONOMICS_PREFIX, alice()));
        assert_eq!(account_bytes(&address).unwrap(), alice());
    }

    #[test]
    fn test_two_byte_prefix_round_trip() {
        let address = encode(2254, &alice());
        assert_eq!(decode(&address).unwrap(), (2254, alice()));
    }

    #[test]
    fn test_bad_checksum_rejected() {
        let mut chars: Vec<char> = ALICE_SUBSTRATE.chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == 'Y' { 'Z' } else { 'Y' };
        let tampered: String = chars.into_iter().collect();
        assert!(decode(&tampered).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(decode("not an address").is_err());
        assert!(decode("").is_err());
    }
}
