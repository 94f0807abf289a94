//! Account holder: seed, sr25519 keypair and ss58 address.
//!
//! # Security
//! - Seeds are never logged or serialized
//! - The keypair is derived once at construction time

use std::str::FromStr;

use subxt_signer::bip39::Mnemonic;
use subxt_signer::sr25519::Keypair;
use subxt_signer::SecretUri;

use crate::chain::types::{AccountId32, RobonomicsError, RobonomicsResult};
use crate::config::ClientConfig;
use crate::encoding::ss58;

/// Environment variable the CLI falls back to when `-s` is not given.
pub const SEED_ENV_VAR: &str = "ROBONOMICS_SEED";

/// Create an sr25519 keypair from any supported seed form.
///
/// - `0x...` hex: raw 32-byte mini secret key
/// - `//Alice`, `phrase//hard/soft`: secret URI (dev phrase when no phrase given)
/// - anything else: BIP-39 mnemonic
pub fn create_keypair(seed: &str) -> RobonomicsResult<Keypair> {
    let seed = seed.trim();
    if let Some(hex_seed) = seed.strip_prefix("0x") {
        let bytes = hex::decode(hex_seed)
            .map_err(|e| RobonomicsError::InvalidSeed(format!("raw seed is not hex: {}", e)))?;
        let secret: [u8; 32] = bytes
            .try_into()
            .map_err(|_| RobonomicsError::InvalidSeed("raw seed must be 32 bytes".to_string()))?;
        return Ok(Keypair::from_secret_key(secret)?);
    }

    if seed.contains("//") {
        let uri = SecretUri::from_str(seed)
            .map_err(|e| RobonomicsError::InvalidSeed(format!("bad secret URI: {}", e)))?;
        return Ok(Keypair::from_uri(&uri)?);
    }

    let mnemonic = Mnemonic::parse(seed)
        .map_err(|e| RobonomicsError::InvalidSeed(format!("bad mnemonic: {}", e)))?;
    Ok(Keypair::from_phrase(&mnemonic, None)?)
}

/// Account info and node connection parameters.
#[derive(Clone)]
pub struct Account {
    keypair: Option<Keypair>,
    address: Option<String>,
    remote_ws: String,
    ss58_prefix: u16,
}

impl Account {
    /// Build an account from configuration and an optional seed.
    ///
    /// Without a seed the account can still query the chain, but every
    /// signing operation fails with [`RobonomicsError::NoPrivateKey`].
    pub fn new(seed: Option<&str>, config: &ClientConfig) -> RobonomicsResult<Self> {
        let keypair = seed.map(create_keypair).transpose()?;
        let ss58_prefix = config.node.ss58_prefix;
        let address = keypair
            .as_ref()
            .map(|kp| ss58::encode(ss58_prefix, &kp.public_key().0));

        if let Some(address) = &address {
            tracing::info!(address = %address, remote_ws = %config.node.remote_ws, "Account initialized");
        }

        Ok(Self {
            keypair,
            address,
            remote_ws: config.node.remote_ws.clone(),
            ss58_prefix,
        })
    }

    /// Read-only account for queries and subscriptions.
    pub fn read_only(config: &ClientConfig) -> Self {
        Self {
            keypair: None,
            address: None,
            remote_ws: config.node.remote_ws.clone(),
            ss58_prefix: config.node.ss58_prefix,
        }
    }

    /// Load the seed from `ROBONOMICS_SEED`.
    pub fn from_env(config: &ClientConfig) -> RobonomicsResult<Self> {
        let seed = std::env::var(SEED_ENV_VAR).map_err(|_| {
            RobonomicsError::NoPrivateKey(format!("Environment variable {} not set", SEED_ENV_VAR))
        })?;
        Self::new(Some(&seed), config)
    }

    /// ss58 address of the account.
    pub fn get_address(&self) -> RobonomicsResult<&str> {
        self.address
            .as_deref()
            .ok_or_else(|| RobonomicsError::NoPrivateKey("No seed was provided, address unknown".to_string()))
    }

    /// Use `addr` when given, else the account's own address.
    pub fn address_or_own(&self, addr: Option<&str>) -> RobonomicsResult<String> {
        match addr {
            Some(addr) => Ok(addr.to_string()),
            None => self.get_address().map(str::to_string),
        }
    }

    pub fn keypair(&self) -> RobonomicsResult<&Keypair> {
        self.keypair
            .as_ref()
            .ok_or_else(|| RobonomicsError::NoPrivateKey("No seed was provided, unable to sign".to_string()))
    }

    pub fn account_id(&self) -> RobonomicsResult<AccountId32> {
        Ok(AccountId32(self.keypair()?.public_key().0))
    }

    /// Sign arbitrary bytes, returning the `0x`-prefixed 64-byte signature.
    pub fn sign(&self, message: &[u8]) -> RobonomicsResult<String> {
        let signature = self.keypair()?.sign(message);
        Ok(format!("0x{}", hex::encode(signature.0)))
    }

    pub fn remote_ws(&self) -> &str {
        &self.remote_ws
    }

    pub fn ss58_prefix(&self) -> u16 {
        self.ss58_prefix
    }

    /// Render raw account bytes with this account's network prefix.
    pub fn format_address(&self, account: &[u8; 32]) -> String {
        ss58::encode(self.ss58_prefix, account)
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .field("remote_ws", &self.remote_ws)
            .field("ss58_prefix", &self.ss58_prefix)
            .finish()
    }
}
