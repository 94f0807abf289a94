//! Chain-facing types and error definitions.

use std::fmt;

use thiserror::Error;

pub use subxt::utils::{AccountId32, H256};

/// Errors that can occur while talking to a Robonomics node or gateway.
#[derive(Debug, Error)]
pub enum RobonomicsError {
    /// Signing was requested but the account was created without a seed.
    #[error("No private key: {0}")]
    NoPrivateKey(String),

    /// The extrinsic was included but dispatch failed on-chain.
    #[error("Extrinsic failed: {0}")]
    ExtrinsicFailed(String),

    /// Block or extrinsic hash is not `0x` + 64 hex characters.
    #[error("Invalid extrinsic hash: {0}")]
    InvalidExtrinsicHash(String),

    /// No such digital twin, or no such topic in its map.
    #[error("Digital twin map error: {0}")]
    DigitalTwinMap(String),

    /// IPFS gateway refused an upload.
    #[error("Failed to upload content, gateway returned status {0}")]
    UploadFailed(u16),

    /// IPFS gateway refused a pin request.
    #[error("Failed to pin content, gateway returned status {0}")]
    PinFailed(u16),

    /// The websocket to the node was closed underneath a call.
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// Opening the websocket did not finish in time.
    #[error("Connection timeout after {0} seconds")]
    Timeout(u64),

    /// Any other RPC / client library failure.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// A chain value did not have the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid address {0}")]
    InvalidAddress(String),

    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    /// Call argument rejected before submission.
    #[error("Invalid payload: {0}")]
    Payload(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RobonomicsError {
    /// Whether this error means the socket must be reopened.
    pub fn is_connection_closed(&self) -> bool {
        matches!(self, RobonomicsError::ConnectionClosed(_))
    }
}

/// Result type for Robonomics operations.
pub type RobonomicsResult<T> = Result<T, RobonomicsError>;

const CLOSED_MARKERS: &[&str] = &[
    "restart required",
    "restart needed",
    "background task closed",
    "connection closed",
    "connection reset",
    "broken pipe",
    "not connected",
    "subscription dropped",
];

/// Classify a client library error message as a closed connection.
pub fn is_closed_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    CLOSED_MARKERS.iter().any(|marker| lower.contains(marker))
}

impl From<subxt::Error> for RobonomicsError {
    fn from(err: subxt::Error) -> Self {
        match err {
            subxt::Error::Rpc(rpc) => {
                let message = rpc.to_string();
                if is_closed_message(&message) {
                    RobonomicsError::ConnectionClosed(message)
                } else {
                    RobonomicsError::Rpc(message)
                }
            }
            subxt::Error::Runtime(dispatch) => RobonomicsError::ExtrinsicFailed(dispatch.to_string()),
            other => RobonomicsError::Rpc(other.to_string()),
        }
    }
}

impl From<subxt::error::DecodeError> for RobonomicsError {
    fn from(err: subxt::error::DecodeError) -> Self {
        RobonomicsError::Decode(err.to_string())
    }
}

impl From<subxt::ext::subxt_core::Error> for RobonomicsError {
    fn from(err: subxt::ext::subxt_core::Error) -> Self {
        RobonomicsError::Decode(err.to_string())
    }
}

impl From<subxt_signer::sr25519::Error> for RobonomicsError {
    fn from(err: subxt_signer::sr25519::Error) -> Self {
        RobonomicsError::InvalidSeed(err.to_string())
    }
}

/// Result of submitting an extrinsic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtrinsicOutcome {
    /// `0x`-prefixed extrinsic hash.
    pub hash: String,
    /// `"<block number>-<extrinsic index>"`, when inclusion was awaited and requested.
    pub block_num_idx: Option<String>,
}

impl ExtrinsicOutcome {
    pub fn new(hash: H256) -> Self {
        Self {
            hash: format!("{:?}", hash),
            block_num_idx: None,
        }
    }

    pub fn with_block(mut self, block_number: u64, extrinsic_index: u32) -> Self {
        self.block_num_idx = Some(format!("{}-{}", block_number, extrinsic_index));
        self
    }
}

impl fmt::Display for ExtrinsicOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.block_num_idx {
            Some(block) => write!(f, "({}, {})", self.hash, block),
            None => write!(f, "{}", self.hash),
        }
    }
}

/// Signature scheme of a liability party's account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CryptoType {
    Ed25519,
    #[default]
    Sr25519,
    Ecdsa,
}

impl CryptoType {
    /// Variant name of `MultiSignature` for this scheme.
    pub fn variant(&self) -> &'static str {
        match self {
            CryptoType::Ed25519 => "Ed25519",
            CryptoType::Sr25519 => "Sr25519",
            CryptoType::Ecdsa => "Ecdsa",
        }
    }
}

/// Block pointer accepted by chain utilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockRef {
    Number(u64),
    Hash(String),
}

/// Extrinsic pointer inside a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtrinsicRef {
    /// Zero-based position in the block.
    Index(u32),
    Hash(String),
}
