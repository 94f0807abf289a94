//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Public Robonomics parachain endpoint.
pub const DEFAULT_REMOTE_WS: &str = "wss://kusama.rpc.robonomics.network";

/// Root configuration for the Robonomics client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Node endpoint and address format.
    pub node: NodeConfig,

    /// Extrinsic submission behaviour.
    pub extrinsics: ExtrinsicConfig,

    /// Event subscriber settings.
    pub subscriber: SubscriberConfig,

    /// IPFS gateway settings.
    pub ipfs: IpfsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Node connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Websocket endpoint (e.g., "ws://127.0.0.1:9944").
    pub remote_ws: String,

    /// ss58 network prefix used to render addresses.
    pub ss58_prefix: u16,

    /// Timeout for opening the websocket, in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            remote_ws: DEFAULT_REMOTE_WS.to_string(),
            ss58_prefix: 32,
            connect_timeout_secs: 30,
        }
    }
}

/// Extrinsic submission configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtrinsicConfig {
    /// Wait for the extrinsic to be included in a block.
    pub wait_for_inclusion: bool,

    /// Return `"<block>-<idx>"` along with the hash (needs `wait_for_inclusion`).
    pub return_block_num: bool,

    /// Subscription owner; when set every extrinsic goes through `RWS.call`.
    pub rws_sub_owner: Option<String>,
}

impl Default for ExtrinsicConfig {
    fn default() -> Self {
        Self {
            wait_for_inclusion: true,
            return_block_num: false,
            rws_sub_owner: None,
        }
    }
}

/// Event subscriber configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SubscriberConfig {
    /// Capacity of the matched-event channel.
    pub channel_capacity: usize,

    /// Base delay before resubscribing after a dropped socket.
    pub resubscribe_base_delay_ms: u64,

    /// Cap for the resubscribe delay.
    pub resubscribe_max_delay_ms: u64,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            resubscribe_base_delay_ms: 500,
            resubscribe_max_delay_ms: 30_000,
        }
    }
}

/// IPFS gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IpfsConfig {
    /// Gateway exposing the `/api/v0` HTTP API (upload, pin).
    pub api_gateway: String,

    /// Gateway serving `/ipfs/<cid>` content.
    pub content_gateway: String,

    /// Authenticate uploads with a signed-pubkey (web3) header.
    pub web3_auth: bool,
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self {
            api_gateway: "http://127.0.0.1:5001".to_string(),
            content_gateway: "http://127.0.0.1:8080".to_string(),
            web3_auth: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human format.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
