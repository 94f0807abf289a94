//! IPFS HTTP gateway access.
//!
//! # Responsibilities
//! - Upload content through `/api/v0/add` and pin it through `/api/v0/pin/add`
//! - Fetch content from a `/ipfs/<cid>` gateway
//! - Build web3 (signed pubkey) credentials for gateways that require them

pub mod auth;
pub mod gateway;

pub use auth::web3_auth;
pub use gateway::IpfsGateway;
