//! Chain access layer.
//!
//! # Data Flow
//! ```text
//! Account (seed → keypair → ss58 address)
//!     │
//!     ▼
//! Service ──chainstate_query──► Connection::call ──► storage fetch
//!         ──extrinsic─────────► Connection::call ──► sign, submit, watch
//!         ──rpc_request───────► Connection::call ──► raw JSON-RPC
//! ```
//!
//! # Design Decisions
//! - Runtime calls and storage are addressed dynamically by pallet/entry name
//! - One `Service` is cloned into every domain module; clones share the socket
//! - A closed socket is reopened once per call, never more

pub mod account;
pub mod connection;
pub mod decode;
pub mod service;
pub mod types;
pub mod utils;

pub use account::{create_keypair, Account};
pub use connection::Connection;
pub use service::{CallArgs, Service};
pub use types::{ExtrinsicOutcome, RobonomicsError, RobonomicsResult};
pub use utils::ChainUtils;
