//! Robonomics network client library.

pub mod chain;
pub mod config;
pub mod encoding;
pub mod events;
pub mod ipfs;
pub mod lifecycle;
pub mod modules;
pub mod observability;
pub mod resilience;

pub use chain::{Account, ChainUtils, ExtrinsicOutcome, RobonomicsError, RobonomicsResult, Service};
pub use config::ClientConfig;
pub use lifecycle::Shutdown;
