//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → CLI flags override individual fields
//!     → shared by Account, Connection and Service
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults so no file is needed for the public endpoint
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::ClientConfig;
pub use schema::ExtrinsicConfig;
pub use schema::IpfsConfig;
pub use schema::NodeConfig;
pub use schema::ObservabilityConfig;
pub use schema::SubscriberConfig;
