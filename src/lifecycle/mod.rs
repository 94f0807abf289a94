//! Task lifecycle.
//!
//! # Data Flow
//! ```text
//! Ctrl-C (signals.rs) ──► Shutdown::trigger (shutdown.rs)
//!                              │
//!            storage watches, event subscribers stop
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
