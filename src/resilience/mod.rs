//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to node:
//!     → reconnect.rs (ensure socket, on closed socket reopen + retry once)
//!
//! Event subscription dropped:
//!     → backoff.rs (jittered delay before resubscribing)
//! ```
//!
//! # Design Decisions
//! - Exactly one retry, and only for closed sockets; extrinsics are not
//!   idempotent so any other failure goes straight back to the caller
//! - Resubscribing is unbounded but delayed with capped backoff

pub mod backoff;
pub mod reconnect;
