//! Chain event subscription.
//!
//! # Data Flow
//! ```text
//! new best block ──► events of the block ──► kind filter ──► target filter
//!                                                                 │
//!                          mpsc::Receiver<ChainEvent> ◄───────────┘
//! ```

pub mod filter;
pub mod kinds;
pub mod subscriber;

pub use kinds::{AttributeKind, SubEvent};
pub use subscriber::{ChainEvent, Subscriber};
