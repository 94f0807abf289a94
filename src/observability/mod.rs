//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters via the `metrics` facade)
//!
//! Consumers:
//!     → stderr (human or JSON format)
//!     → whatever metrics recorder the embedding application installs
//! ```
//!
//! # Design Decisions
//! - Library code only emits; the CLI is the one place that installs a subscriber
//! - No recorder is installed here, so metrics are free when unused

pub mod logging;
pub mod metrics;
