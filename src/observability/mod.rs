//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Engine components produce:
//!     → tracing events (retry decisions, sample clamping, findings)
//!     → metrics.rs (counters and histograms)
//!
//! Consumers:
//!     → logging.rs subscriber installed by the binary (or the host runner)
//!     → Prometheus recorder rendered on demand
//! ```
//!
//! # Design Decisions
//! - The library never installs a subscriber or recorder on its own
//! - Without a recorder, metric updates are no-ops
//! - Errors are returned to the caller, never only logged

pub mod logging;
pub mod metrics;
