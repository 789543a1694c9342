//! FMA Pivot
//!
//! Aggregates the items of every registered provider into one tree and
//! keeps it current as backends report external changes.
//!
//! # Core Concepts
//!
//! - [`Pivot`]: ordered provider registry, merged item tree,
//!   writability checks, write/delete/import/export routing
//! - [`Debouncer`]: coalesces bursts of change events into one reload
//! - [`Clock`]: monotonic time, [`ManualClock`] for tests
//! - [`PivotConfig`]: TOML configuration, per-provider locks
//! - [`PivotConsumer`]: told once per reload
//!
//! # Example
//!
//! ```rust,ignore
//! use fma_pivot::{Pivot, PivotConfig, SystemClock};
//! use std::sync::Arc;
//!
//! let mut pivot = Pivot::new(PivotConfig::load(path)?, providers, Arc::new(SystemClock::new()));
//! loop {
//!     pivot.check_providers();
//!     pivot.poll();
//!     // sleep until pivot.next_deadline(), or a short tick when idle
//! }
//! ```

#![warn(unreachable_pub)]

mod clock;
mod config;
mod debounce;
mod error;
mod pivot;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock, TimePoint};
pub use config::{PivotConfig, ProviderConfig};
pub use debounce::{Debouncer, DEFAULT_DELAY, DEFAULT_QUIET_WINDOW};
pub use error::{PivotError, Result};
pub use pivot::{ImportOutcome, Pivot, PivotConsumer};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
