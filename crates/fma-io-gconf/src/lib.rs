//! FMA Registry Provider
//!
//! Deprecated flat key registry backend. Each item is a directory of
//! keys under a root; each profile a subdirectory of its action.
//!
//! # Core Concepts
//!
//! - [`KeyStore`]: read/write contract of the registry
//! - [`MemoryStore`]: shared in-memory store with per-key watchers and
//!   JSON snapshots
//! - [`GConfProvider`]: [`fma_io::IoProvider`] over a [`KeyStore`]
//! - [`keys`]: key layout shared with the XML dump formats
//!
//! Single-profile records written before profiles existed have no
//! profile subdirectory; reading them synthesizes one profile from the
//! action-level keys.

#![warn(unreachable_pub)]

pub mod keys;
mod provider;
mod store;

// Re-exports
pub use provider::{GConfConfig, GConfProvider, GCONF_PROVIDER_ID};
pub use store::{KeyStore, MemoryStore, StoreError, Watcher};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
