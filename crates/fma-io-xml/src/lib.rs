//! FMA XML Import/Export
//!
//! Exchanges single items as XML documents laid out like the flat
//! registry: either a key/value dump or a schema file.
//!
//! # Core Concepts
//!
//! - [`XmlProvider`]: [`fma_io::Exporter`] and [`fma_io::Importer`],
//!   registered as an [`fma_io::IoProvider`] that stores nothing
//! - [`GCONF_ENTRY`] / [`GCONF_SCHEMA`]: the two format ids
//!
//! Imported items are ready to paste: no provider, not read-only, no
//! origin. Documents describing a single-profile action are migrated
//! the same way the registry backend migrates them.
//!
//! # Example
//!
//! ```rust,ignore
//! use fma_io::{Exporter, Importer};
//! use fma_io_xml::{XmlProvider, GCONF_ENTRY};
//!
//! let xml = XmlProvider::new().to_buffer(&item, GCONF_ENTRY)?;
//! let copy = XmlProvider::new().import_from_buffer(&xml)?;
//! ```

#![warn(unreachable_pub)]

mod dom;
mod format;
mod provider;

// Re-exports
pub use format::{formats, GCONF_ENTRY, GCONF_SCHEMA};
pub use provider::{XmlProvider, XML_PROVIDER_ID};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
