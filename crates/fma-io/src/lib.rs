//! FMA I/O Provider Protocol
//!
//! Contract implemented by storage backends, and the narrower
//! import/export and field marshaling sub-protocols.
//!
//! # Core Concepts
//!
//! - [`IoProvider`]: enumerate, write, delete, report writability
//! - [`FactoryReader`] / [`FactoryWriter`]: per-record field marshaling
//!   driven by the registry through [`read_fields`] / [`write_fields`]
//! - [`Exporter`] / [`Importer`]: named formats, buffer and file I/O
//! - [`IoStatus`] / [`ProviderError`]: reason codes for failures
//! - [`ChangeSender`]: change events raised by backends

#![warn(unreachable_pub)]

mod error;
mod events;
mod export;
mod factory;
mod provider;

// Re-exports
pub use error::{ExportError, ImportError, IoStatus, ProviderError};
pub use events::{change_channel, ChangeEvent, ChangeSender};
pub use export::{ExportFormat, Exporter, ImportMode, Importer};
pub use factory::{
    defaults_for, read_fields, write_fields, FactoryReader, FactoryWriter,
    FACTORY_PROTOCOL_VERSION,
};
pub use provider::{ensure_top_level, IoProvider, ReadOutcome};

/// Receiving end of the change channel
pub type ChangeReceiver = crossbeam::channel::Receiver<ChangeEvent>;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
