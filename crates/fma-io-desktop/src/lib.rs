//! FMA Desktop Entry Provider
//!
//! Stores each menu or action as a `<id>.desktop` key file; profiles
//! are `[X-Action-Profile <id>]` groups of their action's file.
//!
//! # Core Concepts
//!
//! - [`KeyFile`]: comment-preserving key-file codec
//! - [`DesktopProvider`]: [`fma_io::IoProvider`] over a user directory
//!   and read-only system directories
//! - [`keys`]: file layout and field key mapping
//!
//! # Example
//!
//! ```rust,ignore
//! use fma_io::IoProvider;
//! use fma_io_desktop::{DesktopConfig, DesktopProvider};
//!
//! let mut provider = DesktopProvider::new(
//!     DesktopConfig::default()
//!         .with_user_dir("/home/me/.local/share/file-manager/actions")
//!         .with_system_dir("/usr/share/file-manager/actions"),
//! );
//! let outcome = provider.read_items();
//! for message in &outcome.messages {
//!     eprintln!("skipped {message}");
//! }
//! ```

#![warn(unreachable_pub)]

mod error;
mod keyfile;
pub mod keys;
mod provider;

// Re-exports
pub use error::{DesktopError, Result};
pub use keyfile::{KeyFile, KeyFileError};
pub use provider::{DesktopConfig, DesktopProvider, DESKTOP_PROVIDER_ID};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
