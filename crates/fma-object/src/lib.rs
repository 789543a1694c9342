//! FMA Item Model
//!
//! Tree of configurable context-menu items with origin tracking and a
//! declarative field registry.
//!
//! # Core Concepts
//!
//! - [`Item`]: `Menu | Action | Profile` tagged union
//! - [`Duplicable`]: origin snapshot, `check_status`, validity rules
//! - [`FieldSet`]: field values driven by the [`data`] registry
//! - [`count_items`], [`dump_tree`], [`build_hierarchy`]: tree helpers
//!
//! # Example
//!
//! ```rust,ignore
//! use fma_object::{Action, Duplicable, Item, Profile};
//!
//! let mut item = Item::Action(
//!     Action::new()
//!         .with_label("Open terminal here")
//!         .with_profile(Profile::new("profile-1").with_path("/usr/bin/xterm")),
//! );
//! item.rebaseline_tree();
//!
//! item.set_label("Open a terminal");
//! item.check_status();
//! assert!(item.is_modified());
//! ```

#![warn(unreachable_pub)]

pub mod data;
mod action;
mod duplicable;
mod error;
mod fields;
mod item;
mod kind;
mod menu;
mod profile;
mod tree;

// Re-exports
pub use action::{Action, DEFAULT_ACTION_LABEL};
pub use data::{DataDef, DataType, DataValue, DefaultValue, CURRENT_VERSION};
pub use duplicable::{Duplicable, Status};
pub use error::{ObjectError, Result, ValidityError};
pub use fields::FieldSet;
pub use item::{Item, COPY_LABEL_PREFIX};
pub use kind::ItemKind;
pub use menu::{Menu, DEFAULT_MENU_LABEL};
pub use profile::{Profile, DEFAULT_PROFILE_LABEL, LEGACY_PROFILE_ID, PROFILE_ID_PREFIX};
pub use tree::{
    build_hierarchy, check_status_all, count_items, dump_tree, find, find_mut, ItemCounts,
    TreeDump, TreeLines,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
