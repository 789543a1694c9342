//! Key layout of the flat registry
//!
//! ```text
//! <root>/<uuid>/type            "Action" | "Menu" (absent: Action)
//! <root>/<uuid>/<key>           menu and action fields
//! <root>/<uuid>/<profile>/<key> profile fields
//! ```
//!
//! Field keys come from the registry's `gconf_key`, with two
//! exceptions: a profile label is stored under `desc-name`, and the
//! profile file type is split into the `isfile` / `isdir` flags.

use fma_object::data::names;
use fma_object::{DataDef, DataValue, ItemKind};

/// Default root of the configurations
pub const DEFAULT_ROOT: &str = "/apps/nautilus-actions/configurations";

/// Key holding the item type
pub const TYPE_KEY: &str = "type";

/// Type value of actions
pub const TYPE_ACTION: &str = "Action";

/// Type value of menus
pub const TYPE_MENU: &str = "Menu";

/// Key of the profile label
pub const PROFILE_LABEL_KEY: &str = "desc-name";

/// Key of the "applies to files" flag
pub const ISFILE_KEY: &str = "isfile";

/// Key of the "applies to directories" flag
pub const ISDIR_KEY: &str = "isdir";

/// Version written by single-profile records without a version key
pub const LEGACY_VERSION: &str = "1.0";

/// Join a directory and a key
#[must_use]
pub fn join(dir: &str, key: &str) -> String {
    format!("{}/{key}", dir.trim_end_matches('/'))
}

/// Last component of a path
#[must_use]
pub fn basename(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
}

/// Registry key of a field, if it is stored under a single key
#[must_use]
pub fn field_key(kind: ItemKind, def: &DataDef) -> Option<&'static str> {
    match (kind, def.name) {
        (ItemKind::Profile, names::LABEL) => Some(PROFILE_LABEL_KEY),
        _ => def.gconf_key,
    }
}

/// Type value stored for a kind
#[must_use]
pub fn type_value(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Menu => TYPE_MENU,
        _ => TYPE_ACTION,
    }
}

/// Encode a field into `(key, value)` pairs
///
/// The id is never stored as a key: it is the record's directory name.
#[must_use]
pub fn encode(kind: ItemKind, def: &DataDef, value: &DataValue) -> Vec<(&'static str, DataValue)> {
    if def.name == names::ID {
        return Vec::new();
    }
    if kind == ItemKind::Profile && def.name == names::FILE_TYPE {
        let file_type = value.as_str().unwrap_or("file");
        return vec![
            (ISFILE_KEY, DataValue::Bool(file_type != "dir")),
            (ISDIR_KEY, DataValue::Bool(file_type != "file")),
        ];
    }
    field_key(kind, def)
        .map(|key| vec![(key, value.clone())])
        .unwrap_or_default()
}

/// Decode a field from a key lookup
///
/// Returns `None` when the record carries no key for the field.
pub fn decode<F>(kind: ItemKind, def: &DataDef, lookup: F) -> Option<DataValue>
where
    F: Fn(&str) -> Option<DataValue>,
{
    if kind == ItemKind::Profile && def.name == names::FILE_TYPE {
        let isfile = lookup(ISFILE_KEY).and_then(|v| v.as_bool());
        let isdir = lookup(ISDIR_KEY).and_then(|v| v.as_bool());
        if isfile.is_none() && isdir.is_none() {
            return None;
        }
        let value = match (isfile.unwrap_or(true), isdir.unwrap_or(false)) {
            (true, true) => "both",
            (false, true) => "dir",
            _ => "file",
        };
        return Some(DataValue::from(value));
    }
    field_key(kind, def).and_then(lookup)
}
