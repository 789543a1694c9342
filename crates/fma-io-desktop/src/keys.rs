//! Desktop entry layout
//!
//! ```text
//! <id>.desktop
//!   [Desktop Entry]            Type=Action|Menu, menu and action keys
//!   [X-Action-Profile <pid>]   profile keys, one group per profile
//! ```
//!
//! Field keys come from the registry's `desktop_key`. The enabled flag
//! is stored inverted, as `NoDisplay`.

use crate::keyfile::{KeyFile, KeyFileError};
use fma_object::data::names;
use fma_object::{DataDef, DataType, DataValue, ItemKind};
use std::path::Path;

/// Main group
pub const DESKTOP_GROUP: &str = "Desktop Entry";

/// Prefix of profile group names
pub const PROFILE_GROUP_PREFIX: &str = "X-Action-Profile";

/// Key holding the item type
pub const TYPE_KEY: &str = "Type";

/// Type value of actions
pub const TYPE_ACTION: &str = "Action";

/// Type value of menus
pub const TYPE_MENU: &str = "Menu";

/// File suffix
pub const DESKTOP_SUFFIX: &str = ".desktop";

/// Group name of a profile
#[must_use]
pub fn profile_group(profile_id: &str) -> String {
    format!("{PROFILE_GROUP_PREFIX} {profile_id}")
}

/// Profile id of a group name, if it is a profile group
#[must_use]
pub fn group_profile_id(group: &str) -> Option<&str> {
    let id = group.strip_prefix(PROFILE_GROUP_PREFIX)?.trim();
    (!id.is_empty()).then_some(id)
}

/// Item id of a file: its name minus the suffix
#[must_use]
pub fn id_from_path(path: &Path) -> Option<&str> {
    path.file_name()?
        .to_str()?
        .strip_suffix(DESKTOP_SUFFIX)
        .filter(|id| !id.is_empty())
}

/// File name of an item
#[must_use]
pub fn file_name(id: &str) -> String {
    format!("{id}{DESKTOP_SUFFIX}")
}

/// Type value stored for a kind
#[must_use]
pub fn type_value(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Menu => TYPE_MENU,
        _ => TYPE_ACTION,
    }
}

/// Decode a field from a group
///
/// Returns `Ok(None)` when the group carries no key for the field.
///
/// # Errors
///
/// [`KeyFileError::InvalidBool`] for a malformed boolean.
pub fn decode(
    file: &KeyFile,
    group: &str,
    def: &DataDef,
    locale: Option<&str>,
) -> Result<Option<DataValue>, KeyFileError> {
    let Some(key) = def.desktop_key else {
        return Ok(None);
    };
    let value = match def.data_type {
        DataType::Bool if def.name == names::ENABLED => {
            file.get_bool(group, key)?.map(|hidden| DataValue::Bool(!hidden))
        }
        DataType::Bool => file.get_bool(group, key)?.map(DataValue::Bool),
        DataType::LocaleString => file
            .get_locale_string(group, key, locale)
            .map(DataValue::String),
        DataType::String | DataType::Enum(_) => file.get_string(group, key).map(DataValue::String),
        DataType::StringList => file.get_list(group, key).map(DataValue::StringList),
    };
    Ok(value)
}

/// Encode a field into a group
///
/// Fields without a desktop key are not stored. Translatable strings
/// go to the `locale` translation when one is given.
pub fn encode(
    file: &mut KeyFile,
    group: &str,
    def: &DataDef,
    value: &DataValue,
    locale: Option<&str>,
) {
    let Some(key) = def.desktop_key else {
        return;
    };
    match value {
        DataValue::Bool(enabled) if def.name == names::ENABLED => {
            file.set_bool(group, key, !enabled);
        }
        DataValue::Bool(b) => file.set_bool(group, key, *b),
        DataValue::String(s) if matches!(def.data_type, DataType::LocaleString) => {
            file.set_locale_string(group, key, locale, s);
        }
        DataValue::String(s) => file.set_string(group, key, s),
        DataValue::StringList(list) => file.set_list(group, key, list),
    }
}
