//! Data field registry
//!
//! Declarative per-kind tables of the fields an item carries. Each
//! [`DataDef`] gives the field's semantic type, default value, whether
//! it takes part in structural equality, and the keys the storage
//! backends map it to. Copy, compare and the provider read/write drivers
//! walk these tables, so adding a field is one table entry.
//!
//! Groups are chained from base to most-derived:
//!
//! | kind    | groups                             |
//! |---------|------------------------------------|
//! | menu    | [`ID_GROUP`], [`ITEM_GROUP`], [`MENU_GROUP`]    |
//! | action  | [`ID_GROUP`], [`ITEM_GROUP`], [`ACTION_GROUP`]  |
//! | profile | [`ID_GROUP`], [`PROFILE_GROUP`]                |

use crate::kind::ItemKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Plain string
    String,

    /// Translatable string
    LocaleString,

    /// Boolean flag
    Bool,

    /// List of strings
    StringList,

    /// String restricted to a fixed set of values
    Enum(&'static [&'static str]),
}

impl DataType {
    /// Short name used in error messages
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::LocaleString => "locale string",
            Self::Bool => "boolean",
            Self::StringList => "string list",
            Self::Enum(_) => "enum",
        }
    }

    /// Whether `value` has the right shape for this type
    ///
    /// Enum membership is checked separately.
    #[must_use]
    pub fn accepts(self, value: &DataValue) -> bool {
        matches!(
            (self, value),
            (
                Self::String | Self::LocaleString | Self::Enum(_),
                DataValue::String(_)
            ) | (Self::Bool, DataValue::Bool(_))
                | (Self::StringList, DataValue::StringList(_))
        )
    }
}

/// Boxed field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataValue {
    /// String, locale string or enum value
    String(String),

    /// Boolean value
    Bool(bool),

    /// String list value
    StringList(Vec<String>),
}

impl DataValue {
    /// Borrow as string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as boolean
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow as string list
    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::StringList(l) => Some(l),
            _ => None,
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "'{s}'"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::StringList(l) => write!(f, "[{}]", l.join(",")),
        }
    }
}

impl From<&str> for DataValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for DataValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for DataValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<String>> for DataValue {
    fn from(l: Vec<String>) -> Self {
        Self::StringList(l)
    }
}

/// Compile-time default value of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    /// String default
    Str(&'static str),

    /// Boolean default
    Bool(bool),

    /// String list default
    List(&'static [&'static str]),
}

impl DefaultValue {
    /// Materialize into an owned value
    #[must_use]
    pub fn to_value(self) -> DataValue {
        match self {
            Self::Str(s) => DataValue::String(s.to_string()),
            Self::Bool(b) => DataValue::Bool(b),
            Self::List(l) => DataValue::StringList(l.iter().map(|s| (*s).to_string()).collect()),
        }
    }
}

/// Definition of one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataDef {
    /// Field name, unique within a kind
    pub name: &'static str,

    /// Semantic type
    pub data_type: DataType,

    /// Value used when a reader does not find the field
    pub default: DefaultValue,

    /// Participates in structural equality
    pub comparable: bool,

    /// List order matters for equality
    pub ordered: bool,

    /// A reader logs a warning when the field is missing
    pub mandatory: bool,

    /// Condition list normalised to "match everything" when empty
    pub filter: bool,

    /// Key in the flat key registry backend
    pub gconf_key: Option<&'static str>,

    /// Key in the desktop entry backend
    pub desktop_key: Option<&'static str>,

    /// One-line description
    pub description: &'static str,
}

impl DataDef {
    const fn new(name: &'static str, data_type: DataType, default: DefaultValue) -> Self {
        Self {
            name,
            data_type,
            default,
            comparable: true,
            ordered: false,
            mandatory: false,
            filter: false,
            gconf_key: None,
            desktop_key: None,
            description: "",
        }
    }

    /// String field
    #[must_use]
    pub const fn string(name: &'static str, default: &'static str) -> Self {
        Self::new(name, DataType::String, DefaultValue::Str(default))
    }

    /// Translatable string field
    #[must_use]
    pub const fn locale(name: &'static str, default: &'static str) -> Self {
        Self::new(name, DataType::LocaleString, DefaultValue::Str(default))
    }

    /// Boolean field
    #[must_use]
    pub const fn boolean(name: &'static str, default: bool) -> Self {
        Self::new(name, DataType::Bool, DefaultValue::Bool(default))
    }

    /// String list field
    #[must_use]
    pub const fn list(name: &'static str, default: &'static [&'static str]) -> Self {
        Self::new(name, DataType::StringList, DefaultValue::List(default))
    }

    /// Enum field
    #[must_use]
    pub const fn enumeration(
        name: &'static str,
        values: &'static [&'static str],
        default: &'static str,
    ) -> Self {
        Self::new(name, DataType::Enum(values), DefaultValue::Str(default))
    }

    /// Mark list as order-sensitive
    #[must_use]
    pub const fn ordered(mut self) -> Self {
        self.ordered = true;
        self
    }

    /// Mark field as mandatory for readers
    #[must_use]
    pub const fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// Mark list as a condition filter
    #[must_use]
    pub const fn filter(mut self) -> Self {
        self.filter = true;
        self
    }

    /// Exclude from structural equality
    #[must_use]
    pub const fn not_comparable(mut self) -> Self {
        self.comparable = false;
        self
    }

    /// Set flat registry key
    #[must_use]
    pub const fn gconf(mut self, key: &'static str) -> Self {
        self.gconf_key = Some(key);
        self
    }

    /// Set desktop entry key
    #[must_use]
    pub const fn desktop(mut self, key: &'static str) -> Self {
        self.desktop_key = Some(key);
        self
    }

    /// Set description
    #[must_use]
    pub const fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Default value as an owned value
    #[inline]
    #[must_use]
    pub fn default_value(&self) -> DataValue {
        self.default.to_value()
    }

    /// Whether two values of this field are equal under its compare rule
    ///
    /// Unordered lists compare as sets.
    #[must_use]
    pub fn values_equal(&self, a: &DataValue, b: &DataValue) -> bool {
        match (a, b) {
            (DataValue::StringList(la), DataValue::StringList(lb)) if !self.ordered => {
                let sa: std::collections::BTreeSet<&String> = la.iter().collect();
                let sb: std::collections::BTreeSet<&String> = lb.iter().collect();
                sa == sb
            }
            _ => a == b,
        }
    }

    /// Check a value against the declared type
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::TypeMismatch`](crate::ObjectError::TypeMismatch)
    /// or [`ObjectError::InvalidEnumValue`](crate::ObjectError::InvalidEnumValue).
    pub fn check(&self, value: &DataValue) -> crate::Result<()> {
        if !self.data_type.accepts(value) {
            return Err(crate::ObjectError::TypeMismatch {
                field: self.name.to_string(),
                expected: self.data_type.name(),
            });
        }
        if let (DataType::Enum(allowed), DataValue::String(s)) = (self.data_type, value) {
            if !allowed.contains(&s.as_str()) {
                return Err(crate::ObjectError::InvalidEnumValue {
                    field: self.name.to_string(),
                    value: s.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Field names
pub mod names {
    /// Item or profile identifier
    pub const ID: &str = "id";
    /// Display label
    pub const LABEL: &str = "label";
    /// Tooltip
    pub const TOOLTIP: &str = "tooltip";
    /// Icon name or path
    pub const ICON: &str = "icon";
    /// Enabled flag
    pub const ENABLED: &str = "enabled";
    /// Ordered child ids
    pub const ITEMS: &str = "items";
    /// Schema version
    pub const VERSION: &str = "version";
    /// Shown in the selection context menu
    pub const TARGET_SELECTION: &str = "target-selection";
    /// Shown in the folder background context menu
    pub const TARGET_BACKGROUND: &str = "target-background";
    /// Shown in the toolbar
    pub const TARGET_TOOLBAR: &str = "target-toolbar";
    /// Toolbar uses the main label
    pub const TOOLBAR_SAME_LABEL: &str = "toolbar-same-label";
    /// Toolbar label
    pub const TOOLBAR_LABEL: &str = "toolbar-label";
    /// Command path
    pub const PATH: &str = "path";
    /// Command arguments
    pub const PARAMETERS: &str = "parameters";
    /// Basename patterns
    pub const BASENAMES: &str = "basenames";
    /// Basename match is case sensitive
    pub const MATCHCASE: &str = "matchcase";
    /// Mime type patterns
    pub const MIMETYPES: &str = "mimetypes";
    /// Files, directories or both
    pub const FILE_TYPE: &str = "file-type";
    /// Accepts multiple selected files
    pub const MULTIPLE: &str = "multiple";
    /// URI schemes
    pub const SCHEMES: &str = "schemes";
    /// Folder filters
    pub const FOLDERS: &str = "folders";
    /// Desktop environments the profile is restricted to
    pub const ONLY_SHOW_IN: &str = "only-show-in";
    /// Desktop environments the profile is hidden in
    pub const NOT_SHOW_IN: &str = "not-show-in";
}

/// Current schema version written by providers
pub const CURRENT_VERSION: &str = "2.0";

/// Allowed values of the profile `file-type` field
pub const FILE_TYPES: &[&str] = &["file", "dir", "both"];

/// Fields shared by every kind
pub static ID_GROUP: &[DataDef] = &[
    DataDef::string(names::ID, "").describe("Unique identifier"),
    DataDef::locale(names::LABEL, "")
        .mandatory()
        .gconf("label")
        .desktop("Name")
        .describe("Label displayed in the menu"),
];

/// Fields shared by menus and actions
pub static ITEM_GROUP: &[DataDef] = &[
    DataDef::locale(names::TOOLTIP, "")
        .gconf("tooltip")
        .desktop("Tooltip")
        .describe("Tooltip shown in the status bar"),
    DataDef::string(names::ICON, "")
        .gconf("icon")
        .desktop("Icon")
        .describe("Icon name or path"),
    DataDef::boolean(names::ENABLED, true)
        .gconf("enabled")
        .desktop("NoDisplay")
        .describe("Whether the item is displayed"),
];

/// Fields specific to actions
pub static ACTION_GROUP: &[DataDef] = &[
    DataDef::string(names::VERSION, CURRENT_VERSION)
        .gconf("version")
        .describe("Schema version"),
    DataDef::boolean(names::TARGET_SELECTION, true)
        .gconf("target-selection")
        .desktop("TargetContext")
        .describe("Displayed in the selection context menu"),
    DataDef::boolean(names::TARGET_BACKGROUND, false)
        .gconf("target-background")
        .desktop("TargetLocation")
        .describe("Displayed in the folder background context menu"),
    DataDef::boolean(names::TARGET_TOOLBAR, false)
        .gconf("target-toolbar")
        .desktop("TargetToolbar")
        .describe("Displayed in the toolbar"),
    DataDef::boolean(names::TOOLBAR_SAME_LABEL, true)
        .gconf("toolbar-same-label")
        .desktop("ToolbarSameLabel")
        .describe("Toolbar uses the main label"),
    DataDef::locale(names::TOOLBAR_LABEL, "")
        .gconf("toolbar-label")
        .desktop("ToolbarLabel")
        .describe("Toolbar label"),
    DataDef::list(names::ITEMS, &[])
        .ordered()
        .gconf("items")
        .desktop("Profiles")
        .describe("Ordered profile ids"),
];

/// Fields specific to menus
pub static MENU_GROUP: &[DataDef] = &[DataDef::list(names::ITEMS, &[])
    .ordered()
    .gconf("items")
    .desktop("ItemsList")
    .describe("Ordered child ids")];

/// Fields specific to profiles
pub static PROFILE_GROUP: &[DataDef] = &[
    DataDef::string(names::PATH, "")
        .gconf("path")
        .desktop("Exec")
        .describe("Command path"),
    DataDef::string(names::PARAMETERS, "")
        .gconf("parameters")
        .desktop("Parameters")
        .describe("Command arguments"),
    DataDef::list(names::BASENAMES, &["*"])
        .filter()
        .gconf("basenames")
        .desktop("Basenames")
        .describe("Basename patterns"),
    DataDef::boolean(names::MATCHCASE, true)
        .gconf("matchcase")
        .desktop("Matchcase")
        .describe("Basename match is case sensitive"),
    DataDef::list(names::MIMETYPES, &["*"])
        .filter()
        .gconf("mimetypes")
        .desktop("MimeTypes")
        .describe("Mime type patterns"),
    DataDef::enumeration(names::FILE_TYPE, FILE_TYPES, "file")
        .desktop("FileType")
        .describe("Applies to files, directories or both"),
    DataDef::boolean(names::MULTIPLE, false)
        .gconf("accept-multiple-files")
        .desktop("AcceptMultipleFiles")
        .describe("Accepts a multiple selection"),
    DataDef::list(names::SCHEMES, &["file"])
        .filter()
        .gconf("schemes")
        .desktop("Schemes")
        .describe("URI schemes"),
    DataDef::list(names::FOLDERS, &["/"])
        .filter()
        .gconf("folders")
        .desktop("Folders")
        .describe("Folder filters"),
    DataDef::list(names::ONLY_SHOW_IN, &[])
        .gconf("only-show-in")
        .desktop("OnlyShowIn")
        .describe("Desktop environments the profile is restricted to"),
    DataDef::list(names::NOT_SHOW_IN, &[])
        .gconf("not-show-in")
        .desktop("NotShowIn")
        .describe("Desktop environments the profile is hidden in"),
];

/// Field groups of a kind, base first
#[must_use]
pub fn groups_for(kind: ItemKind) -> [&'static [DataDef]; 3] {
    match kind {
        ItemKind::Menu => [ID_GROUP, ITEM_GROUP, MENU_GROUP],
        ItemKind::Action => [ID_GROUP, ITEM_GROUP, ACTION_GROUP],
        ItemKind::Profile => [ID_GROUP, PROFILE_GROUP, &[]],
    }
}

/// Iterate every field definition of a kind, base first
pub fn defs_for(kind: ItemKind) -> impl Iterator<Item = &'static DataDef> {
    groups_for(kind).into_iter().flat_map(|group| group.iter())
}

/// Find a field definition by name
#[must_use]
pub fn find_def(kind: ItemKind, name: &str) -> Option<&'static DataDef> {
    defs_for(kind).find(|def| def.name == name)
}
