//! Item kinds and containment rules

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of an [`Item`](crate::Item)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Container of actions and menus
    Menu,

    /// Context-menu entry owning one or more profiles
    Action,

    /// Leaf carrying the command and its conditions
    Profile,
}

impl ItemKind {
    /// All kinds, base containers first
    pub const ALL: [ItemKind; 3] = [ItemKind::Menu, ItemKind::Action, ItemKind::Profile];

    /// Lowercase name used in dumps and logs
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Menu => "menu",
            Self::Action => "action",
            Self::Profile => "profile",
        }
    }

    /// Type name as shown by tree dumps
    #[inline]
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Menu => "Menu",
            Self::Action => "Action",
            Self::Profile => "Profile",
        }
    }

    /// Whether an item of this kind may own a child of `child` kind
    ///
    /// Profiles live only under actions; actions and menus live only
    /// under menus. Profiles never own anything.
    #[inline]
    #[must_use]
    pub const fn can_contain(self, child: ItemKind) -> bool {
        matches!(
            (self, child),
            (Self::Action, Self::Profile) | (Self::Menu, Self::Action | Self::Menu)
        )
    }

    /// Whether items of this kind own children at all
    #[inline]
    #[must_use]
    pub const fn is_container(self) -> bool {
        !matches!(self, Self::Profile)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "menu" => Ok(Self::Menu),
            "action" => Ok(Self::Action),
            "profile" => Ok(Self::Profile),
            other => Err(format!("unknown item kind: {other}")),
        }
    }
}
