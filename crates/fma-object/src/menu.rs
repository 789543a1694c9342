//! Menu: a container of actions and submenus

use crate::data::{names, DataValue};
use crate::duplicable::{private, validate_label, Duplicable, Status};
use crate::error::ValidityError;
use crate::fields::FieldSet;
use crate::item::Item;
use crate::kind::ItemKind;

/// Label given to menus created from scratch
pub const DEFAULT_MENU_LABEL: &str = "New menu";

/// Container of actions and menus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub(crate) fields: FieldSet,
    pub(crate) status: Status,
    pub(crate) children: Vec<Item>,
    pub(crate) readonly: bool,
    pub(crate) provider: Option<String>,
}

impl Default for Menu {
    fn default() -> Self {
        Self::new()
    }
}

impl Menu {
    /// Create a menu with a fresh UUID and the default label
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string()).with_label(DEFAULT_MENU_LABEL)
    }

    /// Create an empty menu with the given id
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        let mut fields = FieldSet::new(ItemKind::Menu);
        fields.put(names::ID, DataValue::String(id.into()));
        Self::from_fields(fields)
    }

    /// Wrap an already populated field set, without children
    #[must_use]
    pub fn from_fields(fields: FieldSet) -> Self {
        debug_assert_eq!(fields.kind(), ItemKind::Menu);
        Self {
            fields,
            status: Status::default(),
            children: Vec::new(),
            readonly: false,
            provider: None,
        }
    }

    /// Set the label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.fields.put(names::LABEL, DataValue::String(label.into()));
        self
    }

    /// Menu id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        self.fields.string(names::ID)
    }

    /// Menu label
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        self.fields.string(names::LABEL)
    }

    /// Ids of the children as last persisted or rebuilt
    #[inline]
    #[must_use]
    pub fn items_list(&self) -> &[String] {
        self.fields.list(names::ITEMS)
    }

    /// Whether the owning provider reported the menu as read-only
    #[inline]
    #[must_use]
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Id of the owning provider
    #[inline]
    #[must_use]
    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Rewrite the `items` field from the current children
    pub fn rebuild_items_list(&mut self) {
        let ids = self.children.iter().map(|c| c.id().to_string()).collect();
        self.fields.put(names::ITEMS, DataValue::StringList(ids));
    }
}

impl private::Sealed for Menu {}

impl Duplicable for Menu {
    fn fields(&self) -> &FieldSet {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut FieldSet {
        &mut self.fields
    }

    fn status(&self) -> &Status {
        &self.status
    }

    fn status_mut(&mut self) -> &mut Status {
        &mut self.status
    }

    fn validate(&self) -> Result<(), ValidityError> {
        validate_label(&self.fields)
    }

    fn check_children(&mut self) {
        for child in &mut self.children {
            child.check_status();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_new_is_valid() {
        let menu = Menu::new();
        assert_eq!(menu.label(), DEFAULT_MENU_LABEL);
        assert!(menu.is_valid());
    }

    #[test]
    fn menu_empty_label_invalid() {
        let menu = Menu::with_id("m");
        assert_eq!(menu.validate(), Err(ValidityError::EmptyLabel));
    }

    #[test]
    fn menu_not_modified_by_child_edit() {
        let mut menu = Menu::with_id("m").with_label("M");
        menu.children.push(Item::Action(crate::Action::with_id("a").with_label("A")));
        menu.rebuild_items_list();
        menu.rebaseline();
        menu.children[0].rebaseline();

        menu.children[0].fields_mut().set(names::LABEL, "B").unwrap();
        menu.check_status();

        assert!(menu.children[0].is_modified());
        assert!(!menu.is_modified());
    }
}
