//! Item enum and tree operations

use crate::action::Action;
use crate::data::{names, DataValue};
use crate::duplicable::{private, Duplicable, Status};
use crate::error::{ObjectError, Result, ValidityError};
use crate::fields::FieldSet;
use crate::kind::ItemKind;
use crate::menu::Menu;
use crate::profile::Profile;

/// Prefix added to labels of pasted copies
pub const COPY_LABEL_PREFIX: &str = "Copy of ";

/// Any storable node of the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// Container of actions and menus
    Menu(Menu),

    /// Context-menu entry
    Action(Action),

    /// Command and conditions of an action
    Profile(Profile),
}

impl From<Menu> for Item {
    fn from(menu: Menu) -> Self {
        Self::Menu(menu)
    }
}

impl From<Action> for Item {
    fn from(action: Action) -> Self {
        Self::Action(action)
    }
}

impl From<Profile> for Item {
    fn from(profile: Profile) -> Self {
        Self::Profile(profile)
    }
}

impl Item {
    /// Build an item without children from a field set
    #[must_use]
    pub fn from_fields(fields: FieldSet) -> Self {
        match fields.kind() {
            ItemKind::Menu => Self::Menu(Menu::from_fields(fields)),
            ItemKind::Action => Self::Action(Action::from_fields(fields)),
            ItemKind::Profile => Self::Profile(Profile::from_fields(fields)),
        }
    }

    /// Kind of the item
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Menu(_) => ItemKind::Menu,
            Self::Action(_) => ItemKind::Action,
            Self::Profile(_) => ItemKind::Profile,
        }
    }

    /// Item id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        self.fields().string(names::ID)
    }

    /// Item label
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        self.fields().string(names::LABEL)
    }

    /// Set the id
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.fields_mut().put(names::ID, DataValue::String(id.into()));
    }

    /// Set the label
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.fields_mut()
            .put(names::LABEL, DataValue::String(label.into()));
    }

    /// Borrow as menu
    #[inline]
    #[must_use]
    pub fn as_menu(&self) -> Option<&Menu> {
        match self {
            Self::Menu(m) => Some(m),
            _ => None,
        }
    }

    /// Borrow as action
    #[inline]
    #[must_use]
    pub fn as_action(&self) -> Option<&Action> {
        match self {
            Self::Action(a) => Some(a),
            _ => None,
        }
    }

    /// Borrow as action, mutably
    #[inline]
    pub fn as_action_mut(&mut self) -> Option<&mut Action> {
        match self {
            Self::Action(a) => Some(a),
            _ => None,
        }
    }

    /// Borrow as profile
    #[inline]
    #[must_use]
    pub fn as_profile(&self) -> Option<&Profile> {
        match self {
            Self::Profile(p) => Some(p),
            _ => None,
        }
    }

    /// Borrow as profile, mutably
    #[inline]
    pub fn as_profile_mut(&mut self) -> Option<&mut Profile> {
        match self {
            Self::Profile(p) => Some(p),
            _ => None,
        }
    }

    /// Ordered children; empty for profiles
    #[must_use]
    pub fn children(&self) -> &[Item] {
        match self {
            Self::Menu(m) => &m.children,
            Self::Action(a) => &a.children,
            Self::Profile(_) => &[],
        }
    }

    /// Children, mutably; the sequence itself cannot grow or shrink
    ///
    /// The `items` list is not updated from here: rename a child with
    /// [`Item::set_child_id`].
    pub fn children_mut(&mut self) -> &mut [Item] {
        match self {
            Self::Menu(m) => &mut m.children,
            Self::Action(a) => &mut a.children,
            Self::Profile(_) => &mut [],
        }
    }

    fn container_mut(&mut self) -> Option<(&mut Vec<Item>, &mut FieldSet)> {
        match self {
            Self::Menu(m) => Some((&mut m.children, &mut m.fields)),
            Self::Action(a) => Some((&mut a.children, &mut a.fields)),
            Self::Profile(_) => None,
        }
    }

    /// Insert a child at `position`
    ///
    /// A negative or out-of-range position appends.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::InvalidOperation`] when the child's kind is
    /// not allowed here; the tree is left unchanged.
    pub fn insert_child(&mut self, child: Item, position: isize) -> Result<()> {
        let parent = self.kind();
        if !parent.can_contain(child.kind()) {
            return Err(ObjectError::InvalidOperation {
                parent,
                child: child.kind(),
            });
        }
        let Some((children, fields)) = self.container_mut() else {
            return Err(ObjectError::InvalidOperation {
                parent,
                child: child.kind(),
            });
        };
        match usize::try_from(position) {
            Ok(index) if index < children.len() => children.insert(index, child),
            _ => children.push(child),
        }
        sync_items_list(children, fields);
        Ok(())
    }

    /// Insert a child before the sibling `before`, or append if absent
    ///
    /// # Errors
    ///
    /// Same as [`Item::insert_child`].
    pub fn insert_before(&mut self, child: Item, before: &str) -> Result<()> {
        let position = self
            .position(before)
            .and_then(|p| isize::try_from(p).ok())
            .unwrap_or(-1);
        self.insert_child(child, position)
    }

    /// Remove and return the child with the given id
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NotFound`] if no direct child has this id.
    pub fn remove_child(&mut self, id: &str) -> Result<Item> {
        let index = self.position(id).ok_or_else(|| ObjectError::not_found(id))?;
        let (children, fields) = self
            .container_mut()
            .ok_or_else(|| ObjectError::not_found(id))?;
        let removed = children.remove(index);
        sync_items_list(children, fields);
        Ok(removed)
    }

    /// Index of the direct child with the given id
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.children().iter().position(|c| c.id() == id)
    }

    /// Index of the direct child with the given id
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NotFound`] if no direct child has this id.
    pub fn get_position(&self, id: &str) -> Result<usize> {
        self.position(id).ok_or_else(|| ObjectError::not_found(id))
    }

    /// Change the id of a direct child, keeping the `items` list in sync
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NotFound`] if no direct child has id `old`.
    pub fn set_child_id(&mut self, old: &str, new: impl Into<String>) -> Result<()> {
        let index = self.position(old).ok_or_else(|| ObjectError::not_found(old))?;
        let (children, fields) = self
            .container_mut()
            .ok_or_else(|| ObjectError::not_found(old))?;
        children[index].set_id(new);
        sync_items_list(children, fields);
        Ok(())
    }

    /// Rewrite the `items` field from the current children
    pub fn rebuild_items_list(&mut self) {
        if let Some((children, fields)) = self.container_mut() {
            sync_items_list(children, fields);
        }
    }

    /// Whether the item is enabled; profiles always are
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.fields()
            .get(names::ENABLED)
            .and_then(DataValue::as_bool)
            .unwrap_or(true)
    }

    /// Enable or disable a menu or action; no-op on profiles
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.kind().is_container() {
            self.fields_mut().put(names::ENABLED, DataValue::Bool(enabled));
        }
    }

    /// Whether the owning provider reported the item as read-only
    #[must_use]
    pub fn is_readonly(&self) -> bool {
        match self {
            Self::Menu(m) => m.readonly,
            Self::Action(a) => a.readonly,
            Self::Profile(_) => false,
        }
    }

    /// Record the provider-computed read-only flag
    ///
    /// Reserved for providers; not a user-editable attribute.
    pub fn mark_readonly(&mut self, readonly: bool) {
        match self {
            Self::Menu(m) => m.readonly = readonly,
            Self::Action(a) => a.readonly = readonly,
            Self::Profile(_) => {}
        }
    }

    /// Id of the owning provider
    #[must_use]
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::Menu(m) => m.provider(),
            Self::Action(a) => a.provider(),
            Self::Profile(_) => None,
        }
    }

    /// Record the owning provider; no-op on profiles
    pub fn set_provider(&mut self, provider: Option<String>) {
        match self {
            Self::Menu(m) => m.provider = provider,
            Self::Action(a) => a.provider = provider,
            Self::Profile(_) => {}
        }
    }

    /// Copy every declared field from `source`; children are untouched
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::KindMismatch`] when kinds differ.
    pub fn copy_from(&mut self, source: &Item) -> Result<()> {
        self.fields_mut().copy_from(source.fields())
    }

    /// Structural equality over comparable fields, children excluded
    #[must_use]
    pub fn are_equal(a: &Item, b: &Item) -> bool {
        a.fields().is_equal(b.fields())
    }

    /// Whether this item or any descendant is modified
    ///
    /// Reads cached flags; run [`Duplicable::check_status`] first.
    #[must_use]
    pub fn any_modified(&self) -> bool {
        self.is_modified() || self.children().iter().any(Item::any_modified)
    }

    /// Take a new origin for the item and every descendant
    pub fn rebaseline_tree(&mut self) {
        for child in self.children_mut() {
            child.rebaseline_tree();
        }
        self.rebaseline();
        self.check_status();
    }

    /// New origin for what a provider stores as one record
    ///
    /// A menu record holds the menu alone; an action record holds the
    /// action and its profiles. Children of a menu keep their origin.
    pub fn rebaseline_record(&mut self) {
        if let Self::Menu(_) = self {
            self.rebaseline();
            self.check_status();
        } else {
            self.rebaseline_tree();
        }
    }

    /// Deep copy whose origin equals its current fields
    #[must_use]
    pub fn duplicate(&self) -> Item {
        let mut copy = self.clone();
        copy.rebaseline_tree();
        copy
    }

    /// Prepare a copy for pasting next to the original
    ///
    /// With `renumber`, menus and actions get a new UUID and every
    /// profile keeps a unique id within its action, and the label is
    /// prefixed with "Copy of ". The copy has no origin and no provider.
    pub fn prepare_for_paste(&mut self, renumber: bool) {
        if renumber {
            if self.kind().is_container() {
                self.set_id(uuid::Uuid::new_v4().to_string());
            }
            let label = format!("{COPY_LABEL_PREFIX}{}", self.label());
            self.set_label(label);
        }
        self.set_provider(None);
        self.mark_readonly(false);
        *self.status_mut() = Status::default();
        for child in self.children_mut() {
            if child.kind().is_container() {
                child.prepare_for_paste(renumber);
            } else {
                *child.status_mut() = Status::default();
            }
        }
        // a flat item keeps its stored items list
        if !self.children().is_empty() {
            self.rebuild_items_list();
        }
    }

    /// Paste a profile into this action under an id unique within it
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::InvalidOperation`] unless `self` is an
    /// action and `profile` a profile.
    pub fn paste_profile(&mut self, mut profile: Item, renumber: bool) -> Result<()> {
        let Some(action) = self.as_action() else {
            return Err(ObjectError::InvalidOperation {
                parent: self.kind(),
                child: profile.kind(),
            });
        };
        if renumber || action.profile(profile.id()).is_some() {
            let id = action.new_profile_id();
            profile.set_id(id);
        }
        profile.prepare_for_paste(renumber);
        self.insert_child(profile, -1)
    }

    /// Trace every field of the item at debug level
    pub fn dump(&self) {
        tracing::debug!(kind = %self.kind(), id = self.id(), "dump");
        for (def, value) in self.fields().iter() {
            tracing::debug!("  {} = {value}", def.name);
        }
        tracing::debug!(
            readonly = self.is_readonly(),
            provider = self.provider().unwrap_or("-"),
            modified = self.status().is_modified(),
            valid = self.status().is_valid(),
            "  runtime"
        );
    }
}

fn sync_items_list(children: &[Item], fields: &mut FieldSet) {
    let ids = children.iter().map(|c| c.id().to_string()).collect();
    fields.put(names::ITEMS, DataValue::StringList(ids));
}

impl private::Sealed for Item {}

impl Duplicable for Item {
    fn fields(&self) -> &FieldSet {
        match self {
            Self::Menu(m) => m.fields(),
            Self::Action(a) => a.fields(),
            Self::Profile(p) => p.fields(),
        }
    }

    fn fields_mut(&mut self) -> &mut FieldSet {
        match self {
            Self::Menu(m) => m.fields_mut(),
            Self::Action(a) => a.fields_mut(),
            Self::Profile(p) => p.fields_mut(),
        }
    }

    fn status(&self) -> &Status {
        match self {
            Self::Menu(m) => m.status(),
            Self::Action(a) => a.status(),
            Self::Profile(p) => p.status(),
        }
    }

    fn status_mut(&mut self) -> &mut Status {
        match self {
            Self::Menu(m) => m.status_mut(),
            Self::Action(a) => a.status_mut(),
            Self::Profile(p) => p.status_mut(),
        }
    }

    fn validate(&self) -> std::result::Result<(), ValidityError> {
        match self {
            Self::Menu(m) => m.validate(),
            Self::Action(a) => a.validate(),
            Self::Profile(p) => p.validate(),
        }
    }

    fn check_children(&mut self) {
        match self {
            Self::Menu(m) => m.check_children(),
            Self::Action(a) => a.check_children(),
            Self::Profile(p) => p.check_children(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(id: &str) -> Item {
        Item::Action(
            Action::with_id(id)
                .with_label(id)
                .with_profile(Profile::new("p1")),
        )
    }

    #[test]
    fn insert_child_appends_out_of_range() {
        let mut menu = Item::Menu(Menu::with_id("m").with_label("M"));
        menu.insert_child(action("a"), -1).unwrap();
        menu.insert_child(action("b"), 42).unwrap();
        menu.insert_child(action("c"), 0).unwrap();
        let ids: Vec<_> = menu.children().iter().map(Item::id).collect();
        assert_eq!(ids, ["c", "a", "b"]);
        assert_eq!(menu.fields().list(names::ITEMS), ["c", "a", "b"]);
    }

    #[test]
    fn insert_profile_into_menu_fails() {
        let mut menu = Item::Menu(Menu::with_id("m").with_label("M"));
        let before = menu.clone();
        let err = menu
            .insert_child(Item::Profile(Profile::new("p")), 0)
            .unwrap_err();
        assert_eq!(
            err,
            ObjectError::InvalidOperation {
                parent: ItemKind::Menu,
                child: ItemKind::Profile
            }
        );
        assert_eq!(menu, before);
    }

    #[test]
    fn insert_into_profile_fails() {
        let mut profile = Item::Profile(Profile::new("p"));
        let before = profile.clone();
        assert!(profile.insert_child(action("a"), 0).is_err());
        assert_eq!(profile, before);
    }

    #[test]
    fn insert_before_and_remove() {
        let mut menu = Item::Menu(Menu::with_id("m").with_label("M"));
        menu.insert_child(action("a"), -1).unwrap();
        menu.insert_before(action("b"), "a").unwrap();
        assert_eq!(menu.get_position("b"), Ok(0));
        assert_eq!(menu.get_position("a"), Ok(1));

        let removed = menu.remove_child("b").unwrap();
        assert_eq!(removed.id(), "b");
        assert_eq!(menu.get_position("b"), Err(ObjectError::not_found("b")));
        assert_eq!(menu.fields().list(names::ITEMS), ["a"]);
    }

    #[test]
    fn enabled_flag() {
        let mut item = action("a");
        assert!(item.is_enabled());
        item.set_enabled(false);
        assert!(!item.is_enabled());

        let mut profile = Item::Profile(Profile::new("p"));
        profile.set_enabled(false);
        assert!(profile.is_enabled());
    }

    #[test]
    fn readonly_not_compared() {
        let a = action("a");
        let mut b = a.clone();
        b.mark_readonly(true);
        b.set_provider(Some("desktop".into()));
        assert!(Item::are_equal(&a, &b));
    }

    #[test]
    fn duplicate_is_unmodified() {
        let original = action("a");
        let mut copy = original.duplicate();
        copy.check_status();
        assert!(!copy.any_modified());
    }

    #[test]
    fn prepare_for_paste_renumbers() {
        let mut copy = action("a");
        copy.prepare_for_paste(true);
        assert_ne!(copy.id(), "a");
        assert_eq!(copy.label(), "Copy of a");
        assert!(copy.status().origin().is_none());
        assert_eq!(copy.children()[0].id(), "p1");
    }

    #[test]
    fn paste_profile_gets_unique_id() {
        let mut item = action("a");
        item.paste_profile(Item::Profile(Profile::new("p1")), false)
            .unwrap();
        let ids: Vec<_> = item.children().iter().map(Item::id).collect();
        assert_eq!(ids, ["p1", "profile-1"]);
    }

    #[test]
    fn any_modified_walks_children() {
        let mut menu = Item::Menu(Menu::with_id("m").with_label("M"));
        menu.insert_child(action("a"), -1).unwrap();
        menu.rebaseline_tree();
        assert!(!menu.any_modified());

        menu.children_mut()[0].set_label("changed");
        menu.check_status();
        assert!(!menu.is_modified());
        assert!(menu.any_modified());
    }

    #[test]
    fn rebaseline_record_keeps_menu_children_dirty() {
        let mut menu = Item::Menu(Menu::with_id("m").with_label("M"));
        menu.insert_child(action("a"), -1).unwrap();
        menu.rebaseline_tree();

        menu.set_label("Renamed");
        menu.children_mut()[0].set_label("changed");
        menu.check_status();
        menu.rebaseline_record();

        assert!(!menu.is_modified());
        assert!(menu.children()[0].is_modified());
        assert!(menu.any_modified());
    }

    #[test]
    fn rebaseline_record_covers_action_profiles() {
        let mut item = action("a");
        item.rebaseline_tree();
        item.children_mut()[0].set_label("Other");
        item.check_status();
        assert!(item.any_modified());

        item.rebaseline_record();
        assert!(!item.any_modified());
    }

    #[test]
    fn set_child_id_updates_items_list() {
        let mut menu = Item::Menu(Menu::with_id("m").with_label("M"));
        menu.insert_child(action("a"), -1).unwrap();
        menu.insert_child(action("b"), -1).unwrap();

        menu.set_child_id("a", "z").unwrap();
        assert_eq!(menu.children()[0].id(), "z");
        assert_eq!(menu.fields().list(names::ITEMS), ["z", "b"]);
        assert_eq!(menu.set_child_id("a", "y"), Err(ObjectError::not_found("a")));
    }
}
