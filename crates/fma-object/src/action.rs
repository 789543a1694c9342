//! Action: a context-menu entry with one or more profiles

use crate::data::{names, DataValue, CURRENT_VERSION};
use crate::duplicable::{private, validate_label, Duplicable, Status};
use crate::error::ValidityError;
use crate::fields::FieldSet;
use crate::item::Item;
use crate::kind::ItemKind;
use crate::profile::{Profile, PROFILE_ID_PREFIX};

/// Label given to actions created from scratch
pub const DEFAULT_ACTION_LABEL: &str = "New action";

/// Context-menu entry
///
/// Owns an ordered sequence of [`Profile`]s; the `items` field mirrors
/// their ids. `readonly` and the owning provider are runtime attributes,
/// never persisted nor compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub(crate) fields: FieldSet,
    pub(crate) status: Status,
    pub(crate) children: Vec<Item>,
    pub(crate) readonly: bool,
    pub(crate) provider: Option<String>,
}

impl Default for Action {
    fn default() -> Self {
        Self::new()
    }
}

impl Action {
    /// Create an action with a fresh UUID, the default label and no profile
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string()).with_label(DEFAULT_ACTION_LABEL)
    }

    /// Create an empty action with the given id
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        let mut fields = FieldSet::new(ItemKind::Action);
        fields.put(names::ID, DataValue::String(id.into()));
        Self::from_fields(fields)
    }

    /// Wrap an already populated field set, without children
    #[must_use]
    pub fn from_fields(fields: FieldSet) -> Self {
        debug_assert_eq!(fields.kind(), ItemKind::Action);
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

    /// Append a profile
    #[must_use]
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.attach_profile(profile);
        self
    }

    /// Action UUID
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        self.fields.string(names::ID)
    }

    /// Action label
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        self.fields.string(names::LABEL)
    }

    /// Schema version the action was read with
    #[inline]
    #[must_use]
    pub fn version(&self) -> &str {
        self.fields.string(names::VERSION)
    }

    /// Whether the action was read from a legacy single-profile record
    #[must_use]
    pub fn is_legacy(&self) -> bool {
        self.version() != CURRENT_VERSION
    }

    /// Label to display in the toolbar
    ///
    /// The main label when the same-label flag is set.
    #[must_use]
    pub fn effective_toolbar_label(&self) -> &str {
        if self.fields.boolean(names::TOOLBAR_SAME_LABEL) {
            self.label()
        } else {
            self.fields.string(names::TOOLBAR_LABEL)
        }
    }

    /// Iterate profiles in order
    pub fn profiles(&self) -> impl Iterator<Item = &Profile> {
        self.children.iter().filter_map(Item::as_profile)
    }

    /// Number of profiles
    #[inline]
    #[must_use]
    pub fn profile_count(&self) -> usize {
        self.children.len()
    }

    /// Find a profile by id
    #[must_use]
    pub fn profile(&self, id: &str) -> Option<&Profile> {
        self.profiles().find(|p| p.id() == id)
    }

    /// Find a profile by id, mutably
    pub fn profile_mut(&mut self, id: &str) -> Option<&mut Profile> {
        self.children
            .iter_mut()
            .filter_map(Item::as_profile_mut)
            .find(|p| p.id() == id)
    }

    /// Append a profile
    pub fn attach_profile(&mut self, profile: Profile) {
        self.children.push(Item::Profile(profile));
        self.rebuild_items_list();
    }

    /// Generate a profile id not yet used by this action
    #[must_use]
    pub fn new_profile_id(&self) -> String {
        (1..)
            .map(|n| format!("{PROFILE_ID_PREFIX}{n}"))
            .find(|candidate| self.profile(candidate).is_none())
            .unwrap_or_else(|| format!("{PROFILE_ID_PREFIX}{}", uuid::Uuid::new_v4()))
    }

    /// Whether the owning provider reported the action as read-only
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

impl private::Sealed for Action {}

impl Duplicable for Action {
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
        validate_label(&self.fields)?;
        if self.profiles().next().is_none() {
            return Err(ValidityError::NoProfile);
        }
        Ok(())
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
    fn action_new_has_uuid() {
        let a = Action::new();
        let b = Action::new();
        assert_ne!(a.id(), b.id());
        assert!(uuid::Uuid::parse_str(a.id()).is_ok());
        assert_eq!(a.label(), DEFAULT_ACTION_LABEL);
        assert_eq!(a.version(), CURRENT_VERSION);
    }

    #[test]
    fn action_validity() {
        let empty_label = Action::with_id("a").with_profile(Profile::new("p1"));
        assert_eq!(empty_label.validate(), Err(ValidityError::EmptyLabel));

        let no_profile = Action::with_id("a").with_label("X");
        assert_eq!(no_profile.validate(), Err(ValidityError::NoProfile));

        let ok = Action::with_id("a")
            .with_label("X")
            .with_profile(Profile::new("p1"));
        assert!(ok.is_valid());
    }

    #[test]
    fn action_items_list_follows_profiles() {
        let action = Action::with_id("a")
            .with_profile(Profile::new("p1"))
            .with_profile(Profile::new("p2"));
        assert_eq!(action.fields().list(names::ITEMS), ["p1", "p2"]);
    }

    #[test]
    fn action_new_profile_id_skips_used() {
        let action = Action::with_id("a")
            .with_profile(Profile::new("profile-1"))
            .with_profile(Profile::new("profile-2"));
        assert_eq!(action.new_profile_id(), "profile-3");
    }

    #[test]
    fn action_toolbar_label() {
        let mut action = Action::with_id("a").with_label("Open");
        assert_eq!(action.effective_toolbar_label(), "Open");

        action.fields_mut().set(names::TOOLBAR_SAME_LABEL, false).unwrap();
        action.fields_mut().set(names::TOOLBAR_LABEL, "Go").unwrap();
        assert_eq!(action.effective_toolbar_label(), "Go");
    }

    #[test]
    fn action_check_status_recurses() {
        let mut action = Action::with_id("a")
            .with_label("X")
            .with_profile(Profile::new(""));
        action.check_status();
        let profile = action.children[0].as_profile().unwrap();
        assert!(!profile.status().is_valid());
        assert!(action.status().is_valid());
    }
}
