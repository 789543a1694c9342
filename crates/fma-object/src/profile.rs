//! Action profile

use crate::data::{names, DataValue};
use crate::duplicable::{private, validate_label, Duplicable, Status};
use crate::error::{Result, ValidityError};
use crate::fields::FieldSet;
use crate::kind::ItemKind;

/// Label given to profiles created without one
pub const DEFAULT_PROFILE_LABEL: &str = "Default profile";

/// Id of the profile synthesized from a single-profile legacy action
pub const LEGACY_PROFILE_ID: &str = "profile-main";

/// Prefix of generated profile ids
pub const PROFILE_ID_PREFIX: &str = "profile-";

/// Command and conditions of an action
///
/// Owned by exactly one [`Action`](crate::Action).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    fields: FieldSet,
    status: Status,
}

impl Profile {
    /// Create a profile with the default label
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let mut fields = FieldSet::new(ItemKind::Profile);
        fields.put(names::ID, DataValue::String(id.into()));
        fields.put(names::LABEL, DataValue::from(DEFAULT_PROFILE_LABEL));
        Self::from_fields(fields)
    }

    /// Wrap an already populated field set
    ///
    /// The caller guarantees `fields` was built for [`ItemKind::Profile`].
    #[must_use]
    pub fn from_fields(fields: FieldSet) -> Self {
        debug_assert_eq!(fields.kind(), ItemKind::Profile);
        Self {
            fields,
            status: Status::default(),
        }
    }

    /// Set the label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.fields.put(names::LABEL, DataValue::String(label.into()));
        self
    }

    /// Set the command path
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.fields.put(names::PATH, DataValue::String(path.into()));
        self
    }

    /// Set the command arguments
    #[must_use]
    pub fn with_parameters(mut self, parameters: impl Into<String>) -> Self {
        self.fields
            .put(names::PARAMETERS, DataValue::String(parameters.into()));
        self
    }

    /// Profile id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        self.fields.string(names::ID)
    }

    /// Profile label
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        self.fields.string(names::LABEL)
    }

    /// Command path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        self.fields.string(names::PATH)
    }

    /// Command arguments
    #[inline]
    #[must_use]
    pub fn parameters(&self) -> &str {
        self.fields.string(names::PARAMETERS)
    }

    /// Basename patterns
    #[inline]
    #[must_use]
    pub fn basenames(&self) -> &[String] {
        self.fields.list(names::BASENAMES)
    }

    /// URI schemes
    #[inline]
    #[must_use]
    pub fn schemes(&self) -> &[String] {
        self.fields.list(names::SCHEMES)
    }

    /// Folder filters
    #[inline]
    #[must_use]
    pub fn folders(&self) -> &[String] {
        self.fields.list(names::FOLDERS)
    }

    /// Set the profile id
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.fields.put(names::ID, DataValue::String(id.into()));
    }

    /// Add or remove a URI scheme
    ///
    /// Selecting a scheme already present, or deselecting one that is
    /// absent, is a no-op.
    pub fn set_scheme(&mut self, scheme: &str, selected: bool) {
        let mut schemes = self.schemes().to_vec();
        let present = schemes.iter().any(|s| s == scheme);
        match (selected, present) {
            (true, false) => schemes.push(scheme.to_string()),
            (false, true) => schemes.retain(|s| s != scheme),
            _ => return,
        }
        self.fields.put(names::SCHEMES, DataValue::StringList(schemes));
    }

    /// Replace a folder filter by another one
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NotFound`](crate::ObjectError::NotFound)
    /// if `old` is not a folder filter of this profile.
    pub fn replace_folder(&mut self, old: &str, new: impl Into<String>) -> Result<()> {
        let mut folders = self.folders().to_vec();
        let slot = folders
            .iter_mut()
            .find(|f| f.as_str() == old)
            .ok_or_else(|| crate::ObjectError::not_found(old))?;
        *slot = new.into();
        self.fields.put(names::FOLDERS, DataValue::StringList(folders));
        Ok(())
    }
}

impl private::Sealed for Profile {}

impl Duplicable for Profile {
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

    fn validate(&self) -> std::result::Result<(), ValidityError> {
        validate_label(&self.fields)?;
        if self.id().trim().is_empty() {
            return Err(ValidityError::EmptyId);
        }
        Ok(())
    }
}
