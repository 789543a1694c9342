//! Origin tracking and validity
//!
//! Every item keeps an optional `origin` snapshot of its field values,
//! taken when it is loaded and after each successful write. The
//! [`Duplicable::check_status`] walk recomputes the cached `modified`
//! and `valid` flags; nothing else mutates them.
//!
//! A container's `modified` flag reflects only its own fields. Use
//! [`Item::any_modified`](crate::Item::any_modified) to find out whether
//! anything below it changed.

use crate::error::ValidityError;
use crate::fields::FieldSet;

pub(crate) mod private {
    pub trait Sealed {}
}

/// Origin snapshot and cached status flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    origin: Option<FieldSet>,
    modified: bool,
    valid: bool,
}

impl Status {
    /// Origin snapshot, if the item was baselined
    #[inline]
    #[must_use]
    pub fn origin(&self) -> Option<&FieldSet> {
        self.origin.as_ref()
    }

    /// Cached result of the last compare against origin
    #[inline]
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Cached result of the last validity check
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Base validity rule shared by every kind
pub(crate) fn validate_label(fields: &FieldSet) -> Result<(), ValidityError> {
    if fields.string(crate::data::names::LABEL).trim().is_empty() {
        return Err(ValidityError::EmptyLabel);
    }
    Ok(())
}

/// Origin, modification and validity tracking
///
/// Implemented by [`Menu`](crate::Menu), [`Action`](crate::Action),
/// [`Profile`](crate::Profile) and the [`Item`](crate::Item) enum.
pub trait Duplicable: private::Sealed {
    /// Current field values
    fn fields(&self) -> &FieldSet;

    /// Mutable field values
    fn fields_mut(&mut self) -> &mut FieldSet;

    /// Origin and cached flags
    fn status(&self) -> &Status;

    #[doc(hidden)]
    fn status_mut(&mut self) -> &mut Status;

    /// Run the validity rules, base first, stopping at the first failure
    ///
    /// # Errors
    ///
    /// Returns the first failed [`ValidityError`].
    fn validate(&self) -> Result<(), ValidityError>;

    /// Refresh status of the children, if any
    fn check_children(&mut self) {}

    /// Whether the item passes every validity rule
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Cached modification flag
    fn is_modified(&self) -> bool {
        self.status().modified
    }

    /// Recompute `modified` and `valid`, children first
    ///
    /// An item with no origin is new and therefore modified.
    fn check_status(&mut self) {
        self.check_children();

        let modified = self
            .status()
            .origin
            .as_ref()
            .map_or(true, |origin| !origin.is_equal(self.fields()));
        let valid = self.is_valid();

        let status = self.status_mut();
        status.modified = modified;
        status.valid = valid;

        tracing::trace!(
            kind = %self.fields().kind(),
            id = self.fields().string(crate::data::names::ID),
            modified,
            valid,
            "status checked"
        );
    }

    /// Take a new origin snapshot from the current fields
    fn rebaseline(&mut self) {
        let snapshot = self.fields().clone();
        self.status_mut().origin = Some(snapshot);
    }

    /// Copy the origin back onto the fields
    ///
    /// Returns `false` if there is no origin.
    fn restore_origin(&mut self) -> bool {
        let Some(origin) = self.status().origin.clone() else {
            return false;
        };
        self.fields_mut().copy_from(&origin).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::names;
    use crate::Profile;

    #[test]
    fn status_default_not_baselined() {
        let status = Status::default();
        assert!(status.origin().is_none());
        assert!(!status.is_modified());
    }

    #[test]
    fn new_item_is_modified() {
        let mut profile = Profile::new("p1");
        profile.check_status();
        assert!(profile.is_modified());
        assert!(profile.status().is_valid());
    }

    #[test]
    fn modified_tracking_idempotence() {
        let mut profile = Profile::new("p1");
        profile.rebaseline();
        profile.check_status();
        assert!(!profile.is_modified());

        profile.fields_mut().set(names::PATH, "/bin/echo").unwrap();
        profile.check_status();
        assert!(profile.is_modified());

        assert!(profile.restore_origin());
        profile.check_status();
        assert!(!profile.is_modified());
    }

    #[test]
    fn check_status_leaves_origin_untouched() {
        let mut profile = Profile::new("p1");
        profile.rebaseline();
        let origin = profile.status().origin().cloned();
        profile.fields_mut().set(names::PATH, "/bin/echo").unwrap();
        profile.check_status();
        assert_eq!(profile.status().origin().cloned(), origin);
    }

    #[test]
    fn validate_label_trims() {
        let mut fields = FieldSet::new(crate::ItemKind::Menu);
        fields.set(names::LABEL, "   ").unwrap();
        assert_eq!(validate_label(&fields), Err(ValidityError::EmptyLabel));
    }
}
