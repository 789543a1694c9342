//! Storage provider contract

use crate::error::ProviderError;
use crate::events::ChangeSender;
use crate::export::{Exporter, Importer};
use fma_object::{Item, ItemKind};

/// Items enumerated by a provider, plus what was skipped
#[derive(Debug, Clone, Default)]
pub struct ReadOutcome {
    /// Items read successfully, baselined and tagged with the provider
    pub items: Vec<Item>,

    /// One message per skipped record
    pub messages: Vec<String>,
}

impl ReadOutcome {
    /// Create empty outcome
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a skipped record and log it
    pub fn skip(&mut self, record: &str, reason: impl std::fmt::Display) {
        tracing::warn!(record, %reason, "skipping unreadable record");
        self.messages.push(format!("{record}: {reason}"));
    }

    /// Add an item read from provider `provider_id`
    ///
    /// Tags it with the provider, takes its origin snapshot and
    /// refreshes its status.
    pub fn push(&mut self, mut item: Item, provider_id: &str) {
        item.set_provider(Some(provider_id.to_string()));
        item.rebaseline_tree();
        self.items.push(item);
    }

    /// Whether every record was read
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.messages.is_empty()
    }
}

/// A storage backend
///
/// `read_items` must skip corrupt records rather than fail, and must
/// migrate legacy single-profile actions inline.
pub trait IoProvider {
    /// Stable provider id
    fn id(&self) -> &str;

    /// Display name
    fn name(&self) -> &str {
        self.id()
    }

    /// Interface version implemented
    fn version(&self) -> u32 {
        1
    }

    /// Whether the provider accepts writes at all
    fn is_willing_to_write(&self) -> bool;

    /// Whether `item` may be written by this provider
    fn is_writable(&self, item: &Item) -> bool;

    /// Enumerate every item, skipping records that cannot be read
    fn read_items(&mut self) -> ReadOutcome;

    /// Persist a menu or action, with the profiles of an action
    ///
    /// # Errors
    ///
    /// [`ProviderError::Program`] for a bare profile,
    /// [`ProviderError::Write`] on backend failure.
    fn write_item(&mut self, item: &Item) -> Result<(), ProviderError>;

    /// Remove a menu or action from storage
    ///
    /// # Errors
    ///
    /// [`ProviderError::Program`] for a bare profile,
    /// [`ProviderError::Write`] on backend failure.
    fn delete_item(&mut self, item: &Item) -> Result<(), ProviderError>;

    /// Receive the handle used to raise change events
    fn set_change_sender(&mut self, _sender: ChangeSender) {}

    /// Poll storage for external changes and raise events
    ///
    /// Backends with native notification do nothing here.
    fn check_for_changes(&mut self) {}

    /// Export capability, if any
    fn exporter(&self) -> Option<&dyn Exporter> {
        None
    }

    /// Import capability, if any
    fn importer(&self) -> Option<&dyn Importer> {
        None
    }
}

/// Reject profiles passed where a menu or action is expected
///
/// # Errors
///
/// Returns [`ProviderError::Program`] for a profile.
pub fn ensure_top_level(item: &Item) -> Result<(), ProviderError> {
    if item.kind() == ItemKind::Profile {
        return Err(ProviderError::program(format!(
            "profile '{}' cannot be stored on its own",
            item.id()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fma_object::{Action, Duplicable, Profile};

    #[test]
    fn read_outcome_push_baselines() {
        let mut outcome = ReadOutcome::new();
        outcome.push(
            Item::Action(
                Action::with_id("a")
                    .with_label("A")
                    .with_profile(Profile::new("p1")),
            ),
            "desktop",
        );
        let item = &outcome.items[0];
        assert_eq!(item.provider(), Some("desktop"));
        assert!(item.status().origin().is_some());
        assert!(!item.is_modified());
        assert!(outcome.is_clean());
    }

    #[test]
    fn read_outcome_skip_records_message() {
        let mut outcome = ReadOutcome::new();
        outcome.skip("broken.desktop", "missing group");
        assert_eq!(outcome.messages, ["broken.desktop: missing group"]);
        assert!(!outcome.is_clean());
    }

    #[test]
    fn ensure_top_level_rejects_profile() {
        let err = ensure_top_level(&Item::Profile(Profile::new("p"))).unwrap_err();
        assert_eq!(err.status(), crate::IoStatus::ProgramError);
        assert!(ensure_top_level(&Item::Action(Action::with_id("a"))).is_ok());
    }
}
