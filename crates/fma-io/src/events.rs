//! Change notifications raised by providers

use crossbeam::channel::{self, Receiver, Sender};
use fma_object::DataValue;

/// One external modification detected by a provider
///
/// Backends that rewrite storage key by key raise one event per key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Id of the provider that saw the change
    pub provider: String,

    /// Id of the item concerned, empty when unknown
    pub id: String,

    /// Profile concerned, if any
    pub profile: Option<String>,

    /// Backend key that changed, if known
    pub key: Option<String>,

    /// New value, if known
    pub value: Option<DataValue>,
}

impl ChangeEvent {
    /// Create event for an item
    pub fn new(provider: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            id: id.into(),
            profile: None,
            key: None,
            value: None,
        }
    }

    /// Set profile
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Set changed key
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set new value
    #[must_use]
    pub fn with_value(mut self, value: DataValue) -> Self {
        self.value = Some(value);
        self
    }
}

/// Handle given to providers to raise change events
#[derive(Debug, Clone)]
pub struct ChangeSender {
    inner: Sender<ChangeEvent>,
}

impl ChangeSender {
    /// Raise a change event
    ///
    /// Events sent after the receiving side is gone are dropped.
    pub fn signal(&self, event: ChangeEvent) {
        tracing::trace!(provider = %event.provider, id = %event.id, key = ?event.key, "change signal");
        if self.inner.send(event).is_err() {
            tracing::debug!("change receiver dropped, ignoring signal");
        }
    }
}

/// Create a connected sender and receiver
#[must_use]
pub fn change_channel() -> (ChangeSender, Receiver<ChangeEvent>) {
    let (inner, receiver) = channel::unbounded();
    (ChangeSender { inner }, receiver)
}
