//! Flat key registry provider

use crate::keys::{self, LEGACY_VERSION, TYPE_ACTION, TYPE_KEY, TYPE_MENU};
use crate::store::{KeyStore, StoreError};
use fma_io::{
    ensure_top_level, read_fields, write_fields, ChangeEvent, ChangeSender, FactoryReader,
    FactoryWriter, IoProvider, ProviderError, ReadOutcome,
};
use fma_object::data::names;
use fma_object::{
    Action, DataDef, DataValue, Duplicable, FieldSet, Item, ItemKind, Menu, Profile,
    LEGACY_PROFILE_ID,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Provider id
pub const GCONF_PROVIDER_ID: &str = "na-gconf";

/// Registry provider settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GConfConfig {
    /// Directory holding one subdirectory per item
    pub root: String,

    /// Accept writes
    pub writable: bool,
}

impl Default for GConfConfig {
    fn default() -> Self {
        Self {
            root: keys::DEFAULT_ROOT.to_string(),
            writable: true,
        }
    }
}

impl GConfConfig {
    /// Set root directory
    #[must_use]
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    /// Set writability
    #[must_use]
    pub fn with_writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }
}

/// Field reader over one registry directory
struct RecordReader<'a, S: ?Sized> {
    store: &'a S,
    dir: &'a str,
}

impl<S: KeyStore + ?Sized> FactoryReader for RecordReader<'_, S> {
    fn read_data(&self, kind: ItemKind, def: &DataDef) -> Result<Option<DataValue>, ProviderError> {
        if def.name == names::ID {
            return Ok(Some(DataValue::from(keys::basename(self.dir))));
        }
        Ok(keys::decode(kind, def, |key| {
            self.store.get(&keys::join(self.dir, key))
        }))
    }

    fn read_done(&self, fields: &mut FieldSet) -> Result<(), ProviderError> {
        // a missing toolbar label follows the main label
        if fields.kind() == ItemKind::Action
            && fields.boolean(names::TOOLBAR_SAME_LABEL)
            && self
                .store
                .get(&keys::join(self.dir, "toolbar-label"))
                .is_none()
        {
            let label = fields.string(names::LABEL).to_string();
            fields
                .set(names::TOOLBAR_LABEL, label)
                .map_err(|e| ProviderError::program(e.to_string()))?;
        }
        Ok(())
    }
}

/// Field writer into one registry directory
struct RecordWriter<'a, S: ?Sized> {
    store: &'a S,
    dir: String,
}

impl<S: KeyStore + ?Sized> FactoryWriter for RecordWriter<'_, S> {
    fn write_start(&mut self, kind: ItemKind) -> Result<(), ProviderError> {
        if kind == ItemKind::Profile {
            return Ok(());
        }
        self.store
            .set(&keys::join(&self.dir, TYPE_KEY), keys::type_value(kind).into())
            .map_err(store_error)
    }

    fn write_data(
        &mut self,
        kind: ItemKind,
        def: &DataDef,
        value: &DataValue,
    ) -> Result<(), ProviderError> {
        for (key, value) in keys::encode(kind, def, value) {
            self.store
                .set(&keys::join(&self.dir, key), value)
                .map_err(store_error)?;
        }
        Ok(())
    }
}

fn store_error(e: StoreError) -> ProviderError {
    ProviderError::write(e.to_string())
}

/// Provider over a flat key registry
///
/// Reads legacy single-profile actions (no profile subdirectory) by
/// synthesizing one profile from the action-level keys.
#[derive(Debug)]
pub struct GConfProvider<S> {
    store: S,
    config: GConfConfig,
}

impl<S: KeyStore> GConfProvider<S> {
    /// Create provider over `store`
    pub fn new(store: S, config: GConfConfig) -> Self {
        Self { store, config }
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    fn item_dir(&self, id: &str) -> String {
        keys::join(&self.config.root, id)
    }

    fn read_item(&self, dir: &str) -> Result<Item, ProviderError> {
        let kind = match self.store.get(&keys::join(dir, TYPE_KEY)) {
            None => ItemKind::Action,
            Some(DataValue::String(t)) if t == TYPE_ACTION => ItemKind::Action,
            Some(DataValue::String(t)) if t == TYPE_MENU => ItemKind::Menu,
            Some(other) => {
                return Err(ProviderError::program(format!("unknown item type {other}")));
            }
        };

        let reader = RecordReader {
            store: &self.store,
            dir,
        };
        let fields = read_fields(&reader, kind)?;
        let mut item = match kind {
            ItemKind::Menu => Item::Menu(Menu::from_fields(fields)),
            _ => Item::Action(self.read_action(dir, fields)?),
        };
        item.mark_readonly(!self.store.is_writable(dir));
        Ok(item)
    }

    fn read_action(&self, dir: &str, fields: FieldSet) -> Result<Action, ProviderError> {
        let order = fields.list(names::ITEMS).to_vec();
        let mut action = Action::from_fields(fields);
        let mut subdirs = self.store.subdirs(dir);

        if subdirs.is_empty() {
            tracing::debug!(dir, "no profile subdirectory, reading single-profile record");
            let reader = RecordReader {
                store: &self.store,
                dir,
            };
            let mut profile = Profile::from_fields(read_fields(&reader, ItemKind::Profile)?);
            profile.set_id(LEGACY_PROFILE_ID);
            action.attach_profile(profile);
            if self.store.get(&keys::join(dir, "version")).is_none() {
                action
                    .fields_mut()
                    .set(names::VERSION, LEGACY_VERSION)
                    .map_err(|e| ProviderError::program(e.to_string()))?;
            }
            return Ok(action);
        }

        let mut ordered = Vec::with_capacity(subdirs.len());
        for id in &order {
            let path = keys::join(dir, id);
            if let Some(pos) = subdirs.iter().position(|s| *s == path) {
                ordered.push(subdirs.remove(pos));
            }
        }
        ordered.extend(subdirs);

        for path in ordered {
            let reader = RecordReader {
                store: &self.store,
                dir: &path,
            };
            match read_fields(&reader, ItemKind::Profile) {
                Ok(fields) => action.attach_profile(Profile::from_fields(fields)),
                Err(e) => tracing::warn!(path = %path, error = %e, "skipping unreadable profile"),
            }
        }
        Ok(action)
    }
}

impl<S: KeyStore> IoProvider for GConfProvider<S> {
    fn id(&self) -> &str {
        GCONF_PROVIDER_ID
    }

    fn name(&self) -> &str {
        "GConf registry"
    }

    fn is_willing_to_write(&self) -> bool {
        self.config.writable && self.store.is_writable(&self.config.root)
    }

    fn is_writable(&self, item: &Item) -> bool {
        item.kind() != ItemKind::Profile
            && !item.is_readonly()
            && self.store.is_writable(&self.item_dir(item.id()))
    }

    fn read_items(&mut self) -> ReadOutcome {
        let mut outcome = ReadOutcome::new();
        for dir in self.store.subdirs(&self.config.root) {
            match self.read_item(&dir) {
                Ok(item) => outcome.push(item, GCONF_PROVIDER_ID),
                Err(e) => outcome.skip(&dir, e),
            }
        }
        tracing::debug!(
            count = outcome.items.len(),
            skipped = outcome.messages.len(),
            "registry items read"
        );
        outcome
    }

    fn write_item(&mut self, item: &Item) -> Result<(), ProviderError> {
        ensure_top_level(item)?;
        let dir = self.item_dir(item.id());
        self.store.unset_recursive(&dir).map_err(store_error)?;

        let mut writer = RecordWriter {
            store: &self.store,
            dir: dir.clone(),
        };
        write_fields(&mut writer, item.fields())?;

        for profile in item.as_action().into_iter().flat_map(Action::profiles) {
            let mut writer = RecordWriter {
                store: &self.store,
                dir: keys::join(&dir, profile.id()),
            };
            write_fields(&mut writer, profile.fields())?;
        }
        tracing::info!(id = item.id(), kind = %item.kind(), "item written to registry");
        Ok(())
    }

    fn delete_item(&mut self, item: &Item) -> Result<(), ProviderError> {
        ensure_top_level(item)?;
        let dir = self.item_dir(item.id());
        self.store.unset_recursive(&dir).map_err(store_error)?;
        tracing::info!(id = item.id(), "item deleted from registry");
        Ok(())
    }

    fn set_change_sender(&mut self, sender: ChangeSender) {
        let root = self.config.root.trim_end_matches('/').to_string();
        self.store.watch(
            &root.clone(),
            Arc::new(move |key: &str, value: Option<&DataValue>| {
                if let Some(event) = change_event(&root, key, value) {
                    sender.signal(event);
                }
            }),
        );
    }
}

/// Map a changed key to a change event
fn change_event(root: &str, key: &str, value: Option<&DataValue>) -> Option<ChangeEvent> {
    let rest = key.strip_prefix(root)?.strip_prefix('/')?;
    let parts: Vec<&str> = rest.split('/').collect();
    let mut event = match parts.as_slice() {
        [uuid, entry] => ChangeEvent::new(GCONF_PROVIDER_ID, *uuid).with_key(*entry),
        [uuid, profile, entry] => ChangeEvent::new(GCONF_PROVIDER_ID, *uuid)
            .with_profile(*profile)
            .with_key(*entry),
        _ => return None,
    };
    if let Some(value) = value {
        event = event.with_value(value.clone());
    }
    Some(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn change_event_parses_paths() {
        let event = change_event("/root", "/root/u1/p1/path", None).unwrap();
        assert_eq!(event.id, "u1");
        assert_eq!(event.profile.as_deref(), Some("p1"));
        assert_eq!(event.key.as_deref(), Some("path"));

        let event = change_event("/root", "/root/u1/label", Some(&"x".into())).unwrap();
        assert_eq!(event.profile, None);
        assert_eq!(event.value, Some("x".into()));

        assert!(change_event("/root", "/elsewhere/u1/label", None).is_none());
        assert!(change_event("/root", "/root/u1", None).is_none());
    }

    #[test]
    fn unknown_type_is_skipped() {
        let store = MemoryStore::new();
        store.set("/r/x/type", "Folder".into()).unwrap();
        store.set("/r/x/label", "X".into()).unwrap();
        let mut provider = GConfProvider::new(store, GConfConfig::default().with_root("/r"));
        let outcome = provider.read_items();
        assert!(outcome.items.is_empty());
        assert_eq!(outcome.messages.len(), 1);
    }

    #[test]
    fn missing_toolbar_label_follows_label() {
        let store = MemoryStore::new();
        store.set("/r/a/label", "Open".into()).unwrap();
        store.set("/r/a/p1/path", "/bin/open".into()).unwrap();
        let mut provider = GConfProvider::new(store, GConfConfig::default().with_root("/r"));
        let outcome = provider.read_items();
        let action = outcome.items[0].as_action().unwrap();
        assert_eq!(action.fields().string(names::TOOLBAR_LABEL), "Open");
    }

    #[test]
    fn locked_item_is_readonly() {
        let store = MemoryStore::new();
        store.set("/r/a/label", "Open".into()).unwrap();
        store.lock("/r/a");
        let mut provider =
            GConfProvider::new(store.clone(), GConfConfig::default().with_root("/r"));
        let outcome = provider.read_items();
        assert!(outcome.items[0].is_readonly());
        assert!(!provider.is_writable(&outcome.items[0]));
        assert!(provider.delete_item(&outcome.items[0]).is_err());
    }
}
