//! Provider aggregator

use crate::clock::{Clock, TimePoint};
use crate::config::{PivotConfig, ProviderConfig};
use crate::debounce::Debouncer;
use crate::error::{PivotError, Result};
use fma_io::{
    change_channel, ChangeEvent, ChangeReceiver, ChangeSender, ExportFormat, ImportError,
    ImportMode, IoProvider, ProviderError,
};
use fma_object::{build_hierarchy, count_items, dump_tree, Duplicable, Item, CURRENT_VERSION};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Told when the item list has been replaced
pub trait PivotConsumer {
    /// Called once per reload with the new top-level items
    fn on_items_reloaded(&mut self, items: &[Item]);
}

/// What [`Pivot::import_item`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// Written under its own id
    Imported(String),

    /// Id collided; written under a new id
    Renumbered { from: String, to: String },

    /// Id collided; the existing item was replaced
    Overridden(String),

    /// Id collided; nothing written
    Skipped(String),
}

struct Registered {
    provider: Box<dyn IoProvider>,
    config: ProviderConfig,
}

/// Merged view over every registered provider
///
/// Owns the providers. Change events raised by any of them are drained
/// by [`Pivot::process_events`]; after a burst settles, [`Pivot::poll`]
/// reloads the whole list and tells each consumer once.
pub struct Pivot {
    config: PivotConfig,
    providers: Vec<Registered>,
    items: Vec<Item>,
    messages: Vec<String>,
    consumers: Vec<Box<dyn PivotConsumer>>,
    clock: Arc<dyn Clock>,
    debouncer: Debouncer,
    sender: ChangeSender,
    receiver: ChangeReceiver,
}

impl std::fmt::Debug for Pivot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.providers.iter().map(|r| r.provider.id()).collect();
        f.debug_struct("Pivot")
            .field("providers", &ids)
            .field("items", &self.items.len())
            .field("consumers", &self.consumers.len())
            .field("debouncer", &self.debouncer)
            .finish_non_exhaustive()
    }
}

impl Pivot {
    /// Register `providers` in order and load their items
    ///
    /// Providers configured as not readable are left out.
    pub fn new(
        config: PivotConfig,
        providers: Vec<Box<dyn IoProvider>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (sender, receiver) = change_channel();
        let mut registered = Vec::with_capacity(providers.len());
        for mut provider in providers {
            let provider_config = config.provider(provider.id());
            if !provider_config.readable {
                tracing::info!(provider = provider.id(), "provider disabled by configuration");
                continue;
            }
            if registered
                .iter()
                .any(|r: &Registered| r.provider.id() == provider.id())
            {
                tracing::warn!(provider = provider.id(), "provider id registered twice, ignoring");
                continue;
            }
            provider.set_change_sender(sender.clone());
            tracing::debug!(provider = provider.id(), version = provider.version(), "provider registered");
            registered.push(Registered {
                provider,
                config: provider_config,
            });
        }

        let debouncer = Debouncer::new(config.debounce_delay(), config.quiet_window());
        let mut pivot = Self {
            config,
            providers: registered,
            items: Vec::new(),
            messages: Vec::new(),
            consumers: Vec::new(),
            clock,
            debouncer,
            sender,
            receiver,
        };
        pivot.load_items();
        pivot
    }

    /// Current top-level items
    #[inline]
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Item with this id, anywhere in the tree
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Item> {
        fma_object::find(&self.items, id)
    }

    /// Messages of the records skipped by the last load
    #[inline]
    #[must_use]
    pub fn read_messages(&self) -> &[String] {
        &self.messages
    }

    /// Registered providers, in order
    pub fn providers(&self) -> impl Iterator<Item = &dyn IoProvider> {
        self.providers.iter().map(|r| r.provider.as_ref())
    }

    /// Registered provider with this id
    #[must_use]
    pub fn provider(&self, id: &str) -> Option<&dyn IoProvider> {
        self.position(id).map(|i| self.providers[i].provider.as_ref())
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PivotConfig {
        &self.config
    }

    /// Sender for raising change events from outside a provider
    #[must_use]
    pub fn change_sender(&self) -> ChangeSender {
        self.sender.clone()
    }

    /// Register a consumer of reloads
    pub fn add_consumer(&mut self, consumer: Box<dyn PivotConsumer>) {
        self.consumers.push(consumer);
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.providers.iter().position(|r| r.provider.id() == id)
    }

    /// Read every provider and replace the item list
    ///
    /// The first provider to return an id keeps it.
    fn load_items(&mut self) {
        let mut seen = HashSet::new();
        let mut flat = Vec::new();
        self.messages.clear();

        for registered in &mut self.providers {
            let provider_id = registered.provider.id().to_string();
            let outcome = registered.provider.read_items();
            self.messages.extend(outcome.messages);
            for item in outcome.items {
                if !seen.insert(item.id().to_string()) {
                    tracing::warn!(
                        id = item.id(),
                        provider = %provider_id,
                        "item already read from an earlier provider, skipping"
                    );
                    continue;
                }
                flat.push(item);
            }
        }

        self.items = build_hierarchy(flat);
        let counts = count_items(&self.items, true);
        tracing::info!(
            menus = counts.menus,
            actions = counts.actions,
            profiles = counts.profiles,
            skipped = self.messages.len(),
            "items loaded"
        );
        for line in dump_tree(&self.items).lines() {
            tracing::trace!("{line}");
        }
    }

    /// Re-read every provider and notify each consumer once
    pub fn reload(&mut self) {
        self.debouncer.cancel();
        self.load_items();
        for consumer in &mut self.consumers {
            consumer.on_items_reloaded(&self.items);
        }
    }

    /// Provider that would receive `item`
    ///
    /// Its owner if it has one, else the first provider accepting writes.
    fn target(&self, item: &Item) -> std::result::Result<usize, ProviderError> {
        match item.provider() {
            Some(id) => self
                .position(id)
                .ok_or_else(|| ProviderError::NoProviderFound(item.id().to_string())),
            None => self
                .providers
                .iter()
                .position(|r| {
                    !r.config.locked_by_admin
                        && r.config.writable
                        && r.provider.is_willing_to_write()
                })
                .ok_or_else(|| ProviderError::NoProviderFound(item.id().to_string())),
        }
    }

    /// Whether `item` can be written, or the first reason it cannot
    ///
    /// # Errors
    ///
    /// In order: configuration locked, item read-only, no provider,
    /// provider locked by admin, provider locked by user, provider not
    /// willing, provider refuses the item.
    pub fn is_item_writable(&self, item: &Item) -> std::result::Result<(), ProviderError> {
        self.check_writable(item).map(|_| ())
    }

    fn check_writable(&self, item: &Item) -> std::result::Result<usize, ProviderError> {
        if self.config.locked {
            return Err(ProviderError::ConfigurationLocked);
        }
        if item.is_readonly() {
            return Err(ProviderError::ItemReadonly(item.id().to_string()));
        }
        let index = self.target(item)?;
        let registered = &self.providers[index];
        let provider_id = registered.provider.id().to_string();
        if registered.config.locked_by_admin {
            return Err(ProviderError::LockedByAdmin(provider_id));
        }
        if !registered.config.writable {
            return Err(ProviderError::LockedByUser(provider_id));
        }
        if !registered.provider.is_willing_to_write() {
            return Err(ProviderError::NotWilling(provider_id));
        }
        if !registered.provider.is_writable(item) {
            return Err(ProviderError::ItemReadonly(item.id().to_string()));
        }
        Ok(index)
    }

    /// Write `item` to its provider, or to the first willing one if new
    ///
    /// Single-profile actions are written in the current schema; `item`
    /// itself is only upgraded once the write succeeded. On success the
    /// item is tagged with its provider and the stored record gets a new
    /// origin: a menu alone, or an action with its profiles. The cached
    /// list is left as is: the provider's change events bring it up to
    /// date.
    ///
    /// # Errors
    ///
    /// [`PivotError::Invalid`] for an invalid item, the reasons of
    /// [`Pivot::is_item_writable`], or the provider's write failure.
    pub fn write_item(&mut self, item: &mut Item) -> Result<()> {
        if let Err(reason) = item.validate() {
            return Err(PivotError::Invalid {
                id: item.id().to_string(),
                reason,
            });
        }
        let index = self.check_writable(item)?;
        let upgraded = upgrade_legacy(item)?;

        let registered = &mut self.providers[index];
        let provider_id = registered.provider.id().to_string();
        if let Err(e) = registered.provider.write_item(upgraded.as_ref().unwrap_or(&*item)) {
            tracing::error!(id = item.id(), provider = %provider_id, error = %e, "write failed");
            return Err(e.into());
        }
        if let Some(upgraded) = upgraded {
            *item = upgraded;
        }
        item.set_provider(Some(provider_id.clone()));
        item.rebaseline_record();
        tracing::info!(id = item.id(), provider = %provider_id, "item written");
        Ok(())
    }

    /// Delete `item` from its provider
    ///
    /// An item that was never written has nothing to delete.
    ///
    /// # Errors
    ///
    /// [`ProviderError::ConfigurationLocked`] when the configuration is
    /// locked, [`ProviderError::NoProviderFound`] when its provider is
    /// not registered, or the provider's failure.
    pub fn delete_item(&mut self, item: &Item) -> Result<()> {
        if self.config.locked {
            return Err(ProviderError::ConfigurationLocked.into());
        }
        let Some(provider_id) = item.provider() else {
            tracing::debug!(id = item.id(), "item never written, nothing to delete");
            return Ok(());
        };
        let index = self
            .position(provider_id)
            .ok_or_else(|| ProviderError::NoProviderFound(item.id().to_string()))?;
        if let Err(e) = self.providers[index].provider.delete_item(item) {
            tracing::error!(id = item.id(), provider = provider_id, error = %e, "delete failed");
            return Err(e.into());
        }
        tracing::info!(id = item.id(), provider = provider_id, "item deleted");
        Ok(())
    }

    /// Handle one change event: stamp it and arm the reload timer
    pub fn on_item_changed(&mut self, event: &ChangeEvent) {
        tracing::debug!(
            provider = %event.provider,
            id = %event.id,
            profile = ?event.profile,
            key = ?event.key,
            "item changed"
        );
        self.debouncer.event(self.clock.now());
    }

    /// Drain pending change events, returning how many were handled
    pub fn process_events(&mut self) -> usize {
        let events: Vec<ChangeEvent> = self.receiver.try_iter().collect();
        for event in &events {
            self.on_item_changed(event);
        }
        events.len()
    }

    /// Ask every provider to look for external changes
    pub fn check_providers(&mut self) {
        for registered in &mut self.providers {
            registered.provider.check_for_changes();
        }
        self.process_events();
    }

    /// Drain events, then reload if the timer expired on a quiet period
    ///
    /// Returns whether a reload ran.
    pub fn poll(&mut self) -> bool {
        self.process_events();
        if !self.debouncer.poll(self.clock.now()) {
            return false;
        }
        tracing::debug!("change burst settled, reloading");
        self.reload();
        true
    }

    /// When [`Pivot::poll`] should next be called, if a reload is pending
    #[must_use]
    pub fn next_deadline(&self) -> Option<TimePoint> {
        self.debouncer.deadline()
    }

    /// Write an imported item, resolving an id collision per `mode`
    ///
    /// # Errors
    ///
    /// The errors of [`Pivot::write_item`].
    pub fn import_item(&mut self, mut item: Item, mode: ImportMode) -> Result<ImportOutcome> {
        let id = item.id().to_string();
        // owner of the item already loaded under this id, if any
        let existing = self.find(&id).map(|e| e.provider().map(str::to_string));

        let outcome = match (existing.is_some(), mode) {
            (false, _) => {
                item.prepare_for_paste(false);
                ImportOutcome::Imported(id)
            }
            (true, ImportMode::NoImport) => {
                tracing::info!(id = %id, "item exists, not imported");
                return Ok(ImportOutcome::Skipped(id));
            }
            (true, ImportMode::Renumber) => {
                item.prepare_for_paste(true);
                ImportOutcome::Renumbered {
                    from: id,
                    to: item.id().to_string(),
                }
            }
            (true, ImportMode::Override) => {
                item.prepare_for_paste(false);
                item.set_provider(existing.flatten());
                ImportOutcome::Overridden(id)
            }
        };
        self.write_item(&mut item)?;
        tracing::info!(outcome = ?outcome, "item imported");
        Ok(outcome)
    }

    /// Import a document with the first provider willing to read it
    ///
    /// # Errors
    ///
    /// [`PivotError::NoImporter`] when no provider accepts the document,
    /// the importer's failure, or the errors of [`Pivot::import_item`].
    pub fn import_buffer(&mut self, buffer: &str, mode: ImportMode) -> Result<ImportOutcome> {
        let mut imported = None;
        for registered in &self.providers {
            let Some(importer) = registered.provider.importer() else {
                continue;
            };
            match importer.import_from_buffer(buffer) {
                Ok(item) => {
                    imported = Some(item);
                    break;
                }
                Err(ImportError::NotWilling(reason)) => {
                    tracing::debug!(provider = registered.provider.id(), %reason, "importer not willing");
                }
                Err(e) => return Err(e.into()),
            }
        }
        let item = imported.ok_or(PivotError::NoImporter)?;
        self.import_item(item, mode)
    }

    /// Every format offered by a registered exporter
    #[must_use]
    pub fn export_formats(&self) -> Vec<ExportFormat> {
        self.providers
            .iter()
            .filter_map(|r| r.provider.exporter())
            .flat_map(|e| e.formats())
            .collect()
    }

    /// Encode `item` with the first exporter offering `format`
    ///
    /// # Errors
    ///
    /// [`PivotError::NoExporter`] when no provider offers the format,
    /// or the exporter's failure.
    pub fn export_item(&self, item: &Item, format: &str) -> Result<String> {
        let exporter = self
            .providers
            .iter()
            .filter_map(|r| r.provider.exporter())
            .find(|e| e.supports(format))
            .ok_or_else(|| PivotError::NoExporter(format.to_string()))?;
        Ok(exporter.to_buffer(item, format)?)
    }

    /// Encode `item` into a new file in `folder`
    ///
    /// # Errors
    ///
    /// As [`Pivot::export_item`], plus the exporter's file errors.
    pub fn export_to_file(&self, item: &Item, folder: &Path, format: &str) -> Result<PathBuf> {
        let exporter = self
            .providers
            .iter()
            .filter_map(|r| r.provider.exporter())
            .find(|e| e.supports(format))
            .ok_or_else(|| PivotError::NoExporter(format.to_string()))?;
        Ok(exporter.to_file(item, folder, format)?)
    }
}

/// Copy of a legacy action moved to the current schema
fn upgrade_legacy(item: &Item) -> Result<Option<Item>> {
    let Some(action) = item.as_action().filter(|a| a.is_legacy()) else {
        return Ok(None);
    };
    tracing::info!(id = action.id(), from = action.version(), "upgrading action schema");
    let mut upgraded = item.clone();
    upgraded
        .fields_mut()
        .set(fma_object::data::names::VERSION, CURRENT_VERSION)?;
    Ok(Some(upgraded))
}
