//! Testing utilities for FMA workspace
//!
//! Shared fixtures, an in-memory provider with failure injection, and
//! test logging.

#![allow(missing_docs)]

use fma_io::{ensure_top_level, ChangeEvent, ChangeSender, IoProvider, ProviderError, ReadOutcome};
use fma_object::data::names;
use fma_object::{Action, Duplicable, Item, ItemKind, Menu, Profile};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

/// Install a fmt subscriber writing through the test harness
///
/// Filter from `RUST_LOG`, `warn` otherwise. `FMA_LOG_JSON=1` switches
/// to JSON lines. Safe to call from every test.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer();
        let installed = if std::env::var_os("FMA_LOG_JSON").is_some() {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
        if installed.is_err() {
            tracing::debug!("a global subscriber is already installed");
        }
    });
}

pub fn sample_profile(id: &str) -> Profile {
    Profile::new(id)
        .with_label(format!("Profile {id}"))
        .with_path("/usr/bin/true")
        .with_parameters("%f")
}

/// Valid action with one profile
pub fn sample_action(id: &str, label: &str) -> Item {
    Item::Action(
        Action::with_id(id)
            .with_label(label)
            .with_profile(sample_profile("profile-1")),
    )
}

/// Flat menu record listing `children` by id
pub fn sample_menu(id: &str, label: &str, children: &[&str]) -> Item {
    let mut menu = Menu::with_id(id).with_label(label);
    let ids: Vec<String> = children.iter().map(ToString::to_string).collect();
    menu.fields_mut().set(names::ITEMS, ids).unwrap();
    Item::Menu(menu)
}

#[derive(Default)]
struct State {
    items: Vec<Item>,
    corrupt: Vec<String>,
    readonly: HashSet<String>,
    fail_writes: Option<ProviderError>,
    sender: Option<ChangeSender>,
    reads: usize,
    writes: usize,
    deletes: usize,
}

impl State {
    fn store(&mut self, item: &Item) {
        // menus are stored as their own record only
        let record = match item.kind() {
            ItemKind::Menu => Item::from_fields(item.fields().clone()),
            _ => item.clone(),
        };
        match self.items.iter_mut().find(|i| i.id() == item.id()) {
            Some(slot) => *slot = record,
            None => self.items.push(record),
        }
    }

    fn signal(&self, provider: &str, id: &str) {
        if let Some(sender) = &self.sender {
            sender.signal(ChangeEvent::new(provider, id));
        }
    }
}

/// In-memory storage provider
///
/// Items are kept as flat records. Use [`InMemoryProvider::handle`]
/// before boxing the provider to inspect it or to play an external
/// editor afterwards.
pub struct InMemoryProvider {
    id: String,
    willing: bool,
    state: Arc<Mutex<State>>,
}

impl InMemoryProvider {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            willing: true,
            state: Arc::default(),
        }
    }

    #[must_use]
    pub fn with_item(self, item: Item) -> Self {
        self.state.lock().store(&item);
        self
    }

    #[must_use]
    pub fn with_items(self, items: impl IntoIterator<Item = Item>) -> Self {
        {
            let mut state = self.state.lock();
            for item in items {
                state.store(&item);
            }
        }
        self
    }

    /// Add a record that fails to read
    #[must_use]
    pub fn with_corrupt_record(self, name: &str) -> Self {
        self.state.lock().corrupt.push(name.to_string());
        self
    }

    /// Mark the item with this id read-only
    #[must_use]
    pub fn with_readonly(self, id: &str) -> Self {
        self.state.lock().readonly.insert(id.to_string());
        self
    }

    #[must_use]
    pub fn not_willing(mut self) -> Self {
        self.willing = false;
        self
    }

    pub fn handle(&self) -> InMemoryHandle {
        InMemoryHandle {
            id: self.id.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl IoProvider for InMemoryProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_willing_to_write(&self) -> bool {
        self.willing
    }

    fn is_writable(&self, item: &Item) -> bool {
        item.kind() != ItemKind::Profile && !self.state.lock().readonly.contains(item.id())
    }

    fn read_items(&mut self) -> ReadOutcome {
        let mut state = self.state.lock();
        state.reads += 1;
        let mut outcome = ReadOutcome::new();
        for record in &state.corrupt {
            outcome.skip(record, "corrupt record");
        }
        for item in &state.items {
            let mut item = item.clone();
            item.mark_readonly(state.readonly.contains(item.id()));
            outcome.push(item, &self.id);
        }
        outcome
    }

    fn write_item(&mut self, item: &Item) -> Result<(), ProviderError> {
        ensure_top_level(item)?;
        let mut state = self.state.lock();
        if let Some(error) = &state.fail_writes {
            return Err(error.clone());
        }
        state.store(item);
        state.writes += 1;
        Ok(())
    }

    fn delete_item(&mut self, item: &Item) -> Result<(), ProviderError> {
        ensure_top_level(item)?;
        let mut state = self.state.lock();
        if state.readonly.contains(item.id()) {
            return Err(ProviderError::ItemReadonly(item.id().to_string()));
        }
        state.items.retain(|i| i.id() != item.id());
        state.deletes += 1;
        Ok(())
    }

    fn set_change_sender(&mut self, sender: ChangeSender) {
        self.state.lock().sender = Some(sender);
    }
}

/// Shared view of an [`InMemoryProvider`]'s storage
#[derive(Clone)]
pub struct InMemoryHandle {
    id: String,
    state: Arc<Mutex<State>>,
}

impl InMemoryHandle {
    /// Stored records
    pub fn items(&self) -> Vec<Item> {
        self.state.lock().items.clone()
    }

    pub fn get(&self, id: &str) -> Option<Item> {
        self.state.lock().items.iter().find(|i| i.id() == id).cloned()
    }

    pub fn read_count(&self) -> usize {
        self.state.lock().reads
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().writes
    }

    pub fn delete_count(&self) -> usize {
        self.state.lock().deletes
    }

    /// Make every following write fail with `error`
    pub fn fail_writes(&self, error: Option<ProviderError>) {
        self.state.lock().fail_writes = error;
    }

    /// Store `item` behind the application's back and signal it
    pub fn external_write(&self, item: &Item) {
        let mut state = self.state.lock();
        state.store(item);
        state.signal(&self.id, item.id());
    }

    /// Remove an item behind the application's back and signal it
    pub fn external_delete(&self, id: &str) {
        let mut state = self.state.lock();
        state.items.retain(|i| i.id() != id);
        state.signal(&self.id, id);
    }

    /// Raise a change event without touching the data
    pub fn signal(&self, id: &str) {
        self.state.lock().signal(&self.id, id);
    }
}
