//! XML exporter and importer

use crate::dom;
use crate::format::{self, Entries, GCONF_SCHEMA};
use fma_io::{
    ExportError, ExportFormat, Exporter, ImportError, Importer, IoProvider, ProviderError,
    ReadOutcome,
};
use fma_io_gconf::keys::{self, DEFAULT_ROOT};
use fma_io_gconf::{GConfConfig, GConfProvider, KeyStore, MemoryStore};
use fma_object::{Duplicable, Item};

/// Provider id
pub const XML_PROVIDER_ID: &str = "na-xml";

const EXPORTER_NAME: &str = "NAXML Exporter";
const INTERFACE_VERSION: u32 = 2;

/// Import/export-only provider for the registry XML formats
///
/// Items are laid out as registry keys first, so an exported document
/// can be loaded into a registry as is, and an imported one goes
/// through the registry reader, legacy migration included.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlProvider;

impl XmlProvider {
    /// Create provider
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Every key under `dir`, its own keys before its subdirectories
fn collect(store: &MemoryStore, dir: &str, entries: &mut Entries) {
    for name in store.entries(dir) {
        let key = keys::join(dir, &name);
        if let Some(value) = store.get(&key) {
            entries.push((key, value));
        }
    }
    for sub in store.subdirs(dir) {
        collect(store, &sub, entries);
    }
}

/// Parent directory of a key
fn parent(key: &str) -> &str {
    key.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Directory of the item described by `entries`
///
/// The shallowest directory holding a key; every other key must lie
/// under it.
fn item_dir(entries: &Entries) -> Result<String, ImportError> {
    let dir = entries
        .iter()
        .map(|(key, _)| parent(key))
        .min_by_key(|dir| dir.matches('/').count())
        .ok_or_else(|| ImportError::invalid("document holds no key"))?;
    if dir.is_empty() {
        return Err(ImportError::invalid("key outside of an item directory"));
    }
    let prefix = format!("{dir}/");
    if let Some((stray, _)) = entries.iter().find(|(key, _)| !key.starts_with(&prefix)) {
        return Err(ImportError::invalid(format!(
            "key {stray} is outside of item directory {dir}"
        )));
    }
    Ok(dir.to_string())
}

impl Exporter for XmlProvider {
    fn name(&self) -> &str {
        EXPORTER_NAME
    }

    fn version(&self) -> u32 {
        INTERFACE_VERSION
    }

    fn formats(&self) -> Vec<ExportFormat> {
        format::formats()
    }

    fn to_buffer(&self, item: &Item, format: &str) -> Result<String, ExportError> {
        if !self.supports(format) {
            return Err(ExportError::InvalidFormat(format.to_string()));
        }
        if let Err(e) = item.validate() {
            return Err(ExportError::InvalidItem(format!("{}: {e}", item.id())));
        }

        let store = MemoryStore::new();
        let mut registry = GConfProvider::new(store.clone(), GConfConfig::default());
        registry
            .write_item(item)
            .map_err(|e| ExportError::InvalidItem(e.to_string()))?;

        let dir = keys::join(DEFAULT_ROOT, item.id());
        let mut entries = Vec::new();
        collect(&store, &dir, &mut entries);

        let rendered = match format {
            GCONF_SCHEMA => format::render_schemas(&entries),
            _ => format::render_entries(&dir, &entries),
        };
        let xml = rendered.map_err(|e| ExportError::Encode(e.to_string()))?;
        tracing::debug!(id = item.id(), format, keys = entries.len(), "item encoded");
        Ok(xml)
    }
}

impl Importer for XmlProvider {
    fn version(&self) -> u32 {
        INTERFACE_VERSION
    }

    fn import_from_buffer(&self, buffer: &str) -> Result<Item, ImportError> {
        let root = dom::parse(buffer)?;
        let entries = format::parse_document(&root)?;
        let dir = item_dir(&entries)?;

        let store = MemoryStore::new();
        for (key, value) in entries {
            store
                .set(&key, value)
                .map_err(|e| ImportError::invalid(e.to_string()))?;
        }
        let mut registry =
            GConfProvider::new(store, GConfConfig::default().with_root(parent(&dir)));
        let mut outcome = registry.read_items();
        if !outcome.messages.is_empty() {
            return Err(ImportError::invalid(outcome.messages.join("; ")));
        }
        let mut item = outcome
            .items
            .pop()
            .ok_or_else(|| ImportError::invalid("document describes no item"))?;

        item.prepare_for_paste(false);
        item.validate()
            .map_err(|e| ImportError::InvalidItem(format!("{}: {e}", item.id())))?;
        tracing::info!(id = item.id(), kind = %item.kind(), "item imported");
        Ok(item)
    }
}

impl IoProvider for XmlProvider {
    fn id(&self) -> &str {
        XML_PROVIDER_ID
    }

    fn name(&self) -> &str {
        EXPORTER_NAME
    }

    fn version(&self) -> u32 {
        INTERFACE_VERSION
    }

    fn is_willing_to_write(&self) -> bool {
        false
    }

    fn is_writable(&self, _item: &Item) -> bool {
        false
    }

    fn read_items(&mut self) -> ReadOutcome {
        ReadOutcome::new()
    }

    fn write_item(&mut self, _item: &Item) -> Result<(), ProviderError> {
        Err(ProviderError::NoApi(XML_PROVIDER_ID.to_string()))
    }

    fn delete_item(&mut self, _item: &Item) -> Result<(), ProviderError> {
        Err(ProviderError::NoApi(XML_PROVIDER_ID.to_string()))
    }

    fn exporter(&self) -> Option<&dyn Exporter> {
        Some(self)
    }

    fn importer(&self) -> Option<&dyn Importer> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fma_object::DataValue;

    fn entry(key: &str) -> (String, DataValue) {
        (key.to_string(), DataValue::from("x"))
    }

    #[test]
    fn item_dir_is_shallowest_parent() {
        let entries = vec![entry("/r/a/p1/path"), entry("/r/a/label")];
        assert_eq!(item_dir(&entries).unwrap(), "/r/a");
    }

    #[test]
    fn item_dir_rejects_stray_keys() {
        let entries = vec![entry("/r/a/label"), entry("/r/b/label")];
        assert!(matches!(item_dir(&entries), Err(ImportError::Invalid(_))));
        assert!(matches!(item_dir(&vec![entry("/label")]), Err(ImportError::Invalid(_))));
        assert!(matches!(item_dir(&Vec::new()), Err(ImportError::Invalid(_))));
    }

    #[test]
    fn provider_is_import_export_only() {
        let mut provider = XmlProvider::new();
        assert!(!provider.is_willing_to_write());
        assert!(provider.read_items().items.is_empty());
        assert!(provider.exporter().is_some());
        assert!(provider.importer().is_some());
        assert_eq!(IoProvider::version(&provider), 2);
    }
}
