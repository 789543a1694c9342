//! Desktop entry provider
//!
//! Items live one per file in a list of directories. The user directory
//! is searched first and is the only one written to; files found in
//! system directories are read-only. An id found in an earlier
//! directory shadows the same id in later ones.

use crate::error::DesktopError;
use crate::keyfile::KeyFile;
use crate::keys::{self, DESKTOP_GROUP, TYPE_ACTION, TYPE_KEY, TYPE_MENU};
use fma_io::{
    ensure_top_level, read_fields, write_fields, ChangeEvent, ChangeSender, FactoryReader,
    FactoryWriter, IoProvider, ProviderError, ReadOutcome,
};
use fma_object::data::{defs_for, names};
use fma_object::{
    Action, DataDef, DataValue, Duplicable, FieldSet, Item, ItemKind, Menu, Profile,
    DEFAULT_PROFILE_LABEL, LEGACY_PROFILE_ID,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Provider id
pub const DESKTOP_PROVIDER_ID: &str = "na-desktop";

/// Version given to actions read from a single-profile entry
const LEGACY_VERSION: &str = "1.0";

/// Desktop provider settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopConfig {
    /// Read-only directories, searched after the user directory
    pub system_dirs: Vec<PathBuf>,

    /// Writable directory; without one the provider refuses writes
    pub user_dir: Option<PathBuf>,

    /// Locale used to pick `Key[locale]` translations
    pub locale: Option<String>,
}

impl DesktopConfig {
    /// Append a system directory
    #[must_use]
    pub fn with_system_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.system_dirs.push(dir.into());
        self
    }

    /// Set the user directory
    #[must_use]
    pub fn with_user_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_dir = Some(dir.into());
        self
    }

    /// Set the locale
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }
}

struct GroupReader<'a> {
    file: &'a KeyFile,
    group: &'a str,
    id: &'a str,
    locale: Option<&'a str>,
}

impl FactoryReader for GroupReader<'_> {
    fn read_data(&self, _kind: ItemKind, def: &DataDef) -> Result<Option<DataValue>, ProviderError> {
        if def.name == names::ID {
            return Ok(Some(DataValue::from(self.id)));
        }
        match keys::decode(self.file, self.group, def, self.locale) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(group = self.group, error = %e, "ignoring malformed value");
                Ok(None)
            }
        }
    }
}

struct GroupWriter<'a> {
    file: &'a mut KeyFile,
    group: String,
    locale: Option<&'a str>,
}

impl FactoryWriter for GroupWriter<'_> {
    fn write_start(&mut self, kind: ItemKind) -> Result<(), ProviderError> {
        if kind != ItemKind::Profile {
            self.file
                .set_string(&self.group, TYPE_KEY, keys::type_value(kind));
        }
        Ok(())
    }

    fn write_data(
        &mut self,
        _kind: ItemKind,
        def: &DataDef,
        value: &DataValue,
    ) -> Result<(), ProviderError> {
        keys::encode(self.file, &self.group, def, value, self.locale);
        Ok(())
    }
}

fn desktop_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "skipping unreadable directory");
            return Vec::new();
        }
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && keys::id_from_path(path).is_some())
        .collect();
    files.sort();
    files
}

/// Key file at `path` to update in place, or an empty one
///
/// A file that no longer parses is replaced.
fn existing_file(path: &Path) -> Result<KeyFile, ProviderError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(KeyFile::parse(&text).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "replacing malformed desktop file");
            KeyFile::new()
        })),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(KeyFile::new()),
        Err(e) => Err(ProviderError::io(path, &e)),
    }
}

/// Keys a single-profile entry keeps in its main group
fn profile_only_keys() -> Vec<&'static str> {
    let main: HashSet<&str> = defs_for(ItemKind::Action)
        .chain(defs_for(ItemKind::Menu))
        .filter_map(|def| def.desktop_key)
        .collect();
    defs_for(ItemKind::Profile)
        .filter_map(|def| def.desktop_key)
        .filter(|key| !main.contains(key))
        .collect()
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Provider over directories of desktop entry files
///
/// Has no native change notification: [`IoProvider::check_for_changes`]
/// compares modification times with the last scan.
#[derive(Debug)]
pub struct DesktopProvider {
    config: DesktopConfig,
    stamps: BTreeMap<PathBuf, SystemTime>,
    sender: Option<ChangeSender>,
}

impl DesktopProvider {
    /// Create provider
    #[must_use]
    pub fn new(config: DesktopConfig) -> Self {
        Self {
            config,
            stamps: BTreeMap::new(),
            sender: None,
        }
    }

    /// Settings
    #[inline]
    #[must_use]
    pub fn config(&self) -> &DesktopConfig {
        &self.config
    }

    /// Path an item is written to
    #[must_use]
    pub fn item_path(&self, id: &str) -> Option<PathBuf> {
        self.config
            .user_dir
            .as_ref()
            .map(|dir| dir.join(keys::file_name(id)))
    }

    fn search_dirs(&self) -> impl Iterator<Item = &Path> {
        self.config
            .user_dir
            .iter()
            .chain(&self.config.system_dirs)
            .map(PathBuf::as_path)
    }

    fn is_user_file(&self, path: &Path) -> bool {
        self.config
            .user_dir
            .as_deref()
            .is_some_and(|dir| path.parent() == Some(dir))
    }

    /// Read one desktop file
    ///
    /// # Errors
    ///
    /// [`DesktopError`] when the file cannot be read, is not a key file,
    /// does not start with the desktop entry group, or has an unknown
    /// type.
    pub fn read_file(&self, path: &Path) -> Result<Item, DesktopError> {
        let text = fs::read_to_string(path).map_err(|e| DesktopError::io(path, e))?;
        let file = KeyFile::parse(&text)?;
        match file.start_group() {
            Some(DESKTOP_GROUP) => {}
            other => {
                return Err(DesktopError::InvalidStartGroup(
                    other.unwrap_or_default().to_string(),
                ));
            }
        }
        let id = keys::id_from_path(path).ok_or_else(|| DesktopError::NoId(path.to_path_buf()))?;
        let kind = match file.get_string(DESKTOP_GROUP, TYPE_KEY).as_deref() {
            None | Some(TYPE_ACTION) => ItemKind::Action,
            Some(TYPE_MENU) => ItemKind::Menu,
            Some(other) => return Err(DesktopError::UnknownType(other.to_string())),
        };

        let reader = GroupReader {
            file: &file,
            group: DESKTOP_GROUP,
            id,
            locale: self.config.locale.as_deref(),
        };
        let fields = read_fields(&reader, kind)?;
        let mut item = match kind {
            ItemKind::Menu => Item::Menu(Menu::from_fields(fields)),
            _ => Item::Action(self.read_action(&file, fields)?),
        };

        let readonly = !self.is_user_file(path)
            || fs::metadata(path).map_or(true, |m| m.permissions().readonly());
        item.mark_readonly(readonly);
        Ok(item)
    }

    fn read_action(&self, file: &KeyFile, fields: FieldSet) -> Result<Action, DesktopError> {
        let locale = self.config.locale.as_deref();
        let order = fields.list(names::ITEMS).to_vec();
        let mut action = Action::from_fields(fields);
        let mut found: Vec<&str> = file.groups().filter_map(keys::group_profile_id).collect();

        if found.is_empty() {
            tracing::debug!(id = action.id(), "no profile group, reading single-profile entry");
            let reader = GroupReader {
                file,
                group: DESKTOP_GROUP,
                id: LEGACY_PROFILE_ID,
                locale,
            };
            let mut profile = Profile::from_fields(read_fields(&reader, ItemKind::Profile)?);
            profile
                .fields_mut()
                .set(names::LABEL, DEFAULT_PROFILE_LABEL)
                .map_err(|e| ProviderError::program(e.to_string()))?;
            action.attach_profile(profile);
            action
                .fields_mut()
                .set(names::VERSION, LEGACY_VERSION)
                .map_err(|e| ProviderError::program(e.to_string()))?;
            return Ok(action);
        }

        let mut ordered = Vec::with_capacity(found.len());
        for id in &order {
            if let Some(pos) = found.iter().position(|g| *g == id.as_str()) {
                ordered.push(found.remove(pos));
            }
        }
        ordered.extend(found);

        for profile_id in ordered {
            let group = keys::profile_group(profile_id);
            let reader = GroupReader {
                file,
                group: &group,
                id: profile_id,
                locale,
            };
            match read_fields(&reader, ItemKind::Profile) {
                Ok(fields) => action.attach_profile(Profile::from_fields(fields)),
                Err(e) => tracing::warn!(profile = profile_id, error = %e, "skipping unreadable profile"),
            }
        }
        Ok(action)
    }

    fn scan_stamps(&self) -> BTreeMap<PathBuf, SystemTime> {
        self.search_dirs()
            .flat_map(desktop_files)
            .filter_map(|path| modified_time(&path).map(|stamp| (path, stamp)))
            .collect()
    }
}

impl IoProvider for DesktopProvider {
    fn id(&self) -> &str {
        DESKTOP_PROVIDER_ID
    }

    fn name(&self) -> &str {
        "Desktop files"
    }

    fn is_willing_to_write(&self) -> bool {
        self.config.user_dir.is_some()
    }

    fn is_writable(&self, item: &Item) -> bool {
        if item.kind() == ItemKind::Profile || item.is_readonly() {
            return false;
        }
        match self.item_path(item.id()) {
            Some(path) if path.exists() => {
                fs::metadata(&path).is_ok_and(|m| !m.permissions().readonly())
            }
            Some(_) => true,
            None => false,
        }
    }

    fn read_items(&mut self) -> ReadOutcome {
        let mut outcome = ReadOutcome::new();
        let mut seen: HashSet<String> = HashSet::new();
        for dir in self.search_dirs() {
            for path in desktop_files(dir) {
                let Some(id) = keys::id_from_path(&path) else {
                    continue;
                };
                if seen.contains(id) {
                    tracing::debug!(path = %path.display(), "shadowed by an earlier directory");
                    continue;
                }
                match self.read_file(&path) {
                    Ok(item) => {
                        seen.insert(id.to_string());
                        outcome.push(item, DESKTOP_PROVIDER_ID);
                    }
                    Err(e) => outcome.skip(&path.display().to_string(), e),
                }
            }
        }
        self.stamps = self.scan_stamps();
        tracing::debug!(
            count = outcome.items.len(),
            skipped = outcome.messages.len(),
            "desktop files read"
        );
        outcome
    }

    fn write_item(&mut self, item: &Item) -> Result<(), ProviderError> {
        ensure_top_level(item)?;
        let Some(path) = self.item_path(item.id()) else {
            return Err(ProviderError::NotWilling(DESKTOP_PROVIDER_ID.to_string()));
        };

        let locale = self.config.locale.as_deref();
        let mut file = existing_file(&path)?;
        let profiles: Vec<&Profile> = item.as_action().into_iter().flat_map(Action::profiles).collect();

        let stale: Vec<String> = file
            .groups()
            .filter(|group| {
                keys::group_profile_id(group)
                    .is_some_and(|id| !profiles.iter().any(|p| p.id() == id))
            })
            .map(str::to_string)
            .collect();
        for group in &stale {
            file.remove_group(group);
        }
        if !profiles.is_empty() {
            for key in profile_only_keys() {
                file.remove_key(DESKTOP_GROUP, key);
            }
        }

        let mut writer = GroupWriter {
            file: &mut file,
            group: DESKTOP_GROUP.to_string(),
            locale,
        };
        write_fields(&mut writer, item.fields())?;
        for profile in profiles {
            let mut writer = GroupWriter {
                file: &mut file,
                group: keys::profile_group(profile.id()),
                locale,
            };
            write_fields(&mut writer, profile.fields())?;
        }

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| ProviderError::io(dir, &e))?;
        }
        let tmp = path.with_extension("desktop.tmp");
        fs::write(&tmp, file.to_string()).map_err(|e| ProviderError::io(&tmp, &e))?;
        fs::rename(&tmp, &path).map_err(|e| ProviderError::io(&path, &e))?;

        if let Some(stamp) = modified_time(&path) {
            self.stamps.insert(path.clone(), stamp);
        }
        tracing::info!(id = item.id(), path = %path.display(), "item written to desktop file");
        Ok(())
    }

    fn delete_item(&mut self, item: &Item) -> Result<(), ProviderError> {
        ensure_top_level(item)?;
        if item.is_readonly() {
            return Err(ProviderError::ItemReadonly(item.id().to_string()));
        }
        let Some(path) = self.item_path(item.id()) else {
            return Err(ProviderError::NotWilling(DESKTOP_PROVIDER_ID.to_string()));
        };
        match fs::remove_file(&path) {
            Ok(()) => tracing::info!(id = item.id(), path = %path.display(), "desktop file deleted"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(id = item.id(), "no desktop file to delete");
            }
            Err(e) => return Err(ProviderError::io(&path, &e)),
        }
        self.stamps.remove(&path);
        Ok(())
    }

    fn set_change_sender(&mut self, sender: ChangeSender) {
        self.sender = Some(sender);
    }

    fn check_for_changes(&mut self) {
        let current = self.scan_stamps();
        let mut changed: Vec<PathBuf> = current
            .iter()
            .filter(|(path, stamp)| self.stamps.get(*path) != Some(*stamp))
            .map(|(path, _)| path.clone())
            .collect();
        changed.extend(
            self.stamps
                .keys()
                .filter(|path| !current.contains_key(*path))
                .cloned(),
        );

        if let Some(sender) = &self.sender {
            for path in &changed {
                if let Some(id) = keys::id_from_path(path) {
                    sender.signal(ChangeEvent::new(DESKTOP_PROVIDER_ID, id));
                }
            }
        }
        if !changed.is_empty() {
            tracing::debug!(changed = changed.len(), "desktop files changed on disk");
        }
        self.stamps = current;
    }
}
