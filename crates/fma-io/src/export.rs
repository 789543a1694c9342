//! Import/export sub-protocol
//!
//! A provider may expose named formats and convert a single item tree
//! to or from a buffer or a file, independently of its storage role.

use crate::error::{ExportError, ImportError};
use fma_object::Item;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Export format advertised by an exporter
///
/// Passed through opaquely: callers only hand `id` back to the exporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFormat {
    /// Format identifier
    pub id: String,

    /// Short display label
    pub label: String,

    /// Longer description
    pub description: String,
}

impl ExportFormat {
    /// Create format descriptor
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: description.into(),
        }
    }
}

/// Converts an item tree to one of its formats
pub trait Exporter {
    /// Display name
    fn name(&self) -> &str;

    /// Interface version implemented
    fn version(&self) -> u32 {
        1
    }

    /// Formats offered
    fn formats(&self) -> Vec<ExportFormat>;

    /// Whether `format` is offered
    fn supports(&self, format: &str) -> bool {
        self.formats().iter().any(|f| f.id == format)
    }

    /// Encode `item` as `format`
    ///
    /// # Errors
    ///
    /// [`ExportError::InvalidFormat`] for an unknown format,
    /// [`ExportError::InvalidItem`] when the item cannot be exported.
    fn to_buffer(&self, item: &Item, format: &str) -> Result<String, ExportError>;

    /// File name used by [`Exporter::to_file`]
    fn file_name(&self, item: &Item, _format: &str) -> String {
        format!("config_{}.xml", item.id())
    }

    /// Encode `item` into a new file in `folder`, returning its path
    ///
    /// # Errors
    ///
    /// [`ExportError::InvalidTarget`] when `folder` is not a directory,
    /// [`ExportError::UnableToWrite`] on I/O failure, plus the errors of
    /// [`Exporter::to_buffer`].
    fn to_file(&self, item: &Item, folder: &Path, format: &str) -> Result<PathBuf, ExportError> {
        if !folder.is_dir() {
            return Err(ExportError::InvalidTarget(folder.to_path_buf()));
        }
        let buffer = self.to_buffer(item, format)?;
        let path = folder.join(self.file_name(item, format));
        std::fs::write(&path, buffer).map_err(|source| ExportError::UnableToWrite {
            path: path.clone(),
            source,
        })?;
        tracing::info!(id = item.id(), path = %path.display(), format, "item exported");
        Ok(path)
    }
}

/// Decodes an item tree from one of its formats
pub trait Importer {
    /// Interface version implemented
    fn version(&self) -> u32 {
        1
    }

    /// Decode an item from a buffer
    ///
    /// # Errors
    ///
    /// [`ImportError::NotWilling`] when the buffer is not in a handled
    /// format, [`ImportError::Invalid`] when it is malformed.
    fn import_from_buffer(&self, buffer: &str) -> Result<Item, ImportError>;

    /// Decode an item from a file
    ///
    /// # Errors
    ///
    /// [`ImportError::Io`] when the file cannot be read, plus the errors
    /// of [`Importer::import_from_buffer`].
    fn import_from_path(&self, path: &Path) -> Result<Item, ImportError> {
        let buffer = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.import_from_buffer(&buffer)
    }
}

/// What to do when an imported item's id already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    /// Keep the existing item, drop the imported one
    #[default]
    NoImport,

    /// Import under a new id
    Renumber,

    /// Replace the existing item
    Override,
}

#[cfg(test)]
mod tests {
    use super::*;
    use fma_object::{Action, Profile};

    struct PlainExporter;

    impl Exporter for PlainExporter {
        fn name(&self) -> &str {
            "plain"
        }

        fn formats(&self) -> Vec<ExportFormat> {
            vec![ExportFormat::new("plain", "Plain", "One line per node")]
        }

        fn to_buffer(&self, item: &Item, format: &str) -> Result<String, ExportError> {
            if !self.supports(format) {
                return Err(ExportError::InvalidFormat(format.to_string()));
            }
            Ok(fma_object::dump_tree(std::slice::from_ref(item)).to_string())
        }
    }

    fn item() -> Item {
        Item::Action(
            Action::with_id("a1")
                .with_label("Open")
                .with_profile(Profile::new("p1")),
        )
    }

    #[test]
    fn to_file_writes_into_folder() {
        let dir = tempfile::tempdir().unwrap();
        let path = PlainExporter.to_file(&item(), dir.path(), "plain").unwrap();
        assert_eq!(path.file_name().unwrap(), "config_a1.xml");
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("(Action) a1"));
    }

    #[test]
    fn to_file_rejects_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = PlainExporter.to_file(&item(), &missing, "plain").unwrap_err();
        assert!(matches!(err, ExportError::InvalidTarget(_)));
    }

    #[test]
    fn to_buffer_rejects_unknown_format() {
        let err = PlainExporter.to_buffer(&item(), "yaml").unwrap_err();
        assert!(matches!(err, ExportError::InvalidFormat(_)));
    }
}
