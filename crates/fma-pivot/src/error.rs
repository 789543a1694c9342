//! Error types for the aggregator

use fma_io::{ExportError, ImportError, IoStatus, ProviderError};
use fma_object::{ObjectError, ValidityError};
use std::path::PathBuf;

/// Errors raised by the pivot
#[derive(Debug, thiserror::Error)]
pub enum PivotError {
    /// Configuration document is not valid
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Provider refused or failed the operation
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Tree operation failed
    #[error(transparent)]
    Object(#[from] ObjectError),

    /// Item fails validation
    #[error("item {id} is not valid: {reason}")]
    Invalid { id: String, reason: ValidityError },

    /// No item with this id
    #[error("item not found: {0}")]
    NotFound(String),

    /// No registered provider exports this format
    #[error("no exporter for format: {0}")]
    NoExporter(String),

    /// No registered provider accepts the document
    #[error("no importer accepts the document")]
    NoImporter,

    /// Export failed
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Import failed
    #[error(transparent)]
    Import(#[from] ImportError),
}

impl PivotError {
    /// Status code when the failure comes from a provider
    #[must_use]
    pub fn status(&self) -> Option<IoStatus> {
        match self {
            Self::Provider(e) => Some(e.status()),
            _ => None,
        }
    }
}

/// Result alias for pivot operations
pub type Result<T> = std::result::Result<T, PivotError>;
