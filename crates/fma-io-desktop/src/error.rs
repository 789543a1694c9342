//! Desktop provider errors

use crate::keyfile::KeyFileError;
use fma_io::ProviderError;
use std::path::PathBuf;

/// Failure on one desktop file
#[derive(Debug, thiserror::Error)]
pub enum DesktopError {
    /// File could not be read or written
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed key file
    #[error(transparent)]
    KeyFile(#[from] KeyFileError),

    /// First group is not the desktop entry group
    #[error("invalid start group '{0}'")]
    InvalidStartGroup(String),

    /// `Type` is neither an action nor a menu
    #[error("unknown item type '{0}'")]
    UnknownType(String),

    /// File name does not carry an id
    #[error("no item id in file name {}", .0.display())]
    NoId(PathBuf),

    /// Field marshaling failed
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl DesktopError {
    /// Create I/O error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<DesktopError> for ProviderError {
    fn from(err: DesktopError) -> Self {
        match err {
            DesktopError::Provider(inner) => inner,
            other => ProviderError::write(other.to_string()),
        }
    }
}

/// Result type for desktop file operations
pub type Result<T> = std::result::Result<T, DesktopError>;
