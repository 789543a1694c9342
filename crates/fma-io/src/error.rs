//! Provider status codes and errors
//!
//! Writability failures carry a specific [`IoStatus`] so callers can
//! tell an admin lock from a missing provider or a read-only item.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Outcome code of a provider operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IoStatus {
    /// Success
    Ok,
    /// Item is read-only
    ItemReadonly,
    /// Provider does not accept writes at all
    ProviderNotWilling,
    /// No provider can take the item
    NoProviderFound,
    /// Provider locked by the administrator
    ProviderLockedByAdmin,
    /// Provider locked by the user
    ProviderLockedByUser,
    /// Provider does not implement the operation
    NoApi,
    /// Whole configuration locked by the administrator
    ConfigurationLockedByAdmin,
    /// Backend-specific failure
    WriteError,
    /// Contract violation by the caller
    ProgramError,
}

impl IoStatus {
    /// Upper-case code name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::ItemReadonly => "ITEM_READONLY",
            Self::ProviderNotWilling => "PROVIDER_NOT_WILLING",
            Self::NoProviderFound => "NO_PROVIDER_FOUND",
            Self::ProviderLockedByAdmin => "PROVIDER_LOCKED_BY_ADMIN",
            Self::ProviderLockedByUser => "PROVIDER_LOCKED_BY_USER",
            Self::NoApi => "NO_API",
            Self::ConfigurationLockedByAdmin => "CONFIGURATION_LOCKED_BY_ADMIN",
            Self::WriteError => "WRITE_ERROR",
            Self::ProgramError => "PROGRAM_ERROR",
        }
    }

    /// Whether the code denotes success
    #[inline]
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for IoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failed provider operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Item is read-only
    #[error("item is read-only: {0}")]
    ItemReadonly(String),

    /// Provider refuses writes
    #[error("provider is not willing to write: {0}")]
    NotWilling(String),

    /// No provider available for the item
    #[error("no provider found for item: {0}")]
    NoProviderFound(String),

    /// Provider locked by the administrator
    #[error("provider locked by administrator: {0}")]
    LockedByAdmin(String),

    /// Provider locked by the user
    #[error("provider locked by user: {0}")]
    LockedByUser(String),

    /// Operation not implemented by the provider
    #[error("operation not implemented by provider: {0}")]
    NoApi(String),

    /// Configuration locked by the administrator
    #[error("configuration locked by administrator")]
    ConfigurationLocked,

    /// Backend failure with a human-readable message
    #[error("write error: {0}")]
    Write(String),

    /// Caller broke the provider contract
    #[error("program error: {0}")]
    Program(String),
}

impl ProviderError {
    /// Create write error
    pub fn write(message: impl Into<String>) -> Self {
        Self::Write(message.into())
    }

    /// Create program error
    pub fn program(message: impl Into<String>) -> Self {
        Self::Program(message.into())
    }

    /// Create write error from an I/O failure on `path`
    pub fn io(path: impl Into<PathBuf>, source: &std::io::Error) -> Self {
        Self::Write(format!("{}: {source}", path.into().display()))
    }

    /// Status code of the failure
    #[must_use]
    pub const fn status(&self) -> IoStatus {
        match self {
            Self::ItemReadonly(_) => IoStatus::ItemReadonly,
            Self::NotWilling(_) => IoStatus::ProviderNotWilling,
            Self::NoProviderFound(_) => IoStatus::NoProviderFound,
            Self::LockedByAdmin(_) => IoStatus::ProviderLockedByAdmin,
            Self::LockedByUser(_) => IoStatus::ProviderLockedByUser,
            Self::NoApi(_) => IoStatus::NoApi,
            Self::ConfigurationLocked => IoStatus::ConfigurationLockedByAdmin,
            Self::Write(_) => IoStatus::WriteError,
            Self::Program(_) => IoStatus::ProgramError,
        }
    }
}

/// Failed export
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Item cannot be exported, e.g. invalid or a bare profile
    #[error("invalid item: {0}")]
    InvalidItem(String),

    /// Target folder is missing or not a directory
    #[error("invalid target folder: {}", .0.display())]
    InvalidTarget(PathBuf),

    /// Format not offered by the exporter
    #[error("invalid export format: {0}")]
    InvalidFormat(String),

    /// Output could not be written
    #[error("unable to write {path}: {source}")]
    UnableToWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encoder failure
    #[error("export error: {0}")]
    Encode(String),
}

/// Failed import
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Input could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document is not in a format this importer handles
    #[error("not willing to import: {0}")]
    NotWilling(String),

    /// Document is recognized but malformed
    #[error("invalid document: {0}")]
    Invalid(String),

    /// Imported item fails validation
    #[error("imported item is not valid: {0}")]
    InvalidItem(String),
}

impl ImportError {
    /// Create invalid document error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}
