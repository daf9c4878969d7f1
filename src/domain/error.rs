// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Every failure in the windowing engine is a programmer or data
// error, never a transient one, so nothing here is retried.
//
//   Configuration  → budgets that leave no room for context,
//                    malformed separator templates, overflowing
//                    assembled sequences
//   Lookup         → an identifier missing from the content store
//   DataIntegrity  → annotations or blocks that contradict the data
//   Io / Parse     → the filesystem collaborators failed
//
// Construction treats Configuration and DataIntegrity as fatal.
// A Lookup failure during indexed access only fails that access.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::block::BlockKind;

/// Errors raised while building or reading windowed samples.
#[derive(Debug, Error)]
pub enum PrepError {
    /// Budget or template is inconsistent.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Identifier absent from the content store.
    #[error("Lookup error: no {kind} block with id '{id}'")]
    Lookup { kind: BlockKind, id: String },

    /// Annotation or block contradicts the underlying data.
    #[error("Data integrity error: {message}")]
    DataIntegrity { message: String },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

impl PrepError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    pub fn lookup(kind: BlockKind, id: impl Into<String>) -> Self {
        Self::Lookup { kind, id: id.into() }
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::DataIntegrity { message: message.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Parse { path: path.into(), message: message.to_string() }
    }

    /// True for the errors that only concern a single lookup.
    pub fn is_lookup(&self) -> bool {
        matches!(self, Self::Lookup { .. })
    }
}

pub type Result<T> = std::result::Result<T, PrepError>;
