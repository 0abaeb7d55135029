//! Error taxonomy shared by the ingest and query paths.
//!
//! Routine absence (no index yet for a tenant) is not an error here; it is
//! reported through [`LoadOutcome`](crate::store::LoadOutcome). These
//! variants cover failures a caller has to act on.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    /// Input produced no chunks. Not fatal; the caller decides.
    #[error("content produced no chunks")]
    EmptyContent,

    /// The embedding capability failed or returned misaligned vectors.
    #[error("embedding failed: {message}")]
    Embedding { message: String, transient: bool },

    /// Reading or writing a persisted file failed.
    #[error("persistence failed at {}: {message}", path.display())]
    Persistence { path: PathBuf, message: String },

    /// Persisted state is inconsistent and could not be repaired.
    #[error("index for tenant '{tenant}' is corrupt: {reason}")]
    Corrupt { tenant: String, reason: String },

    /// No usable index exists for the tenant.
    #[error("search unavailable for tenant '{tenant}': {reason}")]
    SearchUnavailable { tenant: String, reason: String },

    /// The generation capability failed.
    #[error("generation failed: {message}")]
    Generation { message: String, transient: bool },

    #[error("invalid tenant identifier: {0:?}")]
    InvalidTenant(String),

    /// A capability is not configured for the requested operation.
    #[error("configuration error: {0}")]
    Config(String),
}

impl RagError {
    pub fn persistence(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        RagError::Persistence {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// A permanent embedding failure.
    pub fn embedding(message: impl Into<String>) -> Self {
        RagError::Embedding {
            message: message.into(),
            transient: false,
        }
    }

    pub fn unavailable(tenant: &str, reason: impl Into<String>) -> Self {
        RagError::SearchUnavailable {
            tenant: tenant.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether retrying the same capability call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RagError::Embedding {
                transient: true,
                ..
            } | RagError::Generation {
                transient: true,
                ..
            }
        )
    }
}
