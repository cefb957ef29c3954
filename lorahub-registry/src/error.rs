//! Error types for the registry router.

use lorahub_types::{Component, FieldPath};
use thiserror::Error;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// What a single backend call can fail with.
///
/// Backends are opaque request/response functions supplied by the
/// embedder; this is the whole error surface the router sees from them.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The addressed sub-resource does not exist on this backend.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other backend failure (transport, server-side, decode).
    #[error("request failed: {0}")]
    Request(String),
}

impl BackendError {
    /// Whether this failure is an absence, not an error condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::NotFound(_))
    }
}

/// Errors surfaced to callers of the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Bad or missing identifiers — the caller's fault, never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// A field path with no ownership entry — a configuration error,
    /// never retried.
    #[error("no ownership entry for field path {0:?}")]
    UnknownPath(FieldPath),

    /// A required component has no registered backend.
    #[error("component {0} is not available")]
    ComponentUnavailable(Component),

    /// A backend reported the device absent where absence is an error.
    #[error("device not found on {component}")]
    NotFound { component: Component },

    /// A backend call failed. On create, this triggers rollback of the
    /// sibling calls that succeeded.
    #[error("{component} request failed: {source}")]
    Backend {
        component: Component,
        source: BackendError,
    },
}

impl RegistryError {
    /// Wraps a backend failure, classifying not-found separately.
    pub(crate) fn from_backend(component: Component, source: BackendError) -> Self {
        if source.is_not_found() {
            RegistryError::NotFound { component }
        } else {
            RegistryError::Backend { component, source }
        }
    }
}
