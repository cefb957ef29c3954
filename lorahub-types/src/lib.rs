//! Core type definitions for LoraHub.
//!
//! This crate defines the fundamental types shared by the record model and
//! the registry router:
//! - Application/device identifiers and 64-bit hardware EUIs
//! - Typed field paths (ordered dotted segments)
//! - The closed set of backend components a device is sharded across
//!
//! Everything network-facing (backend traits, routing, orchestration)
//! belongs in `lorahub-registry`, not here.

mod component;
mod ids;
mod path;

pub use component::Component;
pub use ids::{ApplicationId, ApplicationIds, DeviceId, EndDeviceIds, Eui64};
pub use path::{field_paths, FieldPath};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid identifier {0:?}: {1}")]
    InvalidId(String, &'static str),

    #[error("invalid EUI {0:?}: expected 16 hex digits")]
    InvalidEui(String),

    #[error("invalid field path {0:?}: {1}")]
    InvalidPath(String, &'static str),

    #[error("unknown component {0:?}")]
    UnknownComponent(String),
}
