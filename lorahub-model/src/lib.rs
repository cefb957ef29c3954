//! End-device record model for LoraHub.
//!
//! A device record is a composite JSON tree; no single backend holds the
//! whole of it. This crate provides:
//!
//! - **`DeviceRecord`** — a typed envelope over the JSON tree with
//!   path-addressed access, so routing code never indexes raw JSON.
//! - **`merge`** — a pure function folding an ordered list of partial
//!   views (one per backend) into one canonical record.
//!
//! Nothing here performs I/O; the registry crate drives backends and
//! feeds their partial responses through `merge`.

mod merge;
mod record;

pub use merge::{merge, MergeSource};
pub use record::DeviceRecord;
