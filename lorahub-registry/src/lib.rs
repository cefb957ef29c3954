//! Cross-component device registry router for LoraHub.
//!
//! An end-device record is sharded field-by-field across four autonomous
//! backends — the identity registry, the network server, the application
//! server, and the join server. No backend holds the whole record and
//! there is no server-side transaction coordinator; this crate routes
//! reads and writes to the right shards and reassembles the pieces.
//!
//! # Architecture
//!
//! - **Ownership map**: static, direction-sensitive path→owner table
//! - **Splitter**: turns a path set into one bucket of paths per component
//! - **Executor**: issues the per-component calls concurrently and
//!   collects partial results, tolerating configured absence
//! - **Registry**: orchestrates gating reads, the fan-out, merging, and
//!   rollback of partially applied creates
//! - **Bulk import**: sequential, cancellable create over a device list
//!
//! # Operation flow
//!
//! 1. **Route**: compute the paths of interest (selector or patch diff)
//!    and split them by owning component
//! 2. **Gate**: run dependency reads that decide participation (join
//!    capability, cluster membership, EUIs) to completion, in order
//! 3. **Fan out**: issue per-component calls concurrently; one failure
//!    never cancels siblings
//! 4. **Merge or roll back**: fold partial views into one record, or
//!    compensate a partially applied create and surface the first error
//!
//! # Example
//!
//! ```
//! use lorahub_registry::{DeviceRegistry, RegistryConfig};
//!
//! let registry = DeviceRegistry::new(RegistryConfig {
//!     network_server_address: Some("ns.cluster.local".to_string()),
//!     ..Default::default()
//! });
//! // Register one backend per reachable component with `with_backend`,
//! // then drive `get_by_id` / `update_by_id` / `create` / `delete_by_id`.
//! ```

mod backend;
mod bulk;
mod config;
mod error;
mod executor;
mod ownership;
mod router;
mod split;

pub use backend::DeviceBackend;
pub use bulk::{bulk_create, ImportEvent, ImportHandle};
pub use config::RegistryConfig;
pub use error::{BackendError, RegistryError, RegistryResult};
pub use executor::{Operation, PartialResult, RequestExecutor};
pub use ownership::{Direction, OwnershipMap, Owners};
pub use router::{minimum_paths, DeleteOutcome, DeviceRegistry};
pub use split::{insert_path, split, RequestTree};
