//! The backend seam.
//!
//! Each component is driven through this trait; the embedder supplies one
//! implementation per reachable component (HTTP, gRPC, in-process — the
//! router does not care). Timeouts and authentication are implementation
//! concerns.

use crate::error::BackendError;
use async_trait::async_trait;
use lorahub_types::{EndDeviceIds, FieldPath};
use serde_json::Value;

/// One component's device operations.
///
/// All calls are scoped to a single device by its identity block. `paths`
/// restricts the fields involved to the ones this component owns for the
/// operation at hand; backends must not return or touch fields outside
/// them.
#[async_trait]
pub trait DeviceBackend: Send + Sync {
    /// Fetches the partial record for the given paths.
    async fn get(&self, ids: &EndDeviceIds, paths: &[FieldPath]) -> Result<Value, BackendError>;

    /// Applies the given paths of `device` to an existing record and
    /// returns the resulting partial record.
    async fn set(
        &self,
        ids: &EndDeviceIds,
        device: &Value,
        paths: &[FieldPath],
    ) -> Result<Value, BackendError>;

    /// Creates this component's share of a new device.
    async fn create(&self, ids: &EndDeviceIds, device: &Value) -> Result<Value, BackendError>;

    /// Deletes everything this component holds for the device. An empty
    /// object response means nothing is left.
    async fn delete(&self, ids: &EndDeviceIds) -> Result<Value, BackendError>;
}
