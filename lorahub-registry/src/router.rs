//! Device registry orchestration.
//!
//! A full read, write, create, or delete runs as explicit phases:
//! gating reads that decide which components participate (executed in
//! sequence, to completion, before anything else), then one concurrent
//! fan-out over the request tree, then merge — or, for a partially failed
//! create, best-effort rollback.

use crate::backend::DeviceBackend;
use crate::config::RegistryConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::executor::{Operation, PartialResult, RequestExecutor};
use crate::ownership::{Direction, OwnershipMap};
use crate::split::{insert_path, split, RequestTree};
use lorahub_model::{merge, DeviceRecord, MergeSource};
use lorahub_types::{ApplicationId, Component, DeviceId, EndDeviceIds, Eui64, FieldPath};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Identity fields folded into every merge whether or not they were
/// requested.
pub fn minimum_paths() -> Vec<FieldPath> {
    ["ids", "created_at", "updated_at"]
        .into_iter()
        .map(top_level)
        .collect()
}

fn top_level(segment: &str) -> FieldPath {
    FieldPath::from_segments(vec![segment.to_string()])
}

/// Outcome of a delete across components.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    /// Every component reported an empty object: nothing is left.
    Deleted,
    /// One or more components reported residual state, returned raw for
    /// inspection.
    Residual(BTreeMap<Component, Value>),
}

/// The cross-component entity router for end-device records.
///
/// Owns the ownership map, the registered backends, and the orchestration
/// logic; shared state is read-only, so a registry can be wrapped in an
/// `Arc` and used from many tasks.
pub struct DeviceRegistry {
    config: RegistryConfig,
    ownership: OwnershipMap,
    backends: HashMap<Component, Arc<dyn DeviceBackend>>,
}

impl DeviceRegistry {
    /// Creates a registry with the built-in end-device ownership map and
    /// no backends.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            ownership: OwnershipMap::for_end_devices(),
            backends: HashMap::new(),
        }
    }

    /// Registers the backend for a component.
    pub fn with_backend(
        mut self,
        component: Component,
        backend: Arc<dyn DeviceBackend>,
    ) -> Self {
        self.backends.insert(component, backend);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Returns the ownership map.
    pub fn ownership(&self) -> &OwnershipMap {
        &self.ownership
    }

    fn executor(&self) -> RequestExecutor<'_> {
        RequestExecutor::new(&self.backends, self.config.ignore_disabled)
    }

    // ── Read ─────────────────────────────────────────────────────

    /// Reads a device, merging the partial views of every component that
    /// owns a selected field. A component lacking a sub-resource for this
    /// device is not an error.
    pub async fn get_by_id(
        &self,
        application_id: &ApplicationId,
        device_id: &DeviceId,
        selector: &[FieldPath],
    ) -> RegistryResult<DeviceRecord> {
        let ids = EndDeviceIds::new(application_id.clone(), device_id.clone());
        self.fetch(&ids, selector).await
    }

    async fn fetch(
        &self,
        ids: &EndDeviceIds,
        selector: &[FieldPath],
    ) -> RegistryResult<DeviceRecord> {
        let mut paths = minimum_paths();
        for path in selector {
            insert_path(&mut paths, path);
        }
        let tree = split(&self.ownership, &paths, Direction::Read)?;
        let mut results = self
            .executor()
            .execute(&tree, Operation::Get, ids, &Value::Null, true)
            .await?;
        if let Some(error) = first_error(&mut results) {
            return Err(error);
        }
        Ok(merged(results))
    }

    // ── Write ────────────────────────────────────────────────────

    /// Updates an existing device from a patch. The paths written are
    /// derived from the patch's leaves.
    pub async fn update_by_id(
        &self,
        application_id: &ApplicationId,
        device_id: &DeviceId,
        patch: DeviceRecord,
    ) -> RegistryResult<DeviceRecord> {
        self.write(application_id, Some(device_id), patch, false).await
    }

    /// Creates a device across every component it must exist on. A
    /// partial failure triggers best-effort rollback of the components
    /// that succeeded.
    pub async fn create(
        &self,
        application_id: &ApplicationId,
        device: DeviceRecord,
    ) -> RegistryResult<DeviceRecord> {
        self.write(application_id, None, device, true).await
    }

    async fn write(
        &self,
        application_id: &ApplicationId,
        device_id: Option<&DeviceId>,
        mut patch: DeviceRecord,
        create: bool,
    ) -> RegistryResult<DeviceRecord> {
        // Identifier normalization: the patch's ids block and the call
        // arguments must agree, and the normalized block travels with the
        // patch to every component.
        let mut ids = normalize_ids(&mut patch, application_id, device_id)?;

        // Minimal path set: every patch leaf, at the granularity the
        // ownership map distinguishes, without ancestor/descendant
        // duplication.
        let mut paths: Vec<FieldPath> = Vec::new();
        for leaf in patch.leaf_paths() {
            let path = self
                .ownership
                .deepest_prefix(&leaf)
                .ok_or(RegistryError::UnknownPath(leaf))?;
            insert_path(&mut paths, &path);
        }
        let mut tree = split(&self.ownership, &paths, Direction::Write)?;

        // A device only counts as created once the network, application,
        // and join servers know it, so creates seed an identity baseline
        // into those buckets. The join seed is still subject to the
        // capability gate below.
        if create {
            for component in [
                Component::NetworkServer,
                Component::ApplicationServer,
                Component::JoinServer,
            ] {
                insert_path(tree.entry(component).or_default(), &top_level("ids"));
            }
        }

        // Gating phase: dependency reads that decide which components
        // participate. These run to completion, in order, strictly before
        // the fan-out, and their failures propagate immediately.
        let mut supports_join = patch.get_bool(&top_level("supports_join"));
        let needs_capability = !create && supports_join.is_none();
        let needs_cluster_check = !create && tree.contains_key(&Component::ApplicationServer);

        let mut gate_selector: Vec<FieldPath> = Vec::new();
        if needs_capability {
            gate_selector.push(top_level("supports_join"));
            gate_selector.push(top_level("join_server_address"));
        }
        if needs_cluster_check {
            gate_selector.push(top_level("network_server_address"));
            gate_selector.push(top_level("application_server_address"));
        }
        let gate_record = if gate_selector.is_empty() {
            None
        } else {
            debug!(
                "gating read for device {} ({} fields)",
                ids.device_id,
                gate_selector.len()
            );
            Some(self.fetch(&ids, &gate_selector).await?)
        };

        if needs_capability {
            supports_join = gate_record
                .as_ref()
                .and_then(|record| record.get_bool(&top_level("supports_join")));
        }
        if !supports_join.unwrap_or(false) && tree.remove(&Component::JoinServer).is_some() {
            debug!(
                "device {} does not support join, dropping the join-server bucket",
                ids.device_id
            );
        }

        if let Some(record) = gate_record.as_ref().filter(|_| needs_cluster_check) {
            let foreign = address_mismatch(
                record.get_str(&top_level("network_server_address")),
                self.config.network_server_address.as_deref(),
            ) || address_mismatch(
                record.get_str(&top_level("application_server_address")),
                self.config.application_server_address.as_deref(),
            );
            if foreign && tree.remove(&Component::ApplicationServer).is_some() {
                info!(
                    "device {} is managed by another cluster, skipping the application-server write",
                    ids.device_id
                );
            }
        }

        // Dependent keys: the join server is addressed by EUIs, so a
        // surviving join bucket needs them resolved before the fan-out.
        if tree.contains_key(&Component::JoinServer) && !ids.has_euis() {
            if !create {
                let current = self.fetch(&ids, &[top_level("ids")]).await?;
                if let Some(fetched) = current.ids() {
                    ids.dev_eui = ids.dev_eui.or(fetched.dev_eui);
                    ids.join_eui = ids.join_eui.or(fetched.join_eui);
                }
            }
            if !ids.has_euis() {
                return Err(RegistryError::Validation(format!(
                    "join-server provisioning for device {} requires dev_eui and join_eui",
                    ids.device_id
                )));
            }
            patch.set_ids(&ids);
        }

        // Fan-out phase: every surviving bucket, concurrently.
        let op = if create { Operation::Create } else { Operation::Set };
        info!(
            "writing device {} across {} components",
            ids.device_id,
            tree.len()
        );
        let mut results = self
            .executor()
            .execute(&tree, op, &ids, patch.as_value(), false)
            .await?;

        // All siblings have completed; pick the first failure by
        // declaration order, rolling back a partially applied create
        // first.
        if results.iter().any(PartialResult::errored) {
            if create {
                self.rollback(&ids, &results).await;
            }
            if let Some(error) = first_error(&mut results) {
                return Err(error);
            }
        }

        Ok(merged(results))
    }

    /// Best-effort compensating deletes against every component whose
    /// create succeeded. Failures here are logged and swallowed so they
    /// never mask the original error.
    async fn rollback(&self, ids: &EndDeviceIds, results: &[PartialResult]) {
        let succeeded: RequestTree = results
            .iter()
            .filter(|result| result.succeeded())
            .map(|result| (result.component, Vec::new()))
            .collect();
        if succeeded.is_empty() {
            return;
        }
        warn!(
            "create of device {} failed part-way, rolling back {} components",
            ids.device_id,
            succeeded.len()
        );
        match self
            .executor()
            .execute(&succeeded, Operation::Delete, ids, &Value::Null, true)
            .await
        {
            Ok(outcomes) => {
                for outcome in outcomes.iter().filter(|outcome| outcome.errored()) {
                    warn!(
                        "rollback delete on {} failed for device {}",
                        outcome.component, ids.device_id
                    );
                }
            }
            Err(error) => warn!("rollback aborted for device {}: {error}", ids.device_id),
        }
    }

    // ── Delete ───────────────────────────────────────────────────

    /// Deletes everything the given components (default: all four) hold
    /// for a device. Absence on a component is success; residual state is
    /// returned raw for inspection.
    pub async fn delete_by_id(
        &self,
        application_id: &ApplicationId,
        device_id: &DeviceId,
        components: Option<&[Component]>,
    ) -> RegistryResult<DeleteOutcome> {
        let ids = EndDeviceIds::new(application_id.clone(), device_id.clone());
        let components = components.unwrap_or(&Component::ALL);
        let tree: RequestTree = components
            .iter()
            .map(|component| (*component, Vec::new()))
            .collect();
        let mut results = self
            .executor()
            .execute(&tree, Operation::Delete, &ids, &Value::Null, true)
            .await?;
        if let Some(error) = first_error(&mut results) {
            return Err(error);
        }
        let residual: BTreeMap<Component, Value> = results
            .into_iter()
            .filter(|result| result.attempted && !is_empty_response(&result.record))
            .map(|result| (result.component, result.record))
            .collect();
        if residual.is_empty() {
            Ok(DeleteOutcome::Deleted)
        } else {
            info!(
                "delete of device {} left residual state on {} components",
                device_id,
                residual.len()
            );
            Ok(DeleteOutcome::Residual(residual))
        }
    }
}

/// The first error among sibling results, in component declaration order.
fn first_error(results: &mut [PartialResult]) -> Option<RegistryError> {
    results.iter_mut().find_map(|result| result.error.take())
}

/// Merges attempted, non-errored results in declaration order.
fn merged(results: Vec<PartialResult>) -> DeviceRecord {
    let sources: Vec<MergeSource> = results
        .into_iter()
        .filter(|result| result.succeeded())
        .map(|result| MergeSource::new(result.record, result.paths))
        .collect();
    merge(&sources, DeviceRecord::new(), &minimum_paths())
}

fn is_empty_response(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// A recorded address that differs from the configured one marks the
/// device as managed by another deployment.
fn address_mismatch(recorded: Option<&str>, configured: Option<&str>) -> bool {
    matches!(recorded, Some(recorded) if configured != Some(recorded))
}

/// Ensures the patch's ids block agrees with the call arguments, filling
/// either side from the other, and returns the normalized block.
fn normalize_ids(
    patch: &mut DeviceRecord,
    application_id: &ApplicationId,
    device_id: Option<&DeviceId>,
) -> RegistryResult<EndDeviceIds> {
    let invalid = |error: lorahub_types::Error| RegistryError::Validation(error.to_string());

    let app_path = FieldPath::from_segments(vec![
        "ids".to_string(),
        "application_ids".to_string(),
        "application_id".to_string(),
    ]);
    if let Some(embedded) = patch.get_str(&app_path) {
        if embedded != application_id.as_str() {
            return Err(RegistryError::Validation(format!(
                "application id mismatch: operation targets {application_id}, patch names {embedded}"
            )));
        }
    }

    let dev_path = FieldPath::from_segments(vec!["ids".to_string(), "device_id".to_string()]);
    let embedded = patch.get_str(&dev_path).map(str::to_string);
    let device_id = match (device_id, embedded) {
        (Some(argument), Some(embedded)) if argument.as_str() != embedded => {
            return Err(RegistryError::Validation(format!(
                "device id mismatch: operation targets {argument}, patch names {embedded}"
            )));
        }
        (Some(argument), _) => argument.clone(),
        (None, Some(embedded)) => DeviceId::parse(&embedded).map_err(invalid)?,
        (None, None) => {
            return Err(RegistryError::Validation(
                "missing device id: not in the call nor in the patch".to_string(),
            ));
        }
    };

    let eui_at = |patch: &DeviceRecord, segment: &str| -> RegistryResult<Option<Eui64>> {
        let path = FieldPath::from_segments(vec!["ids".to_string(), segment.to_string()]);
        patch
            .get_str(&path)
            .map(|raw| Eui64::parse(raw).map_err(invalid))
            .transpose()
    };
    let dev_eui = eui_at(patch, "dev_eui")?;
    let join_eui = eui_at(patch, "join_eui")?;

    let mut ids = EndDeviceIds::new(application_id.clone(), device_id);
    ids.dev_eui = dev_eui;
    ids.join_eui = join_eui;
    patch.set_ids(&ids);
    Ok(ids)
}
