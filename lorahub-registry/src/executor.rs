//! The request executor.
//!
//! Issues one call per component in a request tree, concurrently, and
//! collects one `PartialResult` per bucket. A failing call never cancels
//! its siblings — the orchestrator decides rollback policy with the full
//! set of outcomes in hand.

use crate::backend::DeviceBackend;
use crate::error::{RegistryError, RegistryResult};
use crate::split::RequestTree;
use futures::future::join_all;
use lorahub_types::{Component, EndDeviceIds, FieldPath};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// The operation to issue against each component in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    Set,
    Create,
    Delete,
}

/// One component's outcome for one operation.
#[derive(Debug)]
pub struct PartialResult {
    /// The component this result belongs to.
    pub component: Component,
    /// Whether a call was actually issued (false when the component was
    /// skipped as unavailable).
    pub attempted: bool,
    /// The partial record returned; `{}` for skips and ignored not-founds.
    pub record: Value,
    /// The paths this component was asked to cover.
    pub paths: Vec<FieldPath>,
    /// The failure, if the call errored.
    pub error: Option<RegistryError>,
}

impl PartialResult {
    fn skipped(component: Component) -> Self {
        Self {
            component,
            attempted: false,
            record: Value::Object(Map::new()),
            paths: Vec::new(),
            error: None,
        }
    }

    /// Whether the call failed. Holds the invariant that an errored
    /// result always carries its error.
    pub fn errored(&self) -> bool {
        self.error.is_some()
    }

    /// Whether the call was issued and completed without error.
    pub fn succeeded(&self) -> bool {
        self.attempted && self.error.is_none()
    }
}

/// Executes a request tree against the registered backends.
pub struct RequestExecutor<'a> {
    backends: &'a HashMap<Component, Arc<dyn DeviceBackend>>,
    /// Skip buckets whose component has no backend instead of failing the
    /// whole operation.
    ignore_disabled: bool,
}

impl<'a> RequestExecutor<'a> {
    pub fn new(
        backends: &'a HashMap<Component, Arc<dyn DeviceBackend>>,
        ignore_disabled: bool,
    ) -> Self {
        Self {
            backends,
            ignore_disabled,
        }
    }

    /// Issues `op` for every bucket in `tree`, concurrently, and returns
    /// the results in component declaration order.
    ///
    /// With `ignore_not_found`, a backend not-found becomes a successful
    /// empty result — how reads of optional sub-resources avoid failing
    /// the whole operation.
    pub async fn execute(
        &self,
        tree: &RequestTree,
        op: Operation,
        ids: &EndDeviceIds,
        payload: &Value,
        ignore_not_found: bool,
    ) -> RegistryResult<Vec<PartialResult>> {
        let mut calls = Vec::with_capacity(tree.len());
        for (component, paths) in tree {
            let component = *component;
            match self.backends.get(&component) {
                Some(backend) => {
                    calls.push(Self::call(
                        backend.clone(),
                        component,
                        op,
                        ids,
                        payload,
                        paths.clone(),
                        ignore_not_found,
                    ));
                }
                None if self.ignore_disabled => {
                    debug!("component {component} not configured, skipping");
                }
                None => return Err(RegistryError::ComponentUnavailable(component)),
            }
        }

        let mut results: Vec<PartialResult> = join_all(calls).await;
        // Keep skipped components visible to the caller, after the
        // attempted ones' declaration-order block is preserved.
        for component in tree.keys() {
            if !self.backends.contains_key(component) && self.ignore_disabled {
                results.push(PartialResult::skipped(*component));
            }
        }
        results.sort_by_key(|r| r.component);
        Ok(results)
    }

    async fn call(
        backend: Arc<dyn DeviceBackend>,
        component: Component,
        op: Operation,
        ids: &EndDeviceIds,
        payload: &Value,
        paths: Vec<FieldPath>,
        ignore_not_found: bool,
    ) -> PartialResult {
        debug!(
            "issuing {op:?} against {component} for device {} ({} paths)",
            ids.device_id,
            paths.len()
        );
        let outcome = match op {
            Operation::Get => backend.get(ids, &paths).await,
            Operation::Set => backend.set(ids, payload, &paths).await,
            Operation::Create => backend.create(ids, payload).await,
            Operation::Delete => backend.delete(ids).await,
        };
        match outcome {
            Ok(record) => PartialResult {
                component,
                attempted: true,
                record,
                paths,
                error: None,
            },
            Err(source) if ignore_not_found && source.is_not_found() => {
                debug!("{component} has no record for device {}, treating as empty", ids.device_id);
                PartialResult {
                    component,
                    attempted: true,
                    record: Value::Object(Map::new()),
                    paths,
                    error: None,
                }
            }
            Err(source) => {
                warn!("{op:?} against {component} failed for device {}: {source}", ids.device_id);
                PartialResult {
                    component,
                    attempted: true,
                    record: Value::Object(Map::new()),
                    paths,
                    error: Some(RegistryError::from_backend(component, source)),
                }
            }
        }
    }
}
