//! Shared test fixtures: an in-memory mock backend and id helpers.

#![allow(dead_code)]

use async_trait::async_trait;
use lorahub_registry::{BackendError, DeviceBackend};
use lorahub_types::{ApplicationId, DeviceId, EndDeviceIds, FieldPath};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// One recorded backend invocation, with paths flattened to strings for
/// easy assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Get(Vec<String>),
    Set(Vec<String>),
    Create,
    Delete,
}

/// How a mock call should fail.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    NotFound,
    Request,
}

impl Failure {
    fn to_error(self) -> BackendError {
        match self {
            Failure::NotFound => BackendError::NotFound("end device".to_string()),
            Failure::Request => BackendError::Request("mock backend failure".to_string()),
        }
    }
}

/// In-memory backend: records every call, optionally fails, and remembers
/// the last written payload so reads round-trip.
#[derive(Default)]
pub struct MockBackend {
    pub calls: Mutex<Vec<Call>>,
    pub record: Mutex<Option<Value>>,
    pub get_value: Value,
    pub delete_value: Value,
    pub get_failure: Option<Failure>,
    pub write_failure: Option<Failure>,
    pub delete_failure: Option<Failure>,
    /// When set, `set`/`create` block on a permit after recording the
    /// call; tests release permits to step the backend forward.
    pub pause: Option<Arc<Semaphore>>,
}

impl MockBackend {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self::empty())
    }

    pub fn empty() -> Self {
        Self {
            get_value: json!({}),
            delete_value: json!({}),
            ..Default::default()
        }
    }

    pub fn with_get(value: Value) -> Arc<Self> {
        Arc::new(Self {
            get_value: value,
            ..Self::empty()
        })
    }

    pub fn failing_writes(failure: Failure) -> Arc<Self> {
        Arc::new(Self {
            write_failure: Some(failure),
            ..Self::empty()
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// The payload of the most recent `set`/`create`.
    pub fn last_payload(&self) -> Option<Value> {
        self.record.lock().unwrap().clone()
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    async fn wait_if_paused(&self) {
        if let Some(gate) = &self.pause {
            gate.acquire().await.unwrap().forget();
        }
    }
}

fn strings(paths: &[FieldPath]) -> Vec<String> {
    paths.iter().map(FieldPath::to_string).collect()
}

#[async_trait]
impl DeviceBackend for MockBackend {
    async fn get(&self, _ids: &EndDeviceIds, paths: &[FieldPath]) -> Result<Value, BackendError> {
        self.push(Call::Get(strings(paths)));
        if let Some(failure) = self.get_failure {
            return Err(failure.to_error());
        }
        let written = self.record.lock().unwrap().clone();
        Ok(written.unwrap_or_else(|| self.get_value.clone()))
    }

    async fn set(
        &self,
        _ids: &EndDeviceIds,
        device: &Value,
        paths: &[FieldPath],
    ) -> Result<Value, BackendError> {
        self.push(Call::Set(strings(paths)));
        self.wait_if_paused().await;
        if let Some(failure) = self.write_failure {
            return Err(failure.to_error());
        }
        *self.record.lock().unwrap() = Some(device.clone());
        Ok(device.clone())
    }

    async fn create(&self, _ids: &EndDeviceIds, device: &Value) -> Result<Value, BackendError> {
        self.push(Call::Create);
        self.wait_if_paused().await;
        if let Some(failure) = self.write_failure {
            return Err(failure.to_error());
        }
        *self.record.lock().unwrap() = Some(device.clone());
        Ok(device.clone())
    }

    async fn delete(&self, _ids: &EndDeviceIds) -> Result<Value, BackendError> {
        self.push(Call::Delete);
        if let Some(failure) = self.delete_failure {
            return Err(failure.to_error());
        }
        Ok(self.delete_value.clone())
    }
}

/// Installs a log subscriber once, so `RUST_LOG=debug cargo test` shows
/// the router's routing and rollback decisions.
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

pub fn app() -> ApplicationId {
    ApplicationId::parse("test-app").unwrap()
}

pub fn dev() -> DeviceId {
    DeviceId::parse("test-dev").unwrap()
}

pub fn p(s: &str) -> FieldPath {
    FieldPath::parse(s).unwrap()
}
