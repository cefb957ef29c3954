//! Configuration for the registry router.

use serde::{Deserialize, Serialize};

/// Configuration for a `DeviceRegistry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Skip components with no registered backend instead of failing the
    /// operation that routes to them.
    pub ignore_disabled: bool,
    /// This cluster's network server host. Compared against the address
    /// recorded on a device to detect devices managed elsewhere.
    pub network_server_address: Option<String>,
    /// This cluster's application server host.
    pub application_server_address: Option<String>,
    /// This cluster's join server host.
    pub join_server_address: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            ignore_disabled: true,
            network_server_address: None,
            application_server_address: None,
            join_server_address: None,
        }
    }
}
