//! The backend components a device record is sharded across.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four autonomous backends holding a subset of a device's
/// fields.
///
/// Declaration order is load-bearing: it is the stable order used for
/// merge precedence, first-error selection among failed siblings, and
/// rollback iteration. `Ord` therefore follows declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Component {
    /// The identity registry (`is`) — canonical device metadata.
    #[serde(rename = "is")]
    IdentityServer,
    /// The network server (`ns`) — MAC and session state.
    #[serde(rename = "ns")]
    NetworkServer,
    /// The application server (`as`) — payload handling.
    #[serde(rename = "as")]
    ApplicationServer,
    /// The join server (`js`) — key provisioning for OTAA devices.
    #[serde(rename = "js")]
    JoinServer,
}

impl Component {
    /// All components, in declaration order.
    pub const ALL: [Component; 4] = [
        Component::IdentityServer,
        Component::NetworkServer,
        Component::ApplicationServer,
        Component::JoinServer,
    ];

    /// The short name used in configuration and logs.
    pub fn short_name(&self) -> &'static str {
        match self {
            Component::IdentityServer => "is",
            Component::NetworkServer => "ns",
            Component::ApplicationServer => "as",
            Component::JoinServer => "js",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for Component {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "is" => Ok(Component::IdentityServer),
            "ns" => Ok(Component::NetworkServer),
            "as" => Ok(Component::ApplicationServer),
            "js" => Ok(Component::JoinServer),
            other => Err(Error::UnknownComponent(other.to_string())),
        }
    }
}
