//! Identifier types for end devices.
//!
//! Application and device identifiers are human-chosen slugs; EUIs are
//! 64-bit hardware identifiers assigned at manufacture. All of them travel
//! in the `ids` block of a device record.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MAX_ID_LEN: usize = 36;

/// Validates the slug form shared by application and device identifiers:
/// lowercase alphanumerics and dashes, starting with a letter, not ending
/// with a dash, at most 36 characters.
fn validate_id(s: &str) -> Result<()> {
    let err = |reason| Err(Error::InvalidId(s.to_string(), reason));
    if s.is_empty() {
        return err("must not be empty");
    }
    if s.len() > MAX_ID_LEN {
        return err("too long");
    }
    if !s.chars().next().is_some_and(|c| c.is_ascii_lowercase()) {
        return err("must start with a lowercase letter");
    }
    if s.ends_with('-') {
        return err("must not end with a dash");
    }
    if !s
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return err("must contain only lowercase alphanumerics and dashes");
    }
    Ok(())
}

/// Identifier of an application owning a set of end devices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(String);

impl ApplicationId {
    /// Parses and validates an application identifier.
    pub fn parse(s: &str) -> Result<Self> {
        validate_id(s)?;
        Ok(Self(s.to_string()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ApplicationId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Identifier of an end device, unique within its application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Parses and validates a device identifier.
    pub fn parse(s: &str) -> Result<Self> {
        validate_id(s)?;
        Ok(Self(s.to_string()))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DeviceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A 64-bit extended unique identifier (device EUI or join EUI).
///
/// Displayed and serialized as 16 uppercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Eui64([u8; 8]);

impl Eui64 {
    /// Creates an EUI from raw bytes.
    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Parses an EUI from 16 hex digits, case-insensitive.
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() != 16 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidEui(s.to_string()));
        }
        let mut bytes = [0u8; 8];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| Error::InvalidEui(s.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for Eui64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

impl FromStr for Eui64 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Eui64 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Eui64 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// The application sub-block inside `ids`, kept as its own struct so the
/// serialized shape matches the wire form of the identity registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationIds {
    pub application_id: ApplicationId,
}

/// The identity block of an end device record.
///
/// Serializes to the `ids` sub-object:
/// `{"application_ids": {"application_id": ...}, "device_id": ..., "dev_eui": ..., "join_eui": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndDeviceIds {
    pub application_ids: ApplicationIds,
    pub device_id: DeviceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_eui: Option<Eui64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub join_eui: Option<Eui64>,
}

impl EndDeviceIds {
    /// Builds an identity block from an application and device id.
    pub fn new(application_id: ApplicationId, device_id: DeviceId) -> Self {
        Self {
            application_ids: ApplicationIds { application_id },
            device_id,
            dev_eui: None,
            join_eui: None,
        }
    }

    /// Sets the device EUI.
    pub fn with_dev_eui(mut self, eui: Eui64) -> Self {
        self.dev_eui = Some(eui);
        self
    }

    /// Sets the join EUI.
    pub fn with_join_eui(mut self, eui: Eui64) -> Self {
        self.join_eui = Some(eui);
        self
    }

    /// Returns the application identifier.
    pub fn application_id(&self) -> &ApplicationId {
        &self.application_ids.application_id
    }

    /// Whether both hardware EUIs are present (required for join-server
    /// provisioning).
    pub fn has_euis(&self) -> bool {
        self.dev_eui.is_some() && self.join_eui.is_some()
    }
}
