//! The field-ownership map.
//!
//! A static, direction-sensitive lookup table from field path to owning
//! component(s). Reads and writes may route the same path to different
//! owners: `lorawan_version` is authoritatively read from the network
//! server but must be written to the join server too, and the
//! `*_server_address` pointers are readable from the identity registry
//! while each belongs to its own component.
//!
//! Lookup resolves the deepest matching prefix; a branch node's `root`
//! entry is the default for any deeper segment without an explicit child.

use lorahub_types::{Component, FieldPath};
use std::collections::BTreeMap;

/// The direction an operation routes in. Required, never inferred: the
/// same path can have different owners per direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// Per-direction owner lists for one map node.
#[derive(Debug, Clone)]
pub struct Owners {
    read: Vec<Component>,
    write: Vec<Component>,
}

impl Owners {
    fn new(read: &[Component], write: &[Component]) -> Self {
        Self {
            read: read.to_vec(),
            write: write.to_vec(),
        }
    }

    /// The owners for the given direction.
    pub fn for_direction(&self, direction: Direction) -> &[Component] {
        match direction {
            Direction::Read => &self.read,
            Direction::Write => &self.write,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(Owners),
    Branch {
        /// Default owners for descendants without an explicit child entry
        /// (the `_root` sentinel of the serialized map form).
        root: Option<Owners>,
        children: BTreeMap<String, Node>,
    },
}

impl Node {
    fn owners(&self) -> Option<&Owners> {
        match self {
            Node::Leaf(owners) => Some(owners),
            Node::Branch { root, .. } => root.as_ref(),
        }
    }
}

/// Immutable path→owner lookup table, loaded once per registry.
#[derive(Debug, Clone)]
pub struct OwnershipMap {
    top: BTreeMap<String, Node>,
}

impl OwnershipMap {
    /// Resolves the owners of `path` for `direction`.
    ///
    /// Walks to the deepest matching prefix and returns the owners of the
    /// deepest node that declares any, so a path below a leaf (or below a
    /// branch with a `root` default) inherits from its ancestor. Returns
    /// `None` when the top-level segment has no entry at all — callers
    /// treat that as a configuration error, not a silent no-op.
    pub fn resolve(&self, path: &FieldPath, direction: Direction) -> Option<&[Component]> {
        let mut node = self.top.get(path.head())?;
        let mut best = node.owners();
        for segment in &path.segments()[1..] {
            let Node::Branch { children, .. } = node else {
                break;
            };
            match children.get(segment) {
                Some(child) => {
                    node = child;
                    best = node.owners().or(best);
                }
                None => break,
            }
        }
        best.map(|owners| owners.for_direction(direction))
    }

    /// The longest prefix of `path` that exists as an explicit map node.
    ///
    /// Used to minimize patch-derived path sets: a patched leaf is
    /// requested at the granularity the map distinguishes, not at its raw
    /// depth.
    pub fn deepest_prefix(&self, path: &FieldPath) -> Option<FieldPath> {
        let mut node = self.top.get(path.head())?;
        let mut depth = 1;
        for (i, segment) in path.segments()[1..].iter().enumerate() {
            let Node::Branch { children, .. } = node else {
                break;
            };
            match children.get(segment) {
                Some(child) => {
                    node = child;
                    depth = i + 2;
                }
                None => break,
            }
        }
        Some(path.prefix(depth))
    }

    /// The built-in ownership table for end-device fields across the four
    /// components.
    pub fn for_end_devices() -> Self {
        use Component::{ApplicationServer as AS, IdentityServer as IS, JoinServer as JS, NetworkServer as NS};

        let mut top = BTreeMap::new();
        let mut leaf = |key: &str, read: &[Component], write: &[Component]| {
            top.insert(key.to_string(), Node::Leaf(Owners::new(read, write)));
        };

        // Identity registry: canonical metadata and component pointers.
        leaf("ids", &[IS], &[IS]);
        leaf("created_at", &[IS], &[IS]);
        leaf("updated_at", &[IS], &[IS]);
        leaf("name", &[IS], &[IS]);
        leaf("description", &[IS], &[IS]);
        leaf("attributes", &[IS], &[IS]);
        leaf("version_ids", &[IS], &[IS]);
        leaf("locations", &[IS], &[IS]);
        leaf("picture", &[IS], &[IS]);
        leaf("network_server_address", &[IS], &[IS]);
        leaf("application_server_address", &[IS], &[IS]);
        leaf("join_server_address", &[IS], &[IS]);
        leaf("supports_join", &[IS], &[IS, NS]);

        // Network server: MAC, class, and session state.
        leaf("lorawan_version", &[NS], &[NS, JS]);
        leaf("lorawan_phy_version", &[NS], &[NS]);
        leaf("frequency_plan_id", &[NS], &[NS]);
        leaf("supports_class_b", &[NS], &[NS]);
        leaf("supports_class_c", &[NS], &[NS]);
        leaf("multicast", &[NS], &[NS]);
        leaf("mac_settings", &[NS], &[NS]);
        leaf("mac_state", &[NS], &[NS]);

        // Session state defaults to the network server, but the
        // application session key lives on the application server.
        let mut keys_children = BTreeMap::new();
        keys_children.insert(
            "app_s_key".to_string(),
            Node::Leaf(Owners::new(&[AS], &[AS])),
        );
        let mut session_children = BTreeMap::new();
        session_children.insert(
            "keys".to_string(),
            Node::Branch {
                root: Some(Owners::new(&[NS], &[NS])),
                children: keys_children,
            },
        );
        top.insert(
            "session".to_string(),
            Node::Branch {
                root: Some(Owners::new(&[NS], &[NS])),
                children: session_children,
            },
        );

        // Application server: payload handling.
        let mut leaf = |key: &str, read: &[Component], write: &[Component]| {
            top.insert(key.to_string(), Node::Leaf(Owners::new(read, write)));
        };
        leaf("formatters", &[AS], &[AS]);
        leaf("skip_payload_crypto", &[AS], &[AS]);

        // Join server: key provisioning.
        leaf("root_keys", &[JS], &[JS]);
        leaf("net_id", &[JS], &[JS]);
        leaf("resets_join_nonces", &[JS], &[JS]);
        leaf("claim_authentication_code", &[JS], &[JS]);

        Self { top }
    }
}
