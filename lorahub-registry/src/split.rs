//! The path splitter.
//!
//! Turns a set of requested field paths into a request tree: one bucket of
//! paths per component that must receive a call. Pure; all I/O decisions
//! happen later in the executor.

use crate::error::{RegistryError, RegistryResult};
use crate::ownership::{Direction, OwnershipMap};
use lorahub_types::{Component, FieldPath};
use std::collections::BTreeMap;

/// Per-operation mapping from component to the paths it must handle.
///
/// A `BTreeMap` over `Component` iterates in declaration order, which is
/// the stable order every downstream consumer (executor, merge, rollback,
/// first-error selection) relies on.
pub type RequestTree = BTreeMap<Component, Vec<FieldPath>>;

/// Routes each path to its owning component(s) for the given direction.
///
/// A path whose top-level segment has no ownership entry fails the whole
/// split with `UnknownPath`.
pub fn split(
    map: &OwnershipMap,
    paths: &[FieldPath],
    direction: Direction,
) -> RegistryResult<RequestTree> {
    let mut tree = RequestTree::new();
    for path in paths {
        let owners = map
            .resolve(path, direction)
            .ok_or_else(|| RegistryError::UnknownPath(path.clone()))?;
        for component in owners {
            insert_path(tree.entry(*component).or_default(), path);
        }
    }
    Ok(tree)
}

/// Inserts `path` into a bucket, keeping the bucket free of semantic
/// duplication: a path covered by an ancestor already present is dropped,
/// and inserting an ancestor evicts its descendants.
pub fn insert_path(bucket: &mut Vec<FieldPath>, path: &FieldPath) {
    if bucket.iter().any(|existing| path.starts_with(existing)) {
        return;
    }
    bucket.retain(|existing| !existing.starts_with(path));
    bucket.push(path.clone());
}
