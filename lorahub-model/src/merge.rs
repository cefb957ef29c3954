//! Deep merge of partial device views.
//!
//! Each backend returns only the sub-tree of fields it owns. `merge` folds
//! those partial views, in input order, into one canonical record. Input
//! order is precedence: a later view overwrites an earlier one per leaf,
//! so callers must pass views in a deterministic order.

use crate::record::DeviceRecord;
use lorahub_types::FieldPath;
use serde_json::Value;

/// One backend's contribution to a merge: the partial record it returned
/// and the paths it was asked to cover.
#[derive(Debug, Clone)]
pub struct MergeSource {
    pub record: Value,
    pub paths: Vec<FieldPath>,
}

impl MergeSource {
    /// Builds a source from a partial record and its covered paths.
    pub fn new(record: Value, paths: Vec<FieldPath>) -> Self {
        Self { record, paths }
    }
}

/// Merges partial views over `base`.
///
/// For every source, each path in `minimum ∪ source.paths` is extracted
/// from the source's partial record:
/// - a missing value is skipped (but boolean `false` is a value, not
///   absence, and is written);
/// - an empty composite object is skipped entirely, so a backend
///   returning a placeholder `{}` for a field outside its purview never
///   erases data merged from another backend;
/// - a non-empty composite is written leaf by leaf at the combined path;
/// - scalars and arrays are written directly.
pub fn merge(sources: &[MergeSource], base: DeviceRecord, minimum: &[FieldPath]) -> DeviceRecord {
    let mut result = base;
    for source in sources {
        for path in minimum.iter().chain(source.paths.iter()) {
            let Some(value) = value_at(&source.record, path) else {
                continue;
            };
            match value.as_object() {
                Some(map) if map.is_empty() => {}
                Some(_) => {
                    let mut leaves = Vec::new();
                    collect_leaves(value, Vec::new(), &mut leaves);
                    for (suffix, leaf) in leaves {
                        let target = match suffix {
                            Some(suffix) => path.join(&suffix),
                            None => path.clone(),
                        };
                        result.set(&target, leaf);
                    }
                }
                None => result.set(path, value.clone()),
            }
        }
    }
    result
}

fn value_at<'a>(value: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.segments() {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Collects `(relative path, leaf value)` pairs under `value`. The root
/// itself yields a `None` path when it is not a composite.
fn collect_leaves(value: &Value, segments: Vec<String>, out: &mut Vec<(Option<FieldPath>, Value)>) {
    match value.as_object() {
        Some(map) if !map.is_empty() => {
            for (key, child) in map {
                let mut next = segments.clone();
                next.push(key.clone());
                collect_leaves(child, next, out);
            }
        }
        Some(_) => {} // nested empty object: nothing to contribute
        None => {
            let suffix = if segments.is_empty() {
                None
            } else {
                Some(FieldPath::from_segments(segments))
            };
            out.push((suffix, value.clone()));
        }
    }
}
