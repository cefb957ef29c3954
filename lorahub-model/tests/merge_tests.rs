use lorahub_model::{merge, DeviceRecord, MergeSource};
use lorahub_types::{field_paths, FieldPath};
use pretty_assertions::assert_eq;
use serde_json::json;

fn p(s: &str) -> FieldPath {
    FieldPath::parse(s).unwrap()
}

fn minimum() -> Vec<FieldPath> {
    field_paths(&["ids", "created_at", "updated_at"])
}

fn source(record: serde_json::Value, paths: &[&str]) -> MergeSource {
    MergeSource::new(record, field_paths(paths))
}

// ── Basic folding ────────────────────────────────────────────────

#[test]
fn merges_disjoint_views() {
    let merged = merge(
        &[
            source(json!({"ids": {"device_id": "d1"}, "name": "n"}), &["name"]),
            source(json!({"mac_settings": {"adr_margin": 10}}), &["mac_settings"]),
        ],
        DeviceRecord::new(),
        &minimum(),
    );
    assert_eq!(
        merged.as_value(),
        &json!({
            "ids": {"device_id": "d1"},
            "name": "n",
            "mac_settings": {"adr_margin": 10},
        })
    );
}

#[test]
fn minimum_fields_folded_without_being_requested() {
    let merged = merge(
        &[source(
            json!({
                "ids": {"device_id": "d1"},
                "created_at": "2026-01-01T00:00:00Z",
                "name": "n",
            }),
            &["name"],
        )],
        DeviceRecord::new(),
        &minimum(),
    );
    assert_eq!(merged.get_str(&p("created_at")), Some("2026-01-01T00:00:00Z"));
    assert_eq!(merged.get_str(&p("ids.device_id")), Some("d1"));
}

#[test]
fn later_sources_take_precedence() {
    let merged = merge(
        &[
            source(json!({"name": "old"}), &["name"]),
            source(json!({"name": "new"}), &["name"]),
        ],
        DeviceRecord::new(),
        &[],
    );
    assert_eq!(merged.get_str(&p("name")), Some("new"));
}

// ── Absence and placeholder handling ─────────────────────────────

#[test]
fn empty_source_is_identity() {
    let a = source(
        json!({"ids": {"device_id": "d1"}, "session": {"dev_addr": "2601"}}),
        &["session"],
    );
    let empty = source(json!({}), &["session"]);

    let with_empty = merge(&[a.clone(), empty], DeviceRecord::new(), &minimum());
    let without = merge(&[a], DeviceRecord::new(), &minimum());
    assert_eq!(with_empty, without);
}

#[test]
fn empty_object_never_overwrites_merged_data() {
    let merged = merge(
        &[
            source(json!({"session": {"dev_addr": "2601ABCD"}}), &["session"]),
            source(json!({"session": {}}), &["session"]),
        ],
        DeviceRecord::new(),
        &[],
    );
    assert_eq!(
        merged.get(&p("session.dev_addr")),
        Some(&json!("2601ABCD"))
    );
}

#[test]
fn false_is_preserved() {
    let merged = merge(
        &[source(json!({"supports_join": false}), &["supports_join"])],
        DeviceRecord::new(),
        &[],
    );
    assert_eq!(merged.get_bool(&p("supports_join")), Some(false));
}

#[test]
fn missing_requested_path_is_skipped() {
    let base = DeviceRecord::from_value(json!({"name": "keep"}));
    let merged = merge(
        &[source(json!({}), &["name"])],
        base.clone(),
        &[],
    );
    assert_eq!(merged, base);
}

// ── Composite handling ───────────────────────────────────────────

#[test]
fn composite_written_leaf_by_leaf() {
    let merged = merge(
        &[
            source(json!({"mac_settings": {"adr_margin": 10, "rx1_delay": 1}}), &["mac_settings"]),
            source(json!({"mac_settings": {"rx1_delay": 5}}), &["mac_settings"]),
        ],
        DeviceRecord::new(),
        &[],
    );
    // Second view only covers the leaf it returned; siblings survive.
    assert_eq!(
        merged.as_value(),
        &json!({"mac_settings": {"adr_margin": 10, "rx1_delay": 5}})
    );
}

#[test]
fn arrays_written_directly() {
    let merged = merge(
        &[source(json!({"locations": [{"latitude": 52.0}]}), &["locations"])],
        DeviceRecord::new(),
        &[],
    );
    assert_eq!(
        merged.get(&p("locations")),
        Some(&json!([{"latitude": 52.0}]))
    );
}

#[test]
fn deep_requested_path_extracts_subtree() {
    let merged = merge(
        &[source(
            json!({"session": {"keys": {"app_s_key": {"key": "00112233"}}}}),
            &["session.keys.app_s_key"],
        )],
        DeviceRecord::new(),
        &[],
    );
    assert_eq!(
        merged.get(&p("session.keys.app_s_key.key")),
        Some(&json!("00112233"))
    );
}

#[test]
fn inputs_are_not_mutated() {
    let a = source(json!({"name": "n"}), &["name"]);
    let base = DeviceRecord::new();
    let _ = merge(&[a.clone()], base.clone(), &[]);
    assert_eq!(a.record, json!({"name": "n"}));
    assert!(base.is_empty());
}
