use lorahub_registry::{split, Direction, OwnershipMap, RegistryError};
use lorahub_types::{field_paths, Component, FieldPath};
use proptest::prelude::*;

fn p(s: &str) -> FieldPath {
    FieldPath::parse(s).unwrap()
}

fn map() -> OwnershipMap {
    OwnershipMap::for_end_devices()
}

// ── Routing ──────────────────────────────────────────────────────

#[test]
fn routes_by_top_level_owner() {
    let tree = split(&map(), &field_paths(&["name", "mac_settings", "formatters"]), Direction::Read)
        .unwrap();
    assert_eq!(tree[&Component::IdentityServer], field_paths(&["name"]));
    assert_eq!(tree[&Component::NetworkServer], field_paths(&["mac_settings"]));
    assert_eq!(tree[&Component::ApplicationServer], field_paths(&["formatters"]));
    assert!(!tree.contains_key(&Component::JoinServer));
}

#[test]
fn unknown_deep_path_falls_back_to_top_node() {
    let tree = split(&map(), &field_paths(&["mac_settings.no_such_leaf.deep"]), Direction::Read)
        .unwrap();
    assert_eq!(
        tree[&Component::NetworkServer],
        field_paths(&["mac_settings.no_such_leaf.deep"])
    );
}

#[test]
fn branch_root_default_applies_to_unlisted_children() {
    let tree = split(&map(), &field_paths(&["session.started_at"]), Direction::Read).unwrap();
    assert_eq!(
        tree[&Component::NetworkServer],
        field_paths(&["session.started_at"])
    );
}

#[test]
fn nested_child_overrides_branch_default() {
    let tree = split(
        &map(),
        &field_paths(&["session.keys.app_s_key", "session.keys.f_nwk_s_int_key"]),
        Direction::Read,
    )
    .unwrap();
    // The application session key belongs to the application server; its
    // siblings inherit the network-server default.
    assert_eq!(
        tree[&Component::ApplicationServer],
        field_paths(&["session.keys.app_s_key"])
    );
    assert_eq!(
        tree[&Component::NetworkServer],
        field_paths(&["session.keys.f_nwk_s_int_key"])
    );
}

#[test]
fn unknown_top_level_path_is_an_error() {
    let error = split(&map(), &field_paths(&["no_such_field"]), Direction::Read).unwrap_err();
    assert!(matches!(error, RegistryError::UnknownPath(path) if path == p("no_such_field")));
}

// ── Direction sensitivity ────────────────────────────────────────

#[test]
fn read_and_write_owners_differ() {
    let read = split(&map(), &field_paths(&["supports_join"]), Direction::Read).unwrap();
    assert_eq!(read.keys().copied().collect::<Vec<_>>(), [Component::IdentityServer]);

    let write = split(&map(), &field_paths(&["supports_join"]), Direction::Write).unwrap();
    assert_eq!(
        write.keys().copied().collect::<Vec<_>>(),
        [Component::IdentityServer, Component::NetworkServer]
    );
}

#[test]
fn replicated_write_reaches_every_owner() {
    let write = split(&map(), &field_paths(&["lorawan_version"]), Direction::Write).unwrap();
    assert_eq!(
        write.keys().copied().collect::<Vec<_>>(),
        [Component::NetworkServer, Component::JoinServer]
    );
    for bucket in write.values() {
        assert_eq!(bucket, &field_paths(&["lorawan_version"]));
    }
}

// ── Bucket dedup ─────────────────────────────────────────────────

#[test]
fn child_after_ancestor_is_suppressed() {
    let tree = split(&map(), &field_paths(&["session", "session.dev_addr"]), Direction::Read)
        .unwrap();
    assert_eq!(tree[&Component::NetworkServer], field_paths(&["session"]));
}

#[test]
fn ancestor_evicts_previous_descendants() {
    let tree = split(
        &map(),
        &field_paths(&["mac_settings.adr_margin", "mac_settings.rx1_delay", "mac_settings"]),
        Direction::Read,
    )
    .unwrap();
    assert_eq!(tree[&Component::NetworkServer], field_paths(&["mac_settings"]));
}

#[test]
fn duplicate_paths_collapse() {
    let tree = split(&map(), &field_paths(&["name", "name"]), Direction::Read).unwrap();
    assert_eq!(tree[&Component::IdentityServer], field_paths(&["name"]));
}

// ── Prefix minimization ──────────────────────────────────────────

#[test]
fn deepest_prefix_stops_at_last_explicit_node() {
    let m = map();
    assert_eq!(m.deepest_prefix(&p("ids.device_id")), Some(p("ids")));
    assert_eq!(m.deepest_prefix(&p("name")), Some(p("name")));
    assert_eq!(
        m.deepest_prefix(&p("session.keys.app_s_key.key")),
        Some(p("session.keys.app_s_key"))
    );
    assert_eq!(m.deepest_prefix(&p("session.dev_addr")), Some(p("session")));
    assert_eq!(m.deepest_prefix(&p("no_such_field.x")), None);
}

// ── Properties ───────────────────────────────────────────────────

fn path_strategy() -> impl Strategy<Value = FieldPath> {
    let tops = prop_oneof![
        Just("ids"),
        Just("name"),
        Just("mac_settings"),
        Just("session"),
        Just("root_keys"),
        Just("formatters"),
        Just("supports_join"),
        Just("lorawan_version"),
    ];
    (tops, prop::collection::vec("[a-z_]{1,8}", 0..3)).prop_map(|(top, rest)| {
        let mut segments = vec![top.to_string()];
        segments.extend(rest);
        FieldPath::from_segments(segments)
    })
}

proptest! {
    /// No bucket ever contains a path together with one of its ancestors,
    /// for any path set and either direction.
    #[test]
    fn buckets_are_free_of_ancestor_pairs(
        paths in prop::collection::vec(path_strategy(), 1..20),
        read in any::<bool>(),
    ) {
        let direction = if read { Direction::Read } else { Direction::Write };
        let tree = split(&map(), &paths, direction).unwrap();
        for bucket in tree.values() {
            for a in bucket {
                for b in bucket {
                    prop_assert!(!a.is_ancestor_of(b), "{a} and {b} share a bucket");
                }
            }
        }
    }
}
