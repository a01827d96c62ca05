//! End-to-end tests for rankwise-runtime
//!
//! Bundles go through the loader into a version store and are resolved the
//! way callers do it.

use rankwise_core::{AttributeCatalog, DataType, Facts, Role, TypedValue, VersionKey};
use rankwise_runtime::{export, LoadError, Loader, ResolveError, Resolver, VersionStore};
use serde_json::{json, Value};

fn catalog() -> AttributeCatalog {
    let mut catalog = AttributeCatalog::new();
    catalog.define("customer", Role::Match, DataType::Str).unwrap();
    catalog.define("state", Role::Match, DataType::Str).unwrap();
    catalog.define("ranked", Role::Match, DataType::Int).unwrap();
    catalog.define("discount_pct", Role::Param, DataType::Dec).unwrap();
    catalog.define("approval_required", Role::Param, DataType::Bool).unwrap();
    catalog
}

fn row(customer: &str, state: &str, ranked: Value, pct: &str) -> Value {
    json!({
        "match": [
            { "key": "customer", "type": "str", "value": customer },
            { "key": "state", "type": "str", "value": state },
            { "key": "ranked", "type": "int", "value": ranked }
        ],
        "params": [
            { "key": "discount_pct", "type": "dec", "value": pct },
            { "key": "approval_required", "type": "bool", "value": false }
        ]
    })
}

fn ranks() -> Value {
    json!([
        { "rank": 1, "customer": 1, "state": 1, "ranked": 1 },
        { "rank": 2, "customer": 0, "state": 1, "ranked": 1 },
        { "rank": 3, "customer": 1, "state": 1, "ranked": 0 },
        { "rank": 4, "customer": 0, "state": 0, "ranked": 1 },
        { "rank": 5, "customer": 1, "state": 0, "ranked": 1 },
        { "rank": 6, "customer": 0, "state": 0, "ranked": 0 }
    ])
}

fn bundle(version: u32, rows: Vec<Value>, ranks: Value) -> String {
    json!({
        "config_id": 1,
        "name": "pricing",
        "version": version,
        "updated_by": "pricing-team",
        "update_date": "2024-05-01T00:00:00Z",
        "configs": [{ "name": "discounts", "rows": rows, "precedence_rank": ranks }]
    })
    .to_string()
}

/// Row A: `{ALL, AZ, 3}`; row B: `{ACME, AZ, 3}`
fn worked_example() -> String {
    bundle(
        1,
        vec![
            row("ALL", "AZ", json!(3), "0.125"),
            row("ACME", "AZ", json!(3), "0.150"),
        ],
        ranks(),
    )
}

fn install(catalog: &AttributeCatalog, json: &str) -> VersionStore {
    let store = VersionStore::new();
    let bundle = Loader::new(catalog).load_json(json).unwrap();
    Loader::install(&store, bundle).unwrap();
    store
}

fn facts(customer: &str, state: &str, ranked: i64) -> Facts {
    Facts::new()
        .with("customer", customer)
        .with("state", state)
        .with("ranked", ranked)
}

// ========== Resolution Tests ==========

#[test]
fn test_exact_customer_beats_wildcard() {
    let catalog = catalog();
    let store = install(&catalog, &worked_example());
    let entry = store.get_version(&VersionKey::new("discounts", 1)).unwrap();

    let hit = Resolver::new(&catalog)
        .resolve_entry(&entry, &facts("ACME", "AZ", 3))
        .unwrap();
    assert_eq!(hit.rank, 1);
    assert_eq!(hit.row_index, 1);
    assert_eq!(hit.param("discount_pct"), Some(&TypedValue::dec("0.150").unwrap()));
    assert_eq!(hit.param("approval_required"), Some(&TypedValue::Bool(false)));
}

#[test]
fn test_other_customer_falls_through_to_wildcard_row() {
    let catalog = catalog();
    let store = install(&catalog, &worked_example());
    let entry = store.get_version(&VersionKey::new("discounts", 1)).unwrap();
    let table = entry.precedence().unwrap();

    let (result, trace) =
        Resolver::new(&catalog).resolve_traced(entry.version(), table, &facts("OTHERCO", "AZ", 3));
    let hit = result.unwrap();
    assert_eq!(hit.row_index, 0);
    assert_eq!(hit.rank, 2);
    assert_eq!(hit.param("discount_pct"), Some(&TypedValue::dec("0.125").unwrap()));
    assert_eq!(trace.consulted_ranks(), vec![1, 2]);
}

#[test]
fn test_no_matching_rank_is_not_found() {
    let catalog = catalog();
    let store = install(&catalog, &worked_example());
    let entry = store.get_version(&VersionKey::new("discounts", 1)).unwrap();
    let table = entry.precedence().unwrap();

    let (result, trace) =
        Resolver::new(&catalog).resolve_traced(entry.version(), table, &facts("X", "ZZ", 99));
    let err = result.unwrap_err();
    assert!(matches!(err, ResolveError::NotFound { .. }));
    assert_eq!(trace.consulted_ranks(), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(trace.winning_rank(), None);
}

#[test]
fn test_resolution_stops_at_first_surviving_rank() {
    let catalog = catalog();
    let store = install(
        &catalog,
        &bundle(
            1,
            vec![
                row("ACME", "AZ", json!(3), "0.30"),
                row("ALL", "ALL", json!("ALL"), "0.01"),
            ],
            ranks(),
        ),
    );
    let entry = store.get_version(&VersionKey::new("discounts", 1)).unwrap();
    let table = entry.precedence().unwrap();

    let (result, trace) =
        Resolver::new(&catalog).resolve_traced(entry.version(), table, &facts("ACME", "AZ", 3));
    assert_eq!(result.unwrap().row_index, 0);
    assert_eq!(trace.consulted_ranks(), vec![1]);

    let (result, trace) =
        Resolver::new(&catalog).resolve_traced(entry.version(), table, &facts("ACME", "AZ", 4));
    assert_eq!(result.unwrap().row_index, 1);
    assert_eq!(trace.winning_rank(), Some(6));
    assert!(trace.steps[..5].iter().all(|s| s.survivors.is_empty()));
}

#[test]
fn test_resolution_is_deterministic() {
    let catalog = catalog();
    let store = install(&catalog, &worked_example());
    let entry = store.get_version(&VersionKey::new("discounts", 1)).unwrap();
    let resolver = Resolver::new(&catalog);

    let first = resolver.resolve_entry(&entry, &facts("OTHERCO", "AZ", 3));
    for _ in 0..20 {
        assert_eq!(resolver.resolve_entry(&entry, &facts("OTHERCO", "AZ", 3)), first);
    }
}

#[test]
fn test_fingerprint_decides_eligibility() {
    let catalog = catalog();
    let store = install(&catalog, &worked_example());
    let table = store.precedence(&VersionKey::new("discounts", 1)).unwrap();

    let eligible: Vec<(u32, Vec<usize>)> = table
        .ranks_ascending()
        .iter()
        .filter(|g| !g.eligible_rows().is_empty())
        .map(|g| (g.rank(), g.eligible_rows().to_vec()))
        .collect();
    assert_eq!(eligible, vec![(1, vec![1]), (2, vec![0])]);
}

// ========== Validation Tests ==========

#[test]
fn test_duplicate_fingerprint_and_literals_rejected() {
    let catalog = catalog();
    let json = bundle(
        1,
        vec![
            row("ALL", "AZ", json!(3), "0.10"),
            row("ALL", "AZ", json!(3), "0.20"),
        ],
        ranks(),
    );
    let err = Loader::new(&catalog).load_json(&json).unwrap_err();
    assert!(matches!(
        err,
        LoadError::DuplicateFingerprint {
            rank: 2,
            first: 0,
            second: 1,
            ..
        }
    ));
}

#[test]
fn test_missing_rule_at_rank_four_rejected() {
    let catalog = catalog();
    let mut incomplete = ranks();
    incomplete[3]
        .as_object_mut()
        .unwrap()
        .remove("ranked");
    let json = bundle(1, vec![row("ALL", "AZ", json!(3), "0.10")], incomplete);

    let err = Loader::new(&catalog).load_json(&json).unwrap_err();
    assert_eq!(err.kind(), "incomplete_rank");
    assert_eq!(
        err.to_string(),
        format!(
            "discounts@v1: rank 4 has no precedence rule for {}",
            catalog.lookup("ranked").unwrap().id
        )
    );
}

#[test]
fn test_rejected_bundle_leaves_store_untouched() {
    let catalog = catalog();
    let store = install(&catalog, &worked_example());
    store.activate(&VersionKey::new("discounts", 1)).unwrap();

    let bad = bundle(
        2,
        vec![row("ACME", "AZ", json!("three"), "0.10")],
        ranks(),
    );
    let err = Loader::new(&catalog).load_json(&bad).unwrap_err();
    assert_eq!(err.kind(), "invalid_literal");
    assert_eq!(store.len(), 1);
    assert_eq!(
        store
            .active(&"discounts".into())
            .unwrap()
            .key()
            .version_num,
        1
    );
}

// ========== Version Lifecycle Tests ==========

#[test]
fn test_new_version_activation_keeps_old_readable() {
    let catalog = catalog();
    let store = install(&catalog, &worked_example());
    let v2 = bundle(
        2,
        vec![
            row("ALL", "AZ", json!(3), "0.100"),
            row("ACME", "AZ", json!(3), "0.200"),
        ],
        ranks(),
    );
    Loader::install(&store, Loader::new(&catalog).load_json(&v2).unwrap()).unwrap();

    store.activate(&VersionKey::new("discounts", 1)).unwrap();
    let old = store.active(&"discounts".into()).unwrap();
    store.activate(&VersionKey::new("discounts", 2)).unwrap();
    let new = store.active(&"discounts".into()).unwrap();

    let resolver = Resolver::new(&catalog);
    let q = facts("ACME", "AZ", 3);
    assert_eq!(
        resolver.resolve_entry(&old, &q).unwrap().param("discount_pct"),
        Some(&TypedValue::dec("0.15").unwrap())
    );
    assert_eq!(
        resolver.resolve_entry(&new, &q).unwrap().param("discount_pct"),
        Some(&TypedValue::dec("0.2").unwrap())
    );
}

// ========== Export Tests ==========

#[test]
fn test_export_then_reload_is_structurally_equal() {
    let catalog = catalog();
    let loader = Loader::new(&catalog);
    let original = loader.load_json(&worked_example()).unwrap();

    let doc = export::drafts_to_bundle(&catalog, &original.drafts).unwrap();
    let reloaded = loader.load(&doc).unwrap();

    assert_eq!(reloaded.drafts, original.drafts);
    assert_eq!(
        reloaded.drafts[0].table().ranks_ascending(),
        original.drafts[0].table().ranks_ascending()
    );
}
