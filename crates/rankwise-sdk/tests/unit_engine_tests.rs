//! Engine tests: ingestion, activation, persistence and reload

use rankwise_core::{DataType, Facts, Role, TypedValue, VersionKey};
use rankwise_repository::RepositoryConfig;
use rankwise_sdk::{ConfigEngine, ConfigEngineBuilder, EngineConfig};
use serde_json::{json, Value};

fn row(customer: &str, state: &str, pct: &str) -> Value {
    json!({
        "match": [
            { "key": "customer", "type": "str", "value": customer },
            { "key": "state", "type": "str", "value": state }
        ],
        "params": [{ "key": "discount_pct", "type": "dec", "value": pct }]
    })
}

fn bundle(version: u32, rows: Vec<Value>) -> String {
    json!({
        "config_id": 7,
        "name": "pricing",
        "version": version,
        "configs": [{
            "name": "discounts",
            "rows": rows,
            "precedence_rank": [
                { "rank": 1, "customer": 1, "state": 1 },
                { "rank": 2, "customer": 0, "state": 1 },
                { "rank": 3, "customer": 0, "state": 0 }
            ]
        }]
    })
    .to_string()
}

fn v1() -> String {
    bundle(
        1,
        vec![
            row("ACME", "AZ", "0.15"),
            row("ALL", "AZ", "0.12"),
            row("ALL", "ALL", "0.05"),
        ],
    )
}

fn v2() -> String {
    bundle(2, vec![row("ACME", "AZ", "0.20"), row("ALL", "ALL", "0.07")])
}

async fn engine_at(config: EngineConfig) -> ConfigEngine {
    ConfigEngineBuilder::new()
        .with_config(config)
        .with_attribute("customer", Role::Match, DataType::Str)
        .with_attribute("state", Role::Match, DataType::Str)
        .with_attribute("discount_pct", Role::Param, DataType::Dec)
        .build()
        .await
        .unwrap()
}

async fn memory_engine() -> ConfigEngine {
    engine_at(EngineConfig::default()).await
}

fn facts(customer: &str, state: &str) -> Facts {
    Facts::new().with("customer", customer).with("state", state)
}

fn pct(raw: &str) -> TypedValue {
    TypedValue::dec(raw).unwrap()
}

// ========== Resolution ==========

#[tokio::test]
async fn test_most_specific_row_wins() {
    let engine = memory_engine().await;
    engine.ingest_json(&v1()).await.unwrap();

    let hit = engine.resolve_active("discounts", &facts("ACME", "AZ")).unwrap();
    assert_eq!(hit.rank, 1);
    assert_eq!(hit.param("discount_pct"), Some(&pct("0.15")));

    let hit = engine.resolve("discounts", 1, &facts("OTHERCO", "AZ")).unwrap();
    assert_eq!(hit.rank, 2);
    assert_eq!(hit.param("discount_pct"), Some(&pct("0.12")));

    let hit = engine.resolve("discounts", 1, &facts("OTHERCO", "NV")).unwrap();
    assert_eq!(hit.rank, 3);
    assert_eq!(hit.param("discount_pct"), Some(&pct("0.05")));
}

#[tokio::test]
async fn test_resolve_json_round_trip() {
    let engine = memory_engine().await;
    engine.ingest_json(&v1()).await.unwrap();

    let params = engine
        .resolve_json("discounts", Some(1), &json!({ "customer": "ACME", "state": "AZ" }))
        .unwrap();
    assert_eq!(params, json!({ "discount_pct": "0.15" }));
}

#[tokio::test]
async fn test_resolve_json_ignores_ill_typed_fact() {
    let engine = memory_engine().await;
    engine
        .ingest_json(&bundle(1, vec![row("ACME", "AZ", "0.15")]))
        .await
        .unwrap();

    let err = engine
        .resolve_json("discounts", Some(1), &json!({ "customer": 5, "state": "AZ" }))
        .unwrap_err();
    assert_eq!(err.kind(), "not_found");
}

#[tokio::test]
async fn test_no_match_reports_not_found() {
    let engine = memory_engine().await;
    engine
        .ingest_json(&bundle(1, vec![row("ACME", "AZ", "0.15")]))
        .await
        .unwrap();

    let err = engine.resolve_active("discounts", &facts("X", "ZZ")).unwrap_err();
    assert_eq!(err.kind(), "not_found");

    let explanation = engine.explain("discounts", None, &facts("X", "ZZ")).unwrap();
    assert!(explanation.outcome.is_err());
    assert_eq!(explanation.trace.consulted_ranks(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_unknown_version_is_reported() {
    let engine = memory_engine().await;
    let err = engine.resolve("discounts", 3, &facts("ACME", "AZ")).unwrap_err();
    assert_eq!(err.kind(), "version_not_found");
}

// ========== Versions ==========

#[tokio::test]
async fn test_new_version_takes_over_and_old_stays_readable() {
    let engine = memory_engine().await;
    engine.ingest_json(&v1()).await.unwrap();
    engine.ingest_json(&v2()).await.unwrap();

    assert_eq!(
        engine.versions("discounts"),
        vec![VersionKey::new("discounts", 1), VersionKey::new("discounts", 2)]
    );
    assert_eq!(engine.active_version("discounts"), Some(VersionKey::new("discounts", 2)));

    let active = engine.resolve_active("discounts", &facts("ACME", "AZ")).unwrap();
    assert_eq!(active.param("discount_pct"), Some(&pct("0.20")));
    let pinned = engine.resolve("discounts", 1, &facts("ACME", "AZ")).unwrap();
    assert_eq!(pinned.param("discount_pct"), Some(&pct("0.15")));

    let previous = engine.activate("discounts", 1).unwrap();
    assert_eq!(previous, Some(VersionKey::new("discounts", 2)));
    let rolled_back = engine.resolve_active("discounts", &facts("ACME", "AZ")).unwrap();
    assert_eq!(rolled_back.version_num(), 1);
}

#[tokio::test]
async fn test_duplicate_version_rejected() {
    let engine = memory_engine().await;
    engine.ingest_json(&v1()).await.unwrap();

    let err = engine.ingest_json(&v1()).await.unwrap_err();
    assert_eq!(err.kind(), "duplicate_version");
}

#[tokio::test]
async fn test_ingest_without_activation() {
    let engine = engine_at(EngineConfig::default().with_activate_on_ingest(false)).await;
    let report = engine.ingest_json(&v1()).await.unwrap();
    assert!(!report.activated);

    let err = engine.resolve_active("discounts", &facts("ACME", "AZ")).unwrap_err();
    assert_eq!(err.kind(), "no_active_version");
    assert!(engine.resolve("discounts", 1, &facts("ACME", "AZ")).is_ok());
}

#[tokio::test]
async fn test_rejected_bundle_changes_nothing() {
    let engine = memory_engine().await;
    let bad = bundle(1, vec![row("ACME", "AZ", "not-a-number")]);

    let err = engine.ingest_json(&bad).await.unwrap_err();
    assert_eq!(err.kind(), "invalid_literal");
    assert!(engine.versions("discounts").is_empty());

    let store = engine.store().unwrap();
    assert!(store.list_versions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_export_matches_ingested_bundle() {
    let engine = memory_engine().await;
    engine.ingest_json(&v1()).await.unwrap();

    let exported = engine.export_json("discounts", 1).unwrap();
    let reloaded = memory_engine().await;
    reloaded.ingest_json(&exported).await.unwrap();

    for (customer, state) in [("ACME", "AZ"), ("OTHERCO", "AZ"), ("OTHERCO", "NV")] {
        let a = engine.resolve("discounts", 1, &facts(customer, state)).unwrap();
        let b = reloaded.resolve("discounts", 1, &facts(customer, state)).unwrap();
        assert_eq!(a.params, b.params);
        assert_eq!(a.rank, b.rank);
    }
}

// ========== Persistence ==========

#[tokio::test]
async fn test_file_system_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("rankwise").to_string_lossy().to_string();
    let config = EngineConfig::default().with_repository(RepositoryConfig::file_system(base.as_str()));

    {
        let engine = engine_at(config.clone()).await;
        let report = engine.ingest_json(&v1()).await.unwrap();
        assert!(report.persisted);
        engine.ingest_json(&v2()).await.unwrap();
    }

    let engine = ConfigEngineBuilder::new().with_config(config).build().await.unwrap();
    assert_eq!(engine.catalog().len(), 3);
    assert_eq!(engine.versions("discounts").len(), 2);
    assert_eq!(engine.active_version("discounts"), Some(VersionKey::new("discounts", 2)));

    let hit = engine.resolve("discounts", 1, &facts("OTHERCO", "AZ")).unwrap();
    assert_eq!(hit.param("discount_pct"), Some(&pct("0.12")));
}

#[tokio::test]
async fn test_persist_disabled_keeps_store_empty() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().to_string_lossy().to_string();
    let config = EngineConfig::default()
        .with_repository(RepositoryConfig::file_system(base.as_str()))
        .with_persist_on_ingest(false);

    let engine = engine_at(config).await;
    let report = engine.ingest_json(&v1()).await.unwrap();
    assert!(!report.persisted);
    assert!(engine.store().unwrap().list_versions().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_attribute_defined_at_runtime_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().to_string_lossy().to_string();
    let config = EngineConfig::default().with_repository(RepositoryConfig::file_system(base.as_str()));

    let engine = engine_at(config.clone()).await;
    engine
        .define_attribute("channel", Role::Match, DataType::Str)
        .await
        .unwrap();

    let reopened = ConfigEngineBuilder::new().with_config(config).build().await.unwrap();
    assert!(reopened.catalog().contains("channel"));
}
