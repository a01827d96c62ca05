//! Unit tests for bundle parsing edge cases

use rankwise_parser::{BundleParser, ParseError, RankEntry};

fn bundle_with_configs(configs: &str) -> String {
    format!(
        r#"{{"config_id": 1, "name": "b", "version": 1, "configs": {}}}"#,
        configs
    )
}

#[test]
fn test_empty_bundle_rejected() {
    let err = BundleParser::parse_json(&bundle_with_configs("[]")).unwrap_err();
    assert!(matches!(err, ParseError::EmptyBundle));
    assert_eq!(err.to_string(), "Bundle contains no configs");
}

#[test]
fn test_duplicate_config_names_rejected() {
    let json = bundle_with_configs(r#"[{"name": "a"}, {"name": "a"}]"#);
    let err = BundleParser::parse_json(&json).unwrap_err();
    assert!(matches!(err, ParseError::DuplicateConfig { ref name } if name == "a"));
}

#[test]
fn test_blank_config_name_rejected() {
    let json = bundle_with_configs(r#"[{"name": "  "}]"#);
    let err = BundleParser::parse_json(&json).unwrap_err();
    assert!(matches!(err, ParseError::MissingField { .. }));
}

#[test]
fn test_missing_rows_default_to_empty() {
    let doc = BundleParser::parse_json(&bundle_with_configs(r#"[{"name": "a"}]"#)).unwrap();
    assert!(doc.configs[0].rows.is_empty());
    assert!(doc.configs[0].precedence_rank.is_empty());
}

#[test]
fn test_negative_version_rejected() {
    let json = r#"{"config_id": 1, "name": "b", "version": -1, "configs": [{"name": "a"}]}"#;
    assert!(matches!(
        BundleParser::parse_json(json),
        Err(ParseError::JsonError(_))
    ));
}

#[test]
fn test_rank_entry_serializes_flat() {
    let entry = RankEntry::new(5).with("customer", 1).with("state", 0);
    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"rank": 5, "customer": 1, "state": 0})
    );
}

#[test]
fn test_from_value() {
    let value = serde_json::json!({
        "config_id": 1,
        "name": "b",
        "version": 2,
        "configs": [{"name": "a", "precedence_rank": [{"rank": 1, "x": 1}]}]
    });
    let doc = BundleParser::from_value(value).unwrap();
    assert_eq!(doc.version, 2);
    assert_eq!(doc.configs[0].precedence_rank[0].rank, 1);
}
