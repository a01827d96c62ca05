//! Version rollover example
//!
//! Two versions of the same config are persisted to a file system store.
//! The engine is then rebuilt from disk, the newest version serves by
//! default, and the older one is reactivated.

use rankwise_sdk::telemetry::init_tracing;
use rankwise_sdk::{
    ConfigEngineBuilder, DataType, EngineConfig, Facts, LogFormat, RepositoryConfig, Role,
};

const V1: &str = include_str!("data/discounts_v1.json");
const V2: &str = include_str!("data/discounts_v2.json");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info", LogFormat::Pretty)?;
    println!("=== Version Rollover Example ===\n");

    let base = std::env::temp_dir().join(format!("rankwise-demo-{}", std::process::id()));
    let config = EngineConfig::default()
        .with_repository(RepositoryConfig::file_system(base.to_string_lossy().to_string()));

    {
        let engine = ConfigEngineBuilder::new()
            .with_config(config.clone())
            .with_attribute("customer", Role::Match, DataType::Str)
            .with_attribute("state", Role::Match, DataType::Str)
            .with_attribute("ranked", Role::Match, DataType::Int)
            .with_attribute("discount_pct", Role::Param, DataType::Dec)
            .with_attribute("approval_required", Role::Param, DataType::Bool)
            .build()
            .await?;
        engine.ingest_json(V1).await?;
        engine.ingest_json(V2).await?;
        println!("Persisted versions under {}", base.display());
    }

    // Rebuild from disk only
    let engine = ConfigEngineBuilder::new().with_config(config).build().await?;
    println!("Reloaded versions: {:?}", engine.versions("discounts"));
    println!("Active: {:?}", engine.active_version("discounts"));

    let facts = Facts::new()
        .with("customer", "ACME")
        .with("state", "AZ")
        .with("ranked", 3);

    let current = engine.resolve_active("discounts", &facts)?;
    println!("\nActive v{}: {}", current.version_num(), current.to_json());

    let previous = engine.activate("discounts", 1)?;
    println!("Rolled back from {:?}", previous);
    let rolled_back = engine.resolve_active("discounts", &facts)?;
    println!("Active v{}: {}", rolled_back.version_num(), rolled_back.to_json());

    std::fs::remove_dir_all(&base)?;
    Ok(())
}
