//! Discount resolution example
//!
//! This example demonstrates:
//! - Defining the attribute catalog
//! - Ingesting a precedence-ranked bundle
//! - Resolving queries and explaining which ranks were consulted

use rankwise_sdk::telemetry::init_tracing;
use rankwise_sdk::{ConfigEngineBuilder, DataType, Facts, LogFormat, Role};

const BUNDLE: &str = include_str!("data/discounts_v1.json");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info", LogFormat::Pretty)?;
    println!("=== Discount Resolution Example ===\n");

    let engine = ConfigEngineBuilder::new()
        .with_attribute("customer", Role::Match, DataType::Str)
        .with_attribute("state", Role::Match, DataType::Str)
        .with_attribute("ranked", Role::Match, DataType::Int)
        .with_attribute("discount_pct", Role::Param, DataType::Dec)
        .with_attribute("approval_required", Role::Param, DataType::Bool)
        .build()
        .await?;

    let report = engine.ingest_json(BUNDLE).await?;
    println!("Ingested: {:?}", report.keys);
    for warning in &report.warnings {
        println!("  warning: {}", warning);
    }

    let queries = [("ACME", "AZ", 3), ("OTHERCO", "AZ", 3), ("OTHERCO", "NV", 1)];
    for (customer, state, ranked) in queries {
        let facts = Facts::new()
            .with("customer", customer)
            .with("state", state)
            .with("ranked", ranked);

        let explanation = engine.explain("discounts", None, &facts)?;
        println!("\nQuery: customer={} state={} ranked={}", customer, state, ranked);
        println!("  Consulted ranks: {:?}", explanation.trace.consulted_ranks());
        match explanation.outcome {
            Ok(resolution) => {
                println!("  Winning rank: {} (row {})", resolution.rank, resolution.row_index);
                println!("  Params: {}", resolution.to_json());
            }
            Err(e) => println!("  No configuration: {}", e),
        }
    }

    // The same query through the JSON surface
    let params = engine.resolve_json(
        "discounts",
        Some(1),
        &serde_json::json!({ "customer": "ACME", "state": "AZ", "ranked": 3 }),
    )?;
    println!("\nJSON resolution: {}", params);

    Ok(())
}
