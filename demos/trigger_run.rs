//! Demo: check connectivity, trigger a DAG run and inspect pools.
//!
//! Expects an orchestrator with the experimental API enabled at
//! `http://localhost:8080` (override with the first argument).
//!
//! Run with: `cargo run --example trigger_run -- http://localhost:8080`

use dagport::{DagClient, PoolSpec};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), dagport::Error> {
    tracing_subscriber::fmt()
        .with_env_filter("dagport=debug,trigger_run=info")
        .init();

    let base_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost:8080".to_string());
    let dags = DagClient::new(&base_url)?;

    println!("=== Connectivity ===");
    println!("{}", dags.test_api_server(None).await.into_json());
    println!();

    println!("=== Trigger a run ===");
    let created = dags
        .create_dag("example_dag", &json!({"triggered_by": "demo"}), None)
        .await;
    println!("{}", created.into_json());
    println!("{}", dags.get_dag_runs("example_dag", None).await.into_json());
    println!();

    println!("=== Pools ===");
    let pool = PoolSpec::new("demo_pool", 4).with_description("created by the demo");
    println!("{}", dags.create_pool(&pool, None).await.into_json());
    println!("{}", dags.get_all_pools(None).await.into_json());

    let deleted = dags.delete_pool("demo_pool", None).await;
    if let Some(message) = deleted.error_message() {
        eprintln!("{message}");
    }

    Ok(())
}
