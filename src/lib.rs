//! # dagport - a client for a workflow orchestrator's experimental HTTP API
//!
//! dagport lets you trigger DAG runs, inspect runs and task instances,
//! toggle pause state, and manage resource pools without building URLs or
//! handling HTTP plumbing yourself.
//!
//! ## Quick Start
//!
//! ```no_run
//! use dagport::{DagClient, PoolSpec};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), dagport::Error> {
//!     let dags = DagClient::new("http://localhost:8080")?;
//!
//!     // Trigger a run
//!     let created = dags
//!         .create_dag("example_dag", &json!({"key": "value"}), Some("Bearer abc"))
//!         .await;
//!     println!("{}", created.into_json());
//!
//!     // Read-style operations return the server's body untouched
//!     let state = dags.get_dag_paused_state("example_dag", None).await;
//!     if let Some(body) = state.body() {
//!         println!("Paused state: {:?}", body);
//!     }
//!
//!     // Pools
//!     let pool = PoolSpec::new("etl_pool", 8).with_description("ETL workers");
//!     let result = dags.create_pool(&pool, None).await;
//!     if let Some(message) = result.error_message() {
//!         eprintln!("{message}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Layers
//!
//! - [`Client`] is the transport. It owns the normalized base URL
//!   (`<address>/api/experimental/`), sends `Content-Type: application/json`
//!   and `Cache-Control: no-cache` on every request, and decodes the reply as
//!   JSON or text depending on its declared content type. Failures come back
//!   as a [`Failure`] that keeps the structured [`Error`].
//! - [`DagClient`] is the facade. Each method maps one operation onto a path
//!   and returns a [`FacadeResult`]; it never returns `Err`.
//!
//! ## Credentials
//!
//! Each operation takes an optional credential that is sent as the
//! `Authorization` header. By default it applies to that call only. Build the
//! client with [`CredentialMode::Sticky`] to have the last credential reused
//! by later calls:
//!
//! ```no_run
//! use dagport::{Client, CredentialMode, DagClient};
//!
//! # async fn example() -> Result<(), dagport::Error> {
//! let client = Client::builder()
//!     .base_url("http://localhost:8080")?
//!     .credential_mode(CredentialMode::Sticky)
//!     .build()?;
//! let dags = DagClient::from_client(client);
//!
//! dags.test_api_server(Some("Bearer abc")).await;
//! // Still sent with "Authorization: Bearer abc"
//! dags.get_all_pools(None).await;
//! # Ok(())
//! # }
//! ```

mod client;
pub mod endpoint;
mod error;
mod facade;
pub mod response;

pub use client::{Client, ClientBuilder, CredentialMode, Failure, DEFAULT_API_ROOT};
pub use error::{Error, ErrorKind, Result};
pub use facade::{DagClient, FacadeError, FacadeResult, PoolSpec};
pub use response::{Body, Response};
