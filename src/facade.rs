//! One method per orchestrator operation.
//!
//! [`DagClient`] maps each logical operation onto an [`Operation`] from the
//! endpoint catalog, runs it through the transport [`Client`], and labels the
//! outcome as a [`FacadeResult`]. No method returns an `Err` or panics on a
//! failed call: every failure becomes [`FacadeResult::Error`] carrying the
//! operation's message.
//!
//! Read-style operations pass the decoded body straight through. Mutations
//! (`create_dag`, `create_pool`, `delete_pool`) additionally require the
//! response status to be exactly `200 OK`.

use crate::{
    client::Client,
    endpoint::Operation,
    response::Body,
    ErrorKind, Response, Result,
};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// The error half of a [`FacadeResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacadeError {
    /// Human-readable message naming the operation and its identifiers.
    pub message: String,
    /// What went wrong underneath.
    pub kind: ErrorKind,
}

impl fmt::Display for FacadeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FacadeError {}

/// The outcome of a facade operation.
#[derive(Debug, Clone, PartialEq)]
pub enum FacadeResult {
    /// The operation succeeded and reports a message (`{"success": msg}`).
    Success(String),
    /// The operation succeeded and returns the decoded response body.
    Data(Body),
    /// The operation failed (`{"error": msg}`).
    Error(FacadeError),
}

impl FacadeResult {
    /// Returns `true` unless the operation failed.
    pub fn is_success(&self) -> bool {
        !self.is_error()
    }

    /// Returns `true` if the operation failed.
    pub fn is_error(&self) -> bool {
        matches!(self, FacadeResult::Error(_))
    }

    /// The error message, if the operation failed.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            FacadeResult::Error(e) => Some(&e.message),
            _ => None,
        }
    }

    /// The failure category, if the operation failed.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            FacadeResult::Error(e) => Some(e.kind),
            _ => None,
        }
    }

    /// The decoded body, for pass-through results.
    pub fn body(&self) -> Option<&Body> {
        match self {
            FacadeResult::Data(body) => Some(body),
            _ => None,
        }
    }

    /// Renders the result in its JSON mapping form.
    ///
    /// # Examples
    ///
    /// ```
    /// use dagport::{ErrorKind, FacadeError, FacadeResult};
    /// use serde_json::json;
    ///
    /// let ok = FacadeResult::Success("DAG run for etl created successfully".to_string());
    /// assert_eq!(ok.into_json(), json!({"success": "DAG run for etl created successfully"}));
    ///
    /// let failed = FacadeResult::Error(FacadeError {
    ///     message: "Failed to get pool p1".to_string(),
    ///     kind: ErrorKind::Status,
    /// });
    /// assert_eq!(failed.into_json(), json!({"error": "Failed to get pool p1"}));
    /// ```
    pub fn into_json(self) -> Value {
        match self {
            FacadeResult::Success(message) => json!({ "success": message }),
            FacadeResult::Data(body) => body.into_json(),
            FacadeResult::Error(e) => json!({ "error": e.message }),
        }
    }

    /// Converts into a standard `Result`, keeping success bodies as JSON.
    pub fn into_result(self) -> std::result::Result<Value, FacadeError> {
        match self {
            FacadeResult::Error(e) => Err(e),
            other => Ok(other.into_json()),
        }
    }
}

/// A resource pool definition for [`DagClient::create_pool`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSpec {
    /// The pool's name.
    pub name: String,
    /// How many task slots the pool provides.
    pub slots: u32,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

impl PoolSpec {
    /// Creates a pool definition with an empty description.
    pub fn new(name: impl Into<String>, slots: u32) -> Self {
        Self {
            name: name.into(),
            slots,
            description: String::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[derive(Serialize)]
struct DagRunRequest<'a, C: ?Sized> {
    conf: &'a C,
}

/// How a successful transport response is labeled.
enum Labeling {
    PassThrough,
    StatusGated { success_message: Option<String> },
}

/// Client for the orchestrator's DAG, task and pool operations.
///
/// Every method takes an optional credential, forwarded as the
/// `Authorization` header according to the transport's
/// [`CredentialMode`](crate::CredentialMode).
///
/// # Examples
///
/// ```no_run
/// use dagport::DagClient;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), dagport::Error> {
/// let dags = DagClient::new("http://localhost:8080")?;
///
/// let result = dags.create_dag("example_dag", &json!({"key": "value"}), None).await;
/// println!("{}", result.into_json());
///
/// let runs = dags.get_dag_runs("example_dag", Some("Bearer abc")).await;
/// if let Some(message) = runs.error_message() {
///     eprintln!("{message}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DagClient {
    client: Client,
}

impl DagClient {
    /// Creates a facade over a default-configured client for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid URL.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let client = Client::builder().base_url(base_url)?.build()?;
        Ok(Self::from_client(client))
    }

    /// Creates a facade over an already configured transport client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// The underlying transport client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Triggers a new run of `dag_id`, posting `{"conf": conf}`.
    ///
    /// Succeeds with `DAG run for <dag_id> created successfully` only when the
    /// server answers `200 OK`.
    pub async fn create_dag<C>(
        &self,
        dag_id: &str,
        conf: &C,
        credential: Option<&str>,
    ) -> FacadeResult
    where
        C: Serialize + ?Sized,
    {
        let payload = serde_json::to_value(DagRunRequest { conf });
        let success_message = format!("DAG run for {dag_id} created successfully");
        self.run(
            Operation::CreateDagRun { dag_id },
            Some(payload),
            credential,
            Labeling::StatusGated {
                success_message: Some(success_message),
            },
        )
        .await
    }

    /// Lists the runs of `dag_id`.
    pub async fn get_dag_runs(&self, dag_id: &str, credential: Option<&str>) -> FacadeResult {
        self.pass_through(Operation::DagRuns { dag_id }, credential)
            .await
    }

    /// Returns details of the run of `dag_id` at `execution_date`.
    pub async fn get_dag_run_info(
        &self,
        dag_id: &str,
        execution_date: &str,
        credential: Option<&str>,
    ) -> FacadeResult {
        self.pass_through(
            Operation::DagRunInfo {
                dag_id,
                execution_date,
            },
            credential,
        )
        .await
    }

    /// Checks that the API server is reachable.
    pub async fn test_api_server(&self, credential: Option<&str>) -> FacadeResult {
        self.pass_through(Operation::TestApiServer, credential)
            .await
    }

    /// Returns the definition of `task_id` within `dag_id`.
    pub async fn get_task_info(
        &self,
        dag_id: &str,
        task_id: &str,
        credential: Option<&str>,
    ) -> FacadeResult {
        self.pass_through(Operation::TaskInfo { dag_id, task_id }, credential)
            .await
    }

    /// Returns the state of `task_id` within the run at `execution_date`.
    pub async fn get_task_instance_info(
        &self,
        dag_id: &str,
        execution_date: &str,
        task_id: &str,
        credential: Option<&str>,
    ) -> FacadeResult {
        self.pass_through(
            Operation::TaskInstanceInfo {
                dag_id,
                execution_date,
                task_id,
            },
            credential,
        )
        .await
    }

    /// Returns whether `dag_id` is paused.
    pub async fn get_dag_paused_state(
        &self,
        dag_id: &str,
        credential: Option<&str>,
    ) -> FacadeResult {
        self.pass_through(Operation::PausedState { dag_id }, credential)
            .await
    }

    /// Pauses `dag_id`.
    pub async fn pause_dag(&self, dag_id: &str, credential: Option<&str>) -> FacadeResult {
        self.pass_through(Operation::Pause { dag_id }, credential)
            .await
    }

    /// Unpauses `dag_id`.
    pub async fn unpause_dag(&self, dag_id: &str, credential: Option<&str>) -> FacadeResult {
        self.pass_through(Operation::Unpause { dag_id }, credential)
            .await
    }

    /// Returns the latest run of every DAG.
    pub async fn get_latest_dag_runs(&self, credential: Option<&str>) -> FacadeResult {
        self.pass_through(Operation::LatestDagRuns, credential)
            .await
    }

    /// Lists all pools.
    pub async fn get_all_pools(&self, credential: Option<&str>) -> FacadeResult {
        self.pass_through(Operation::AllPools, credential).await
    }

    /// Returns the pool named `pool_name`.
    pub async fn get_pool(&self, pool_name: &str, credential: Option<&str>) -> FacadeResult {
        self.pass_through(Operation::Pool { pool_name }, credential)
            .await
    }

    /// Creates a pool. `pool` is posted as-is; see [`PoolSpec`] for the usual shape.
    ///
    /// Returns the decoded body only when the server answers `200 OK`.
    pub async fn create_pool<P>(&self, pool: &P, credential: Option<&str>) -> FacadeResult
    where
        P: Serialize + ?Sized,
    {
        let payload = serde_json::to_value(pool);
        self.run(
            Operation::CreatePool,
            Some(payload),
            credential,
            Labeling::StatusGated {
                success_message: None,
            },
        )
        .await
    }

    /// Deletes the pool named `pool_name`.
    ///
    /// Returns the decoded body only when the server answers `200 OK`.
    pub async fn delete_pool(&self, pool_name: &str, credential: Option<&str>) -> FacadeResult {
        self.run(
            Operation::DeletePool { pool_name },
            None,
            credential,
            Labeling::StatusGated {
                success_message: None,
            },
        )
        .await
    }

    async fn pass_through(&self, op: Operation<'_>, credential: Option<&str>) -> FacadeResult {
        self.run(op, None, credential, Labeling::PassThrough).await
    }

    async fn run(
        &self,
        op: Operation<'_>,
        payload: Option<serde_json::Result<Value>>,
        credential: Option<&str>,
        labeling: Labeling,
    ) -> FacadeResult {
        let payload = match payload.transpose() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(
                    operation = op.name(),
                    error = %e,
                    "Failed to serialize request payload"
                );
                return failed(&op, op.failure_message(), ErrorKind::Configuration);
            }
        };

        let response = match self
            .client
            .execute(&op.endpoint(), payload.as_ref(), credential)
            .await
        {
            Ok(response) => response,
            Err(failure) => return failed(&op, op.failure_message(), failure.kind()),
        };

        label(&op, response, labeling)
    }
}

fn label(op: &Operation<'_>, response: Response<Body>, labeling: Labeling) -> FacadeResult {
    match labeling {
        Labeling::PassThrough => FacadeResult::Data(response.data),
        Labeling::StatusGated { success_message } => {
            if response.status != StatusCode::OK {
                tracing::error!(
                    operation = op.name(),
                    status = response.status.as_u16(),
                    "Unexpected success status"
                );
                return failed(op, op.failure_message(), ErrorKind::Status);
            }
            match success_message {
                Some(message) => FacadeResult::Success(message),
                None => FacadeResult::Data(response.data),
            }
        }
    }
}

/// Builds the error result. The cause has already been logged at `error`.
fn failed(op: &Operation<'_>, message: String, kind: ErrorKind) -> FacadeResult {
    tracing::debug!(operation = op.name(), kind = ?kind, "{}", message);
    FacadeResult::Error(FacadeError { message, kind })
}
