//! Endpoint descriptors and the catalog of orchestrator operations.
//!
//! Paths are relative to the client's normalized base URL, which already ends
//! in the API root (`.../api/experimental/`). Identifiers are substituted into
//! the templates verbatim; callers must supply URL-safe values.

use http::Method;

/// The verb and relative path of a single request.
///
/// Built fresh for every call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// The HTTP method (GET, POST or DELETE).
    pub method: Method,

    /// The request path, relative to the normalized base URL.
    pub path: String,
}

impl Endpoint {
    /// Creates a new `Endpoint` with the given method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    /// Shorthand for a GET endpoint.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Shorthand for a POST endpoint.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Shorthand for a DELETE endpoint.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }
}

/// Every operation the facade exposes, with the identifiers its path needs.
///
/// # Examples
///
/// ```
/// use dagport::endpoint::Operation;
/// use http::Method;
///
/// let op = Operation::TaskInstanceInfo {
///     dag_id: "etl",
///     execution_date: "2022-01-01T00:00:00",
///     task_id: "load",
/// };
///
/// let endpoint = op.endpoint();
/// assert_eq!(endpoint.method, Method::GET);
/// assert_eq!(endpoint.path, "dags/etl/dag_runs/2022-01-01T00:00:00/tasks/load");
/// assert_eq!(
///     op.failure_message(),
///     "Failed to get task instance info for etl - 2022-01-01T00:00:00 - load"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation<'a> {
    /// Trigger a new run of a DAG.
    CreateDagRun { dag_id: &'a str },
    /// List the runs of a DAG.
    DagRuns { dag_id: &'a str },
    /// Inspect one run of a DAG.
    DagRunInfo {
        dag_id: &'a str,
        execution_date: &'a str,
    },
    /// Connectivity check.
    TestApiServer,
    /// Inspect a task definition.
    TaskInfo { dag_id: &'a str, task_id: &'a str },
    /// Inspect a task instance within a run.
    TaskInstanceInfo {
        dag_id: &'a str,
        execution_date: &'a str,
        task_id: &'a str,
    },
    /// Read whether a DAG is paused.
    PausedState { dag_id: &'a str },
    /// Pause a DAG.
    Pause { dag_id: &'a str },
    /// Unpause a DAG.
    Unpause { dag_id: &'a str },
    /// Latest run of every DAG.
    LatestDagRuns,
    /// List all pools.
    AllPools,
    /// Inspect one pool.
    Pool { pool_name: &'a str },
    /// Create a pool.
    CreatePool,
    /// Delete a pool.
    DeletePool { pool_name: &'a str },
}

impl Operation<'_> {
    /// A stable, log-friendly name for the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateDagRun { .. } => "create_dag_run",
            Operation::DagRuns { .. } => "get_dag_runs",
            Operation::DagRunInfo { .. } => "get_dag_run_info",
            Operation::TestApiServer => "test_api_server",
            Operation::TaskInfo { .. } => "get_task_info",
            Operation::TaskInstanceInfo { .. } => "get_task_instance_info",
            Operation::PausedState { .. } => "get_dag_paused_state",
            Operation::Pause { .. } => "pause_dag",
            Operation::Unpause { .. } => "unpause_dag",
            Operation::LatestDagRuns => "get_latest_dag_runs",
            Operation::AllPools => "get_all_pools",
            Operation::Pool { .. } => "get_pool",
            Operation::CreatePool => "create_pool",
            Operation::DeletePool { .. } => "delete_pool",
        }
    }

    /// The HTTP method used by the operation.
    pub fn method(&self) -> Method {
        match self {
            Operation::CreateDagRun { .. } | Operation::CreatePool => Method::POST,
            Operation::DeletePool { .. } => Method::DELETE,
            _ => Method::GET,
        }
    }

    /// The relative request path with identifiers substituted.
    pub fn path(&self) -> String {
        match self {
            Operation::CreateDagRun { dag_id } | Operation::DagRuns { dag_id } => {
                format!("dags/{dag_id}/dag_runs")
            }
            Operation::DagRunInfo {
                dag_id,
                execution_date,
            } => format!("dags/{dag_id}/dag_runs/{execution_date}"),
            Operation::TestApiServer => "test".to_string(),
            Operation::TaskInfo { dag_id, task_id } => format!("dags/{dag_id}/tasks/{task_id}"),
            Operation::TaskInstanceInfo {
                dag_id,
                execution_date,
                task_id,
            } => format!("dags/{dag_id}/dag_runs/{execution_date}/tasks/{task_id}"),
            Operation::PausedState { dag_id } => format!("dags/{dag_id}/paused"),
            Operation::Pause { dag_id } => format!("dags/{dag_id}/paused/true"),
            Operation::Unpause { dag_id } => format!("dags/{dag_id}/paused/false"),
            Operation::LatestDagRuns => "latest_runs".to_string(),
            Operation::AllPools | Operation::CreatePool => "pools".to_string(),
            Operation::Pool { pool_name } | Operation::DeletePool { pool_name } => {
                format!("pools/{pool_name}")
            }
        }
    }

    /// Builds the endpoint descriptor for this operation.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.method(), self.path())
    }

    /// The message surfaced to callers when the operation fails.
    pub fn failure_message(&self) -> String {
        match self {
            Operation::CreateDagRun { dag_id } => format!("Failed to create DAG run for {dag_id}"),
            Operation::DagRuns { dag_id } => format!("Failed to get DAG runs for {dag_id}"),
            Operation::DagRunInfo {
                dag_id,
                execution_date,
            } => format!("Failed to get DAG run info for {dag_id} - {execution_date}"),
            Operation::TestApiServer => "Failed to test API server connection".to_string(),
            Operation::TaskInfo { dag_id, task_id } => {
                format!("Failed to get task info for {dag_id} - {task_id}")
            }
            Operation::TaskInstanceInfo {
                dag_id,
                execution_date,
                task_id,
            } => format!(
                "Failed to get task instance info for {dag_id} - {execution_date} - {task_id}"
            ),
            Operation::PausedState { dag_id } => format!("Failed to get paused state for {dag_id}"),
            Operation::Pause { dag_id } => format!("Failed to pause DAG {dag_id}"),
            Operation::Unpause { dag_id } => format!("Failed to unpause DAG {dag_id}"),
            Operation::LatestDagRuns => "Failed to get latest DAG runs".to_string(),
            Operation::AllPools => "Failed to get all pools".to_string(),
            Operation::Pool { pool_name } => format!("Failed to get pool {pool_name}"),
            Operation::CreatePool => "Failed to create pool".to_string(),
            Operation::DeletePool { pool_name } => format!("Failed to delete pool {pool_name}"),
        }
    }
}
