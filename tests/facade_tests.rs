//! Facade tests: every operation against a wiremock orchestrator.

use dagport::{
    Body, Client, CredentialMode, DagClient, ErrorKind, FacadeResult, PoolSpec,
};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount(server: &MockServer, verb: &str, route: &str, template: ResponseTemplate) {
    Mock::given(method(verb))
        .and(path(format!("/api/experimental/{route}")))
        .respond_with(template)
        .mount(server)
        .await;
}

fn facade(server: &MockServer) -> DagClient {
    DagClient::new(server.uri()).unwrap()
}

fn assert_error(result: FacadeResult, expected: &str) {
    let rendered = result.into_json();
    assert_eq!(rendered, json!({ "error": expected }));
    assert_eq!(rendered.as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_dag_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/experimental/dags/example_dag/dag_runs"))
        .and(body_json(json!({"conf": {"key": "value"}})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": "DAG run for example_dag created successfully"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = facade(&mock_server)
        .create_dag("example_dag", &json!({"key": "value"}), None)
        .await;

    assert_eq!(
        result.into_json(),
        json!({"success": "DAG run for example_dag created successfully"})
    );
}

#[tokio::test]
async fn test_create_dag_failure() {
    let mock_server = MockServer::start().await;
    mount(
        &mock_server,
        "POST",
        "dags/example_dag/dag_runs",
        ResponseTemplate::new(400).set_body_json(json!({"error": "bad conf"})),
    )
    .await;

    let result = facade(&mock_server)
        .create_dag("example_dag", &json!({"key": "value"}), None)
        .await;

    assert_eq!(result.error_kind(), Some(ErrorKind::Status));
    assert_error(result, "Failed to create DAG run for example_dag");
}

#[tokio::test]
async fn test_create_dag_rejects_non_200_success() {
    let mock_server = MockServer::start().await;
    mount(
        &mock_server,
        "POST",
        "dags/example_dag/dag_runs",
        ResponseTemplate::new(201).set_body_json(json!({"message": "created"})),
    )
    .await;

    let result = facade(&mock_server)
        .create_dag("example_dag", &json!({"key": "value"}), None)
        .await;

    assert_eq!(result.error_kind(), Some(ErrorKind::Status));
    assert_error(result, "Failed to create DAG run for example_dag");
}

#[tokio::test]
async fn test_read_operations_pass_body_through() {
    let mock_server = MockServer::start().await;
    let body = json!({"state": "running", "items": [1, 2, 3]});

    let routes = [
        "dags/etl/dag_runs",
        "dags/etl/dag_runs/2022-01-01T00:00:00",
        "test",
        "dags/etl/tasks/load",
        "dags/etl/dag_runs/2022-01-01T00:00:00/tasks/load",
        "dags/etl/paused",
        "dags/etl/paused/true",
        "dags/etl/paused/false",
        "latest_runs",
        "pools",
        "pools/pool_1",
    ];
    for route in routes {
        mount(
            &mock_server,
            "GET",
            route,
            ResponseTemplate::new(200).set_body_json(&body),
        )
        .await;
    }

    let dags = facade(&mock_server);
    let date = "2022-01-01T00:00:00";
    let results = vec![
        dags.get_dag_runs("etl", None).await,
        dags.get_dag_run_info("etl", date, None).await,
        dags.test_api_server(None).await,
        dags.get_task_info("etl", "load", None).await,
        dags.get_task_instance_info("etl", date, "load", None).await,
        dags.get_dag_paused_state("etl", None).await,
        dags.pause_dag("etl", None).await,
        dags.unpause_dag("etl", None).await,
        dags.get_latest_dag_runs(None).await,
        dags.get_all_pools(None).await,
        dags.get_pool("pool_1", None).await,
    ];

    assert_eq!(results.len(), routes.len());
    for result in results {
        assert_eq!(result.body(), Some(&Body::Json(body.clone())));
    }
}

#[tokio::test]
async fn test_read_operations_report_identifiers_on_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let dags = facade(&mock_server);
    let date = "2022-01-01T00:00:00";

    let cases: Vec<(FacadeResult, &str)> = vec![
        (
            dags.get_dag_runs("example_dag", None).await,
            "Failed to get DAG runs for example_dag",
        ),
        (
            dags.get_dag_run_info("example_dag", date, None).await,
            "Failed to get DAG run info for example_dag - 2022-01-01T00:00:00",
        ),
        (
            dags.test_api_server(None).await,
            "Failed to test API server connection",
        ),
        (
            dags.get_task_info("example_dag", "task_id", None).await,
            "Failed to get task info for example_dag - task_id",
        ),
        (
            dags.get_task_instance_info("example_dag", date, "task_id", None)
                .await,
            "Failed to get task instance info for example_dag - 2022-01-01T00:00:00 - task_id",
        ),
        (
            dags.get_dag_paused_state("example_dag", None).await,
            "Failed to get paused state for example_dag",
        ),
        (
            dags.pause_dag("example_dag", None).await,
            "Failed to pause DAG example_dag",
        ),
        (
            dags.unpause_dag("example_dag", None).await,
            "Failed to unpause DAG example_dag",
        ),
        (
            dags.get_latest_dag_runs(None).await,
            "Failed to get latest DAG runs",
        ),
        (dags.get_all_pools(None).await, "Failed to get all pools"),
        (dags.get_pool("pool_1", None).await, "Failed to get pool pool_1"),
    ];

    for (result, expected) in cases {
        assert_eq!(result.error_kind(), Some(ErrorKind::Status));
        assert_error(result, expected);
    }
}

#[tokio::test]
async fn test_network_failure_has_same_shape_as_http_failure() {
    let unreachable = DagClient::new("http://127.0.0.1:1").unwrap();
    let network = unreachable.get_pool("pool_1", None).await;

    let mock_server = MockServer::start().await;
    mount(
        &mock_server,
        "GET",
        "pools/pool_1",
        ResponseTemplate::new(404),
    )
    .await;
    let http = facade(&mock_server).get_pool("pool_1", None).await;

    assert_eq!(network.error_kind(), Some(ErrorKind::Network));
    assert_eq!(http.error_kind(), Some(ErrorKind::Status));
    assert_eq!(network.into_json(), http.into_json());
}

#[tokio::test]
async fn test_text_body_is_passed_through_unparsed() {
    let mock_server = MockServer::start().await;
    mount(
        &mock_server,
        "GET",
        "test",
        ResponseTemplate::new(200).set_body_string("OK"),
    )
    .await;

    let result = facade(&mock_server).test_api_server(None).await;

    assert_eq!(result, FacadeResult::Data(Body::Text("OK".to_string())));
    assert_eq!(result.into_json(), Value::String("OK".to_string()));
}

#[tokio::test]
async fn test_create_pool_success() {
    let mock_server = MockServer::start().await;
    let created = json!({"pool": "test_pool", "slots": 5, "description": ""});

    Mock::given(method("POST"))
        .and(path("/api/experimental/pools"))
        .and(body_json(json!({"name": "test_pool", "slots": 5, "description": ""})))
        .respond_with(ResponseTemplate::new(200).set_body_json(&created))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = facade(&mock_server)
        .create_pool(&PoolSpec::new("test_pool", 5), None)
        .await;

    assert_eq!(result.into_json(), created);
}

#[tokio::test]
async fn test_create_pool_accepts_arbitrary_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/experimental/pools"))
        .and(body_json(json!({"pool_name": "test_pool", "slots": 5})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pool": "test_pool"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = facade(&mock_server)
        .create_pool(&json!({"pool_name": "test_pool", "slots": 5}), None)
        .await;

    assert!(result.is_success());
}

#[tokio::test]
async fn test_create_pool_failure() {
    let mock_server = MockServer::start().await;
    mount(
        &mock_server,
        "POST",
        "pools",
        ResponseTemplate::new(400).set_body_json(json!({"error": "Failed to create pool"})),
    )
    .await;

    let result = facade(&mock_server)
        .create_pool(&PoolSpec::new("test_pool", 5), None)
        .await;

    assert_error(result, "Failed to create pool");
}

#[tokio::test]
async fn test_delete_pool_success() {
    let mock_server = MockServer::start().await;
    mount(
        &mock_server,
        "DELETE",
        "pools/test_pool",
        ResponseTemplate::new(200).set_body_json(json!({"pool": "test_pool"})),
    )
    .await;

    let result = facade(&mock_server).delete_pool("test_pool", None).await;

    assert_eq!(result.into_json(), json!({"pool": "test_pool"}));
}

#[tokio::test]
async fn test_delete_pool_server_error() {
    let mock_server = MockServer::start().await;
    mount(
        &mock_server,
        "DELETE",
        "pools/test_pool",
        ResponseTemplate::new(500),
    )
    .await;

    let result = facade(&mock_server).delete_pool("test_pool", None).await;

    assert!(result.is_error());
    assert!(result.error_message().unwrap().contains("test_pool"));
}

#[tokio::test]
async fn test_credential_is_forwarded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/experimental/dags/etl/paused"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"is_paused": false})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = facade(&mock_server)
        .get_dag_paused_state("etl", Some("Bearer abc"))
        .await;

    assert_eq!(result.into_json(), json!({"is_paused": false}));
}

#[tokio::test]
async fn test_sticky_credential_carries_over_between_operations() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = Client::builder()
        .base_url(mock_server.uri())
        .unwrap()
        .credential_mode(CredentialMode::Sticky)
        .build()
        .unwrap();
    let dags = DagClient::from_client(client);

    assert!(dags.get_dag_runs("etl", Some("Bearer abc")).await.is_success());
    assert!(dags.get_all_pools(None).await.is_success());
}

#[tokio::test]
async fn test_unserializable_payload_is_reported() {
    use std::collections::HashMap;

    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    // JSON object keys must be strings.
    let mut conf = HashMap::new();
    conf.insert((1, 2), "value");

    let result = facade(&mock_server).create_dag("etl", &conf, None).await;

    assert_eq!(result.error_kind(), Some(ErrorKind::Configuration));
    assert_error(result, "Failed to create DAG run for etl");
}

#[tokio::test]
async fn test_timeout_has_same_shape_as_http_failure() {
    let slow_server = MockServer::start().await;
    mount(
        &slow_server,
        "GET",
        "pools/pool_1",
        ResponseTemplate::new(200)
            .set_body_json(json!({"pool": "pool_1"}))
            .set_delay(Duration::from_secs(2)),
    )
    .await;
    let client = Client::builder()
        .base_url(slow_server.uri())
        .unwrap()
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let timed_out = DagClient::from_client(client).get_pool("pool_1", None).await;

    let mock_server = MockServer::start().await;
    mount(
        &mock_server,
        "GET",
        "pools/pool_1",
        ResponseTemplate::new(404),
    )
    .await;
    let http = facade(&mock_server).get_pool("pool_1", None).await;

    assert_eq!(timed_out.error_kind(), Some(ErrorKind::Timeout));
    assert_eq!(timed_out.into_json(), http.into_json());
}

#[tokio::test]
async fn test_facade_exposes_configured_client() {
    let mock_server = MockServer::start().await;

    let sticky = Client::builder()
        .base_url(mock_server.uri())
        .unwrap()
        .credential_mode(CredentialMode::Sticky)
        .build()
        .unwrap();
    let dags = DagClient::from_client(sticky);

    assert_eq!(dags.client().credential_mode(), CredentialMode::Sticky);
    assert_eq!(
        dags.client().base_url(),
        format!("{}/api/experimental/", mock_server.uri())
    );

    let default = facade(&mock_server);
    assert_eq!(default.client().credential_mode(), CredentialMode::PerCall);
}

mod logging {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    struct ErrorCounter(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for ErrorCounter {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::ERROR {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn counting_subscriber() -> (impl Subscriber + Send + Sync, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(ErrorCounter(count.clone()));
        (subscriber, count)
    }

    #[tokio::test]
    async fn test_transport_failure_logs_one_error() {
        let mock_server = MockServer::start().await;
        mount(
            &mock_server,
            "DELETE",
            "pools/test_pool",
            ResponseTemplate::new(500),
        )
        .await;

        let (subscriber, errors) = counting_subscriber();
        let _guard = tracing::subscriber::set_default(subscriber);

        let result = facade(&mock_server).delete_pool("test_pool", None).await;

        assert!(result.is_error());
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unexpected_success_status_logs_one_error() {
        let mock_server = MockServer::start().await;
        mount(
            &mock_server,
            "DELETE",
            "pools/test_pool",
            ResponseTemplate::new(204),
        )
        .await;

        let (subscriber, errors) = counting_subscriber();
        let _guard = tracing::subscriber::set_default(subscriber);

        let result = facade(&mock_server).delete_pool("test_pool", None).await;

        assert_eq!(result.error_message(), Some("Failed to delete pool test_pool"));
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }
}
