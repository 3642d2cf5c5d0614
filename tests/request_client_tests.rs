//! Request client integration tests against the mock orchestrator


use mock_orchestrator::{MockOrchestrator, StoredProperty, closed_port, connect_to};
use reqwest::Method;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use unoq_link::errors::LinkError;
use unoq_link::models::app::AppStatus;
use unoq_link::remote::RequestClient;
use unoq_link::session::ConnectionSession;
use unoq_link::tunnel::{AdbHelper, TunnelManager};
use tokio_util::sync::CancellationToken;

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_get_decodes_versioned_endpoint() {
    let mock = MockOrchestrator::start().await;
    let orchestrator = mock.connect(TIMEOUT).await;

    let version = orchestrator.system().version().await.unwrap();
    assert_eq!(version.version, "0.5.0");
    assert_eq!(version.build.as_deref(), Some("20251001"));
    assert!(mock.requests().contains(&"GET /v1/version".to_string()));
}

#[tokio::test]
async fn test_query_parameters_are_forwarded() {
    let mock = MockOrchestrator::start().await;
    let orchestrator = mock.connect(TIMEOUT).await;

    let all = orchestrator.apps().list_apps(None, None).await.unwrap();
    assert_eq!(all.len(), 2);

    let running = orchestrator
        .apps()
        .list_apps(None, Some("running"))
        .await
        .unwrap();
    assert_eq!(running.len(), 1);
    assert_eq!(running[0].id, "blink");
    assert_eq!(running[0].status, AppStatus::Running);
    assert!(running[0].default);

    let ports = orchestrator.apps().exposed_ports("blink").await.unwrap();
    assert_eq!(ports[0].port, 7000);
}

#[tokio::test]
async fn test_remote_error_carries_body_message() {
    let mock = MockOrchestrator::start().await;
    let orchestrator = mock.connect(TIMEOUT).await;

    match orchestrator.apps().get_app("ghost").await {
        Err(LinkError::Remote { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "app ghost not found");
        }
        other => panic!("Expected remote error, got: {:?}", other),
    }

    match orchestrator.apps().get_app("broken").await {
        Err(err @ LinkError::Remote { status: 500, .. }) => {
            assert_eq!(err.to_string(), "database locked");
        }
        other => panic!("Expected remote error, got: {:?}", other),
    }
}

#[tokio::test]
async fn test_slow_request_times_out() {
    let mock = MockOrchestrator::start().await;
    let orchestrator = mock.connect(Duration::from_millis(200)).await;

    let result: Result<Value, _> = orchestrator.requests().get("/slow", &[]).await;
    assert!(matches!(result, Err(LinkError::Timeout)));
}

#[tokio::test]
async fn test_cancelled_request_reports_cancelled() {
    let mock = MockOrchestrator::start().await;
    let orchestrator = mock.connect(TIMEOUT).await;

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let result: Result<Value, _> = orchestrator
        .requests()
        .request_cancellable::<Value, ()>(Method::GET, "/slow", None, &[], &token)
        .await;
    assert!(matches!(result, Err(LinkError::Cancelled)));
}

#[tokio::test]
async fn test_unreachable_board_is_a_transport_error() {
    let orchestrator = connect_to(closed_port(), TIMEOUT).await;

    let err = orchestrator.system().version().await.unwrap_err();
    assert!(matches!(err, LinkError::Http(_)));
    assert!(err.is_connectivity());
}

#[tokio::test]
async fn test_request_without_connection_is_not_connected() {
    let helper = Arc::new(AdbHelper::new(None));
    let session = Arc::new(ConnectionSession::new(TunnelManager::new(helper, 8800), 8800));
    let client = RequestClient::new(session);

    let result: Result<Value, _> = client.get("/version", &[]).await;
    assert!(matches!(result, Err(LinkError::NotConnected)));
}

#[tokio::test]
async fn test_board_name_falls_back_to_product_name() {
    let mock = MockOrchestrator::start().await;
    let orchestrator = mock.connect(TIMEOUT).await;

    assert_eq!(orchestrator.system().board_name().await, "Bench Board");
    assert!(
        orchestrator
            .system()
            .get_property("wifi.ssid")
            .await
            .is_err()
    );

    let offline = connect_to(closed_port(), TIMEOUT).await;
    assert_eq!(offline.system().board_name().await, "Arduino UNO Q");
}

#[tokio::test]
async fn test_post_sends_json_body_and_query_together() {
    let mock = MockOrchestrator::start().await;
    let orchestrator = mock.connect(TIMEOUT).await;

    let echo: Value = orchestrator
        .requests()
        .post(
            "/echo",
            Some(&json!({"name": "blink", "tags": ["a", "b"]})),
            &[("dry-run", "true"), ("note", "a b&c")],
        )
        .await
        .unwrap();

    assert_eq!(echo["method"], "POST");
    assert_eq!(echo["query"], json!({"dry-run": "true", "note": "a b&c"}));
    assert_eq!(echo["body"], json!({"name": "blink", "tags": ["a", "b"]}));
    assert!(
        echo["content_type"]
            .as_str()
            .unwrap()
            .starts_with("application/json")
    );
}

#[tokio::test]
async fn test_put_and_patch_send_json_bodies() {
    let mock = MockOrchestrator::start().await;
    let orchestrator = mock.connect(TIMEOUT).await;

    let put: Value = orchestrator
        .requests()
        .put("/echo", Some(&json!({"enabled": false})), &[("id", "blink")])
        .await
        .unwrap();
    assert_eq!(put["method"], "PUT");
    assert_eq!(put["query"]["id"], "blink");
    assert_eq!(put["body"], json!({"enabled": false}));

    let patch: Value = orchestrator
        .requests()
        .patch("/echo", &json!({"status": "stopped"}))
        .await
        .unwrap();
    assert_eq!(patch["method"], "PATCH");
    assert_eq!(patch["query"], json!({}));
    assert_eq!(patch["body"], json!({"status": "stopped"}));

    let empty: Value = orchestrator
        .requests()
        .post::<Value, Value>("/echo", None, &[])
        .await
        .unwrap();
    assert_eq!(empty["body"], Value::Null);
}

#[tokio::test]
async fn test_set_property_sends_raw_text() {
    let mock = MockOrchestrator::start().await;
    let orchestrator = mock.connect(TIMEOUT).await;

    orchestrator
        .system()
        .set_property("board.name", "My Bench \"Q\"")
        .await
        .unwrap();

    assert_eq!(
        mock.properties(),
        vec![StoredProperty {
            key: "board.name".to_string(),
            content_type: Some("text/plain".to_string()),
            body: "My Bench \"Q\"".to_string(),
        }]
    );
    assert!(
        mock.requests()
            .contains(&"PUT /v1/properties/board.name".to_string())
    );
}
