//! HTTP surface tests: boot the server on an ephemeral port and drive it
//! with a real client.

use cadence_server::{create_app_state, start_server_with_state, ServerConfig};

async fn boot() -> String {
    let config = ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        ..Default::default()
    };
    let state = create_app_state(&config).expect("state");
    let addr = start_server_with_state(config, state).await.expect("bind");
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_health_and_status() {
    let base = boot().await;
    let client = reqwest::Client::new();

    let health: serde_json::Value = client
        .get(format!("{}/api/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["server"], "cadence-server");

    let status: serde_json::Value = client
        .get(format!("{}/api/status", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["workflows_run"], 0);
    assert_eq!(status["compliance_enforced"], true);
}

#[tokio::test]
async fn test_execute_ideate_via_http() {
    let base = boot().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/modes/ideate", base))
        .json(&serde_json::json!({ "prompt": "a task tracker" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["mode"], "IDEATE");
    assert_eq!(body["result"]["mode"], "IDEATE");
    assert!(body["result"]["vision_document"].is_object());

    // The run shows up in history afterwards.
    let history: serde_json::Value = client
        .get(format!("{}/api/history?mode=IDEATE", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history["history"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_mode_is_404_and_bad_body_is_400() {
    let base = boot().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/modes/deploy", base))
        .json(&serde_json::json!({ "prompt": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    // VALIDATE without build_output is malformed.
    let response = client
        .post(format!("{}/api/modes/validate", base))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn test_agents_endpoint_lists_builtin_roster() {
    let base = boot().await;
    let client = reqwest::Client::new();

    let body: serde_json::Value = client
        .get(format!("{}/api/agents", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["registry"]["total"], 10);
    assert_eq!(body["registry"]["active"], 0);
}
