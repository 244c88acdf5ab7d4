//! HTTP surface served on an ephemeral port, called with reqwest

use std::sync::Arc;

use pallet_gateway::config::AppConfig;
use pallet_gateway::gateway::{self, state::AppState};
use pallet_gateway::{MemoryStore, Store};
use serde_json::{Value, json};
use tokio::net::TcpListener;

struct Server {
    base: String,
    client: reqwest::Client,
    store: Arc<MemoryStore>,
    outbox_dir: tempfile::TempDir,
}

async fn spawn_server() -> Server {
    let outbox_dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.outbox.dir = outbox_dir.path().to_string_lossy().into_owned();

    let store = Arc::new(MemoryStore::new());
    let state = Arc::new(AppState::from_config(store.clone(), &config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = gateway::serve(listener, state).await;
    });

    Server {
        base: format!("http://{}", addr),
        client: reqwest::Client::new(),
        store,
        outbox_dir,
    }
}

fn transfer_body(to: &str) -> Value {
    json!({
        "pallet_id": "PAL-1",
        "from_location": "COLD-A",
        "to_location": to,
        "requested_by": "picker-7"
    })
}

impl Server {
    async fn post(&self, path: &str, body: Option<Value>) -> reqwest::Response {
        let mut req = self.client.post(format!("{}{}", self.base, path));
        if let Some(body) = body {
            req = req.json(&body);
        }
        req.send().await.unwrap()
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base, path))
            .send()
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn transfer_lifecycle_over_http() {
    let srv = spawn_server().await;

    let resp = srv
        .post("/api/transfers", Some(transfer_body("DOCK1")))
        .await;
    assert_eq!(resp.status(), 201);
    let created: Value = resp.json().await.unwrap();
    assert_eq!(created["status"], "pending");
    assert!(created.get("approved_by").is_none());
    let id = created["id"].as_str().unwrap().to_string();

    let fetched: Value = srv
        .get(&format!("/api/transfers/{}", id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, created);

    let resp = srv
        .post(&format!("/api/transfers/{}/accept", id), None)
        .await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.json::<Value>().await.unwrap(), json!({"status": "accepted"}));

    let resp = srv
        .post(&format!("/api/transfers/{}/accept", id), None)
        .await;
    assert_eq!(resp.status(), 409);

    let resp = srv
        .post(&format!("/api/transfers/{}/complete", id), None)
        .await;
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.json::<Value>().await.unwrap(),
        json!({"status": "completed"})
    );
}

#[tokio::test]
async fn error_statuses() {
    let srv = spawn_server().await;

    let resp = srv.get("/api/transfers/01J9Z3M8Q2W7T6V5X4Y3Z2A1B0").await;
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], 4001);
    assert!(body["msg"].is_string());

    let resp = srv.post("/api/transfers/not-an-id/accept", None).await;
    assert_eq!(resp.status(), 404);

    let resp = srv
        .post("/api/transfers", Some(json!({"pallet_id": "PAL-1"})))
        .await;
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.json::<Value>().await.unwrap()["code"], 1001);

    let mut bad = transfer_body("DOCK1");
    bad["pallet_id"] = json!("");
    let resp = srv.post("/api/transfers", Some(bad)).await;
    assert_eq!(resp.status(), 400);

    for _ in 0..5 {
        let resp = srv
            .post("/api/transfers", Some(transfer_body("DOCK9")))
            .await;
        assert_eq!(resp.status(), 201);
    }
    let resp = srv
        .post("/api/transfers", Some(transfer_body("DOCK9")))
        .await;
    assert_eq!(resp.status(), 422);
    assert_eq!(resp.json::<Value>().await.unwrap()["code"], 4003);
}

#[tokio::test]
async fn idempotency_key_header() {
    let srv = spawn_server().await;
    let send = || {
        srv.client
            .post(format!("{}/api/transfers", srv.base))
            .header("Idempotency-Key", "order-42")
            .json(&transfer_body("DOCK1"))
            .send()
    };

    assert_eq!(send().await.unwrap().status(), 201);
    let resp = send().await.unwrap();
    assert_eq!(resp.status(), 409);
    assert_eq!(resp.json::<Value>().await.unwrap()["code"], 1002);
    assert_eq!(srv.store.outbox_events().len(), 1);
}

#[tokio::test]
async fn non_ascii_idempotency_key_is_rejected() {
    let srv = spawn_server().await;
    let key = reqwest::header::HeaderValue::from_bytes(b"caf\xc3\xa9").unwrap();

    let resp = srv
        .client
        .post(format!("{}/api/transfers", srv.base))
        .header("Idempotency-Key", key)
        .json(&transfer_body("DOCK1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(resp.json::<Value>().await.unwrap()["code"], 1001);
    assert_eq!(srv.store.transfer_count(), 0);
    assert!(srv.store.outbox_events().is_empty());
}

#[tokio::test]
async fn temperatures_alerts_and_flush() {
    let srv = spawn_server().await;

    let resp = srv
        .post(
            "/api/temperatures",
            Some(json!([
                {"room_id": "R1", "temp": 12.0},
                {"room_id": "R2", "temp": 2.0, "ts": "2024-05-01T10:30:00Z"}
            ])),
        )
        .await;
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.json::<Value>().await.unwrap(),
        json!({"readings": 2, "alerts": 1})
    );

    let alerts: Value = srv.get("/api/alerts").await.json().await.unwrap();
    assert_eq!(alerts.as_array().unwrap().len(), 1);
    assert_eq!(alerts[0]["room_id"], "R1");
    assert_eq!(alerts[0]["level"], "critical");

    let text = srv.get("/metrics").await.text().await.unwrap();
    assert!(text.contains("pallet_gateway_readings_ingested_total 2"));
    assert!(text.contains("pallet_gateway_alerts_raised_total 1"));

    let resp = srv.post("/api/temperatures", Some(json!({"room_id": "R1"}))).await;
    assert_eq!(resp.status(), 400);

    let resp = srv.post("/api/temperatures/dev/flush-outbox", None).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.json::<Value>().await.unwrap(),
        json!({"status": "flushed"})
    );
    assert!(srv.store.fetch_unpublished().await.unwrap().is_empty());
    assert_eq!(std::fs::read_dir(srv.outbox_dir.path()).unwrap().count(), 1);

    let resp = srv.post("/api/dev/flush-outbox", None).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(std::fs::read_dir(srv.outbox_dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn health_metrics_and_docs() {
    let srv = spawn_server().await;

    let resp = srv.get("/api/health").await;
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.json::<Value>().await.unwrap(),
        json!({"status": "ok", "storage": "memory"})
    );

    srv.post("/api/transfers", Some(transfer_body("DOCK1"))).await;
    let text = srv.get("/metrics").await.text().await.unwrap();
    assert!(text.contains("pallet_gateway_transfers_created_total 1"));
    assert!(text.contains("pallet_gateway_outbox_pending 1"));

    let spec: Value = srv
        .get("/api-docs/openapi.json")
        .await
        .json()
        .await
        .unwrap();
    assert!(spec["paths"]["/api/transfers"].is_object());
}
