// End-to-end webhook tests against an in-memory SQLite audit store.

use actix_web::{test, web, App};
use fraud_guard::config::{Config, DatabaseConfig, ProviderConfig, ServerConfig};
use fraud_guard::errors::{FraudError, FraudResult};
use fraud_guard::handlers;
use fraud_guard::models::{RiskTier, TransactionContext};
use fraud_guard::scoring::{AlertSink, AmountModel, ModelScorer};
use fraud_guard::signature;
use fraud_guard::store::{AuditStore, SqliteAuditStore};
use fraud_guard::RuleScorer;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

const SECRET: &str = "whsec_test_secret";

fn test_config(secret: Option<&str>) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            workers: 1,
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        },
        provider: ProviderConfig {
            api_key: None,
            webhook_secret: secret.map(str::to_string),
        },
    }
}

/// Deterministic stand-in for the probabilistic scorer.
struct StubModel(f64);

impl ModelScorer for StubModel {
    fn evaluate(&self, _ctx: &TransactionContext) -> FraudResult<Option<f64>> {
        Ok(Some(self.0))
    }
}

/// Scorer that always fails, to exercise rules-only degradation.
struct FailingModel;

impl ModelScorer for FailingModel {
    fn evaluate(&self, _ctx: &TransactionContext) -> FraudResult<Option<f64>> {
        Err(FraudError::Scorer("model backend unavailable".to_string()))
    }
}

/// Records every classification so tests can assert on tiers.
#[derive(Default)]
struct RecordingSink {
    seen: Mutex<Vec<(Option<String>, f64, String, RiskTier)>>,
}

impl AlertSink for RecordingSink {
    fn on_classified(&self, external_id: Option<&str>, score: f64, reason: &str, tier: RiskTier) {
        self.seen.lock().unwrap().push((
            external_id.map(str::to_string),
            score,
            reason.to_string(),
            tier,
        ));
    }
}

async fn memory_store() -> Arc<SqliteAuditStore> {
    // one connection keeps the in-memory database alive across queries
    let store = SqliteAuditStore::connect("sqlite::memory:", 1)
        .await
        .expect("in-memory sqlite");
    store.init().await.expect("schema init");
    Arc::new(store)
}

macro_rules! test_app {
    ($config:expr, $store:expr, $model:expr, $alerts:expr) => {{
        let model: Arc<dyn ModelScorer> = $model;
        let alerts: Arc<dyn AlertSink> = $alerts;
        let store: Arc<dyn AuditStore> = $store;
        test::init_service(
            App::new()
                .app_data(web::Data::new($config))
                .app_data(web::Data::new(RuleScorer::new()))
                .app_data(web::Data::from(model))
                .app_data(web::Data::from(alerts))
                .app_data(web::Data::from(store))
                .configure(handlers::configure_routes),
        )
        .await
    }};
}

fn event_body(object: Value) -> Vec<u8> {
    json!({
        "id": "evt_test",
        "type": "payment_intent.succeeded",
        "data": {"object": object}
    })
    .to_string()
    .into_bytes()
}

fn signed_request(body: &[u8]) -> test::TestRequest {
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    test::TestRequest::post()
        .uri("/webhook")
        .insert_header(("Stripe-Signature", signature::sign_payload(body, SECRET, ts)))
        .set_payload(body.to_vec())
}

#[actix_web::test]
async fn medium_risk_event_is_scored_and_persisted() {
    let store = memory_store().await;
    let alerts = Arc::new(RecordingSink::default());
    let app = test_app!(
        test_config(Some(SECRET)),
        store.clone(),
        Arc::new(StubModel(0.4)),
        alerts.clone()
    );

    // no email + amount >= 20000 -> rule score 0.8; blended with 0.4 -> 0.6
    let body = event_body(json!({
        "id": "pi_123",
        "amount": 25000,
        "currency": "usd"
    }));
    let resp: Value = test::call_and_read_body_json(&app, signed_request(&body).to_request()).await;
    assert_eq!(resp, json!({"received": true}));

    let rows = store.list(10).await.unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.external_id.as_deref(), Some("pi_123"));
    assert_eq!(row.event_type, "payment_intent.succeeded");
    assert_eq!(row.currency, "USD");
    assert_eq!(row.amount, 25000);
    assert!((row.risk_score - 0.6).abs() < 1e-9);
    assert_eq!(row.reason, "rules:missing_email,high_amount; ml:0.40");

    let seen = alerts.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0.as_deref(), Some("pi_123"));
    assert_eq!(seen[0].3, RiskTier::MediumRisk);
}

#[actix_web::test]
async fn bad_signature_is_rejected_without_scoring() {
    let store = memory_store().await;
    let app = test_app!(
        test_config(Some(SECRET)),
        store.clone(),
        Arc::new(StubModel(0.4)),
        Arc::new(RecordingSink::default())
    );

    let body = event_body(json!({"id": "pi_123", "amount": 25000}));
    let req = test::TestRequest::post()
        .uri("/webhook")
        .insert_header(("Stripe-Signature", "t=0,v1=deadbeef"))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    // no audit record, no classification
    assert!(store.list(10).await.unwrap().is_empty());
}

#[actix_web::test]
async fn missing_secret_rejects_every_delivery() {
    let store = memory_store().await;
    let app = test_app!(
        test_config(None),
        store.clone(),
        Arc::new(StubModel(0.4)),
        Arc::new(RecordingSink::default())
    );

    let body = event_body(json!({"id": "pi_123", "amount": 100}));
    let resp = test::call_service(&app, signed_request(&body).to_request()).await;
    assert_eq!(resp.status(), 400);
    assert!(store.list(10).await.unwrap().is_empty());
}

#[actix_web::test]
async fn scorer_failure_degrades_to_rules_only() {
    let store = memory_store().await;
    let alerts = Arc::new(RecordingSink::default());
    let app = test_app!(
        test_config(Some(SECRET)),
        store.clone(),
        Arc::new(FailingModel),
        alerts.clone()
    );

    let body = event_body(json!({
        "id": "pi_456",
        "amount": 25000,
        "currency": "eur"
    }));
    let resp = test::call_service(&app, signed_request(&body).to_request()).await;
    assert!(resp.status().is_success());

    let rows = store.list(10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!((rows[0].risk_score - 0.8).abs() < 1e-9);
    assert_eq!(rows[0].reason, "missing_email,high_amount (no ML)");

    let seen = alerts.seen.lock().unwrap();
    assert_eq!(seen[0].3, RiskTier::HighRisk);
}

#[actix_web::test]
async fn zero_amount_event_skips_the_model() {
    let store = memory_store().await;
    let app = test_app!(
        test_config(Some(SECRET)),
        store.clone(),
        Arc::new(AmountModel::new()),
        Arc::new(RecordingSink::default())
    );

    let body = event_body(json!({
        "id": "cus_1",
        "receipt_email": "a@example.com"
    }));
    let resp = test::call_service(&app, signed_request(&body).to_request()).await;
    assert!(resp.status().is_success());

    let rows = store.list(10).await.unwrap();
    assert_eq!(rows[0].reason, "no_rules_triggered (no ML)");
    assert_eq!(rows[0].risk_score, 0.0);
}

#[actix_web::test]
async fn recent_events_lists_newest_first() {
    let store = memory_store().await;
    let app = test_app!(
        test_config(Some(SECRET)),
        store.clone(),
        Arc::new(StubModel(0.4)),
        Arc::new(RecordingSink::default())
    );

    for i in 0..3 {
        let body = event_body(json!({"id": format!("pi_{}", i), "amount": 100}));
        let resp = test::call_service(&app, signed_request(&body).to_request()).await;
        assert!(resp.status().is_success());
    }

    let req = test::TestRequest::get().uri("/events").to_request();
    let resp: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["count"], 3);
    assert_eq!(resp["events"][0]["external_id"], "pi_2");
    assert_eq!(resp["events"][2]["external_id"], "pi_0");
}

#[actix_web::test]
async fn health_and_index_are_static() {
    let store = memory_store().await;
    let app = test_app!(
        test_config(None),
        store,
        Arc::new(StubModel(0.4)),
        Arc::new(RecordingSink::default())
    );

    let resp: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/health").to_request())
            .await;
    assert_eq!(resp["status"], "ok");

    let resp: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp["app"], "fraud-guard");
}
