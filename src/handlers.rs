use crate::config::Config;
use crate::errors::FraudError;
use crate::metrics::{
    AUDIT_PERSIST_FAILURES, MODEL_SCORER_FAILURES, RISK_TIER_TOTAL, SCORED_AMOUNT,
    WEBHOOK_DELIVERIES,
};
use crate::models::{HealthResponse, NewAuditRecord, RecentEventsResponse, RiskTier, TransactionContext};
use crate::rules::RuleScorer;
use crate::scoring::{self, AlertSink, ModelScorer};
use crate::signature;
use crate::store::AuditStore;
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::{error, warn};

/// How many audit records the recent-events endpoint returns.
const RECENT_EVENTS_LIMIT: i64 = 50;

const SIGNATURE_HEADER: &str = "Stripe-Signature";

// ===== Index =====
pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(json!({"app": "fraud-guard", "status": "running"}))
}

// ===== Health Check =====
// Static by design: reports process liveness, not dependency health.
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ===== Webhook =====
pub async fn webhook(
    req: HttpRequest,
    body: web::Bytes,
    config: web::Data<Config>,
    rules: web::Data<RuleScorer>,
    model: web::Data<dyn ModelScorer>,
    alerts: web::Data<dyn AlertSink>,
    store: web::Data<dyn AuditStore>,
) -> Result<HttpResponse, FraudError> {
    // Without a secret every delivery is rejected
    let secret = match config.provider.webhook_secret.as_deref() {
        Some(s) => s,
        None => {
            WEBHOOK_DELIVERIES.with_label_values(&["rejected"]).inc();
            return Err(FraudError::Authenticity(
                "webhook secret not configured".to_string(),
            ));
        }
    };

    let sig_header = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let event = match signature::construct_event(&body, sig_header, secret) {
        Ok(event) => event,
        Err(e) => {
            warn!("Webhook verification failed: {}", e);
            WEBHOOK_DELIVERIES.with_label_values(&["rejected"]).inc();
            return Err(e);
        }
    };

    let ctx = TransactionContext::from_event_object(&event.data.object);
    let external_id = ctx.external_id();

    let (rule_score, rule_reason) = rules.score(&ctx);

    // A scorer failure degrades to rules-only, it never fails the delivery
    let model_prob = match model.evaluate(&ctx) {
        Ok(prob) => prob,
        Err(e) => {
            warn!("ML scorer error: {}", e);
            MODEL_SCORER_FAILURES.inc();
            None
        }
    };

    let (composite, reason) = scoring::combine(rule_score, &rule_reason, model_prob);

    let record = NewAuditRecord::from_context(&ctx, &event.event_type, composite, &reason);
    if let Err(e) = store.insert(record).await {
        // The delivery is still acknowledged (the provider would otherwise
        // redeliver and double-score), but audit loss is never silent.
        error!(
            "Audit record lost for event {}: {}",
            external_id.as_deref().unwrap_or("unknown"),
            e
        );
        AUDIT_PERSIST_FAILURES.inc();
    }

    let tier = RiskTier::classify(composite);
    alerts.on_classified(external_id.as_deref(), composite, &reason, tier);

    SCORED_AMOUNT.observe(ctx.amount as f64);
    let tier_label = tier.to_string();
    RISK_TIER_TOTAL.with_label_values(&[tier_label.as_str()]).inc();
    WEBHOOK_DELIVERIES.with_label_values(&["accepted"]).inc();

    Ok(HttpResponse::Ok().json(json!({"received": true})))
}

// ===== Recent Events =====
pub async fn recent_events(store: web::Data<dyn AuditStore>) -> Result<HttpResponse, FraudError> {
    let events = store.list(RECENT_EVENTS_LIMIT).await?;

    Ok(HttpResponse::Ok().json(RecentEventsResponse {
        count: events.len(),
        events,
    }))
}

// ===== Metrics =====
pub async fn metrics_endpoint() -> HttpResponse {
    match crate::metrics::metrics_output() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

// ===== Configure Routes =====
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/health", web::get().to(health_check))
        .route("/webhook", web::post().to(webhook))
        .route("/events", web::get().to(recent_events))
        .route("/metrics", web::get().to(metrics_endpoint));
}
