use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ===== Webhook Event =====
/// A verified provider event, as handed back by signature verification.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type", default = "unknown_event_type")]
    pub event_type: String,
    #[serde(default)]
    pub data: EventData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventData {
    #[serde(default)]
    pub object: Value,
}

fn unknown_event_type() -> String {
    "unknown".to_string()
}

// ===== Transaction Context =====
/// Per-request scoring input, extracted from the event's data object.
/// Ephemeral: built fresh for each delivery and dropped once the audit
/// record exists.
#[derive(Debug, Clone)]
pub struct TransactionContext {
    pub email: Option<String>,
    pub ip_address: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub raw_payload: Value,
}

impl TransactionContext {
    /// Extract scoring fields from a provider data object, defensively.
    ///
    /// Fallback precedence mirrors the provider's payload variants:
    /// email from `receipt_email`, then `billing_details.email`, then
    /// `customer_email`; amount from `amount`, then `amount_received`,
    /// then 0. Malformed or missing fields never abort extraction.
    pub fn from_event_object(data: &Value) -> Self {
        let email = non_empty_str(&data["receipt_email"])
            .or_else(|| non_empty_str(&data["billing_details"]["email"]))
            .or_else(|| non_empty_str(&data["customer_email"]));

        // may be absent depending on event type
        let ip_address = non_empty_str(&data["client_ip"]);

        let amount = nonzero_amount(&data["amount"])
            .or_else(|| nonzero_amount(&data["amount_received"]))
            .unwrap_or(0);

        let currency = data["currency"]
            .as_str()
            .unwrap_or("")
            .to_ascii_uppercase();

        TransactionContext {
            email,
            ip_address,
            amount,
            currency,
            raw_payload: data.clone(),
        }
    }

    pub fn external_id(&self) -> Option<String> {
        non_empty_str(&self.raw_payload["id"])
    }
}

fn non_empty_str(v: &Value) -> Option<String> {
    v.as_str().filter(|s| !s.is_empty()).map(str::to_string)
}

fn nonzero_amount(v: &Value) -> Option<i64> {
    v.as_i64().filter(|a| *a != 0)
}

// ===== Risk Tier =====
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    HighRisk,   // Alert-worthy
    MediumRisk, // Warning-worthy
    LowRisk,    // Informational
}

impl RiskTier {
    /// Classify a composite score in [0,1] into an operator-facing tier.
    pub fn classify(composite: f64) -> Self {
        match composite {
            s if s >= 0.8 => RiskTier::HighRisk,
            s if s >= 0.5 => RiskTier::MediumRisk,
            _ => RiskTier::LowRisk,
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskTier::HighRisk => write!(f, "HIGH_RISK"),
            RiskTier::MediumRisk => write!(f, "MEDIUM_RISK"),
            RiskTier::LowRisk => write!(f, "LOW_RISK"),
        }
    }
}

// ===== Audit Record =====
/// One durable row per processed event. Append-only: never updated or
/// deleted by this service.
#[derive(Debug, Serialize, Clone, sqlx::FromRow)]
pub struct AuditRecord {
    pub id: i64,
    pub external_id: Option<String>,
    pub event_type: String,
    pub created_at: DateTime<Utc>,
    pub payload: String,
    pub email: Option<String>,
    pub ip_address: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub risk_score: f64,
    pub reason: String,
}

/// Insert payload for an audit record; the store assigns `id` and
/// `created_at`.
#[derive(Debug, Clone)]
pub struct NewAuditRecord {
    pub external_id: Option<String>,
    pub event_type: String,
    pub payload: String,
    pub email: Option<String>,
    pub ip_address: Option<String>,
    pub amount: i64,
    pub currency: String,
    pub risk_score: f64,
    pub reason: String,
}

impl NewAuditRecord {
    pub fn from_context(
        ctx: &TransactionContext,
        event_type: &str,
        risk_score: f64,
        reason: &str,
    ) -> Self {
        NewAuditRecord {
            external_id: ctx.external_id(),
            event_type: event_type.to_string(),
            payload: ctx.raw_payload.to_string(),
            email: ctx.email.clone(),
            ip_address: ctx.ip_address.clone(),
            amount: ctx.amount,
            currency: ctx.currency.clone(),
            risk_score,
            reason: reason.to_string(),
        }
    }
}

// ===== API Responses =====
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct RecentEventsResponse {
    pub count: usize,
    pub events: Vec<AuditRecord>,
}
