use lazy_static::lazy_static;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

lazy_static! {
    // Webhook delivery metrics
    pub static ref WEBHOOK_DELIVERIES: IntCounterVec = IntCounterVec::new(
        Opts::new("webhook_deliveries_total", "Webhook deliveries by outcome"),
        &["outcome"]
    ).expect("metric can be created");

    pub static ref RISK_TIER_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("risk_tier_total", "Classified events by risk tier"),
        &["tier"]
    ).expect("metric can be created");

    pub static ref MODEL_SCORER_FAILURES: IntCounter = IntCounter::new(
        "model_scorer_failures_total",
        "Probabilistic scorer failures degraded to rules-only scoring"
    ).expect("metric can be created");

    // Audit store metrics
    pub static ref AUDIT_PERSIST_FAILURES: IntCounter = IntCounter::new(
        "audit_persist_failures_total",
        "Audit records lost to storage failures"
    ).expect("metric can be created");

    pub static ref SCORED_AMOUNT: Histogram = Histogram::with_opts(
        HistogramOpts::new("scored_amount_minor_units", "Distribution of scored transaction amounts")
            .buckets(vec![100.0, 1000.0, 10000.0, 20000.0, 100000.0, 1000000.0])
    ).expect("metric can be created");
}

/// Register all metrics with the given registry
pub fn register_metrics(registry: &Registry) -> Result<(), Box<dyn std::error::Error>> {
    registry.register(Box::new(WEBHOOK_DELIVERIES.clone()))?;
    registry.register(Box::new(RISK_TIER_TOTAL.clone()))?;
    registry.register(Box::new(MODEL_SCORER_FAILURES.clone()))?;
    registry.register(Box::new(AUDIT_PERSIST_FAILURES.clone()))?;
    registry.register(Box::new(SCORED_AMOUNT.clone()))?;

    Ok(())
}

/// Generate metrics output in Prometheus text format
pub fn metrics_output() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
