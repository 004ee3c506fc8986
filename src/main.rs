use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use dotenv::dotenv;
use fraud_guard::{
    config::Config, handlers, metrics, rules::RuleScorer, scoring::AmountModel,
    scoring::LogAlertSink, store::SqliteAuditStore, AlertSink, AuditStore, ModelScorer,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .json()
        .init();

    info!("Starting fraud-guard...");

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");
    info!("Configuration loaded successfully");

    if config.provider.api_key.is_none() {
        warn!("Provider API key not set (ok if only testing /health)");
    }
    if config.provider.webhook_secret.is_none() {
        warn!("Webhook secret not set - all deliveries will be rejected");
    }

    if let Err(e) = metrics::register_metrics(prometheus::default_registry()) {
        warn!("Metrics registration failed: {}", e);
    }

    // Create audit store
    info!("Connecting to database at {}", config.database.url);
    let store = match SqliteAuditStore::connect(
        &config.database.url,
        config.database.max_connections,
    )
    .await
    {
        Ok(s) => {
            info!("Database connection pool created successfully");
            s
        }
        Err(e) => {
            error!("Failed to create database pool: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Database connection failed: {}", e),
            ));
        }
    };

    if let Err(e) = store.health_check().await {
        error!("Database health check failed: {}", e);
        return Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "Database not accessible",
        ));
    }

    let store: Arc<dyn AuditStore> = Arc::new(store);

    // Ensure schema before accepting deliveries
    if let Err(e) = store.init().await {
        error!("Audit store init failed: {}", e);
        return Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "Audit store init failed",
        ));
    }

    // Initialize scoring components
    let rules = web::Data::new(RuleScorer::new());
    let model: Arc<dyn ModelScorer> = Arc::new(AmountModel::new());
    let alerts: Arc<dyn AlertSink> = Arc::new(LogAlertSink);

    info!("Scoring components initialized successfully");

    let server_config = config.server.clone();
    let config_data = web::Data::new(config);

    info!(
        "Starting HTTP server on {}:{}",
        server_config.host, server_config.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(config_data.clone())
            .app_data(rules.clone())
            .app_data(web::Data::from(model.clone()))
            .app_data(web::Data::from(alerts.clone()))
            .app_data(web::Data::from(store.clone()))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(middleware::Logger::default())
            .configure(handlers::configure_routes)
    })
    .workers(server_config.workers)
    .bind((server_config.host, server_config.port))?
    .run()
    .await
}
