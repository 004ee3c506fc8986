pub mod config;
pub mod errors;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod rules;
pub mod scoring;
pub mod signature;
pub mod store;

// Re-exports for convenience
pub use rules::RuleScorer;
pub use scoring::{AlertSink, AmountModel, LogAlertSink, ModelScorer};
pub use store::{AuditStore, SqliteAuditStore};
