use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FraudError {
    #[error("Authenticity error: {0}")]
    Authenticity(String),

    #[error("Scorer error: {0}")]
    Scorer(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for FraudError {
    fn error_response(&self) -> HttpResponse {
        match self {
            FraudError::Authenticity(_) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "AUTHENTICITY_ERROR",
                "message": self.to_string()
            })),
            FraudError::Scorer(_) => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "SCORER_ERROR",
                "message": self.to_string()
            })),
            FraudError::Persistence(_) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "PERSISTENCE_ERROR",
                    "message": self.to_string()
                }))
            }
            FraudError::Configuration(_) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "CONFIGURATION_ERROR",
                    "message": self.to_string()
                }))
            }
            FraudError::Internal(_) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "INTERNAL_ERROR",
                    "message": self.to_string()
                }))
            }
        }
    }
}

pub type FraudResult<T> = Result<T, FraudError>;
