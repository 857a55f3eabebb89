//! errors.rs
//! Taxonomía de errores del servicio y su traducción a respuestas HTTP.

use actix_web::{http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Token ausente o inválido
    #[error("Unauthorized")]
    Unauthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("WhatsApp instance not found. Please connect your WhatsApp first.")]
    InstanceNotFound,

    #[error("WhatsApp is not connected. Please scan the QR code first.")]
    InstanceNotConnected,

    #[error("At least one recipient is required")]
    NoRecipients,

    /// Falla al escribir la campaña; no se envía nada
    #[error("Campaign creation failed: {0}")]
    CampaignCreateFailed(String),

    #[error("Campaign not found")]
    CampaignNotFound,

    #[error("Original message is required")]
    EmptyMessage,

    #[error("Rate limit exceeded, try again in a few moments")]
    RateLimited,

    #[error("AI credits exhausted")]
    QuotaExceeded,

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InstanceNotFound | AppError::CampaignNotFound => StatusCode::NOT_FOUND,
            AppError::InstanceNotConnected => StatusCode::CONFLICT,
            AppError::NoRecipients | AppError::EmptyMessage | AppError::ValidationFailed(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::QuotaExceeded => StatusCode::PAYMENT_REQUIRED,
            AppError::CampaignCreateFailed(_)
            | AppError::GenerationFailed(_)
            | AppError::Config(_)
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Respuesta JSON uniforme `{ success: false, error }`
    pub fn to_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": self.to_string()
        }))
    }
}
