//! handlers/document_handler.rs
use actix_web::{web, HttpResponse};

use crate::models::document_model::{ValidateDocumentRequest, ValidateDocumentResponse};
use crate::services::document_service;

/// POST /api/documents/validate
pub async fn validate_document_endpoint(body: web::Json<ValidateDocumentRequest>) -> HttpResponse {
    let document = &body.document;

    HttpResponse::Ok().json(ValidateDocumentResponse {
        valid: document_service::validate(document),
        formatted: document_service::format(document),
        kind: document_service::detect_kind(document),
        kind_name: document_service::kind_name(document).to_string(),
    })
}
