//! handlers/variation_handler.rs
use actix_web::{web, HttpRequest, HttpResponse};

use crate::models::variation_model::{GenerateVariationsRequest, GenerateVariationsResponse};
use crate::services::auth_service::{resolve_caller, IdentityProvider};
use crate::services::variation_service::VariationService;

/// POST /api/variations
pub async fn generate_variations_endpoint(
    req: HttpRequest,
    body: web::Json<GenerateVariationsRequest>,
    identity: web::Data<dyn IdentityProvider>,
    variation_service: web::Data<VariationService>,
) -> HttpResponse {
    let caller = match resolve_caller(&req, identity.get_ref()).await {
        Ok(user) => user,
        Err(e) => return e.to_response(),
    };

    log::info!(
        "(generate_variations_endpoint) user={} count={}",
        caller.id,
        body.count
    );

    match variation_service
        .generate(&body.original_message, body.count)
        .await
    {
        Ok(variations) => HttpResponse::Ok().json(GenerateVariationsResponse {
            success: true,
            variations,
        }),
        Err(e) => {
            log::error!("(generate_variations_endpoint) {}", e);
            e.to_response()
        }
    }
}
