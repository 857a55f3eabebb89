//! handlers/instance_handler.rs
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::errors::AppError;
use crate::models::instance_model::{CreateInstanceRequest, UpdateInstanceStatusRequest};
use crate::services::auth_service::{resolve_caller, IdentityProvider};
use crate::services::instance_service::InstanceService;

/// GET /api/instances
pub async fn get_instance_endpoint(
    req: HttpRequest,
    identity: web::Data<dyn IdentityProvider>,
    instance_service: web::Data<InstanceService>,
) -> HttpResponse {
    let caller = match resolve_caller(&req, identity.get_ref()).await {
        Ok(user) => user,
        Err(e) => return e.to_response(),
    };

    match instance_service.find_for_user(&caller.id).await {
        Ok(Some(instance)) => HttpResponse::Ok().json(instance),
        Ok(None) => AppError::InstanceNotFound.to_response(),
        Err(e) => AppError::from(e).to_response(),
    }
}

/// POST /api/instances
pub async fn create_instance_endpoint(
    req: HttpRequest,
    body: web::Json<CreateInstanceRequest>,
    identity: web::Data<dyn IdentityProvider>,
    instance_service: web::Data<InstanceService>,
) -> HttpResponse {
    let caller = match resolve_caller(&req, identity.get_ref()).await {
        Ok(user) => user,
        Err(e) => return e.to_response(),
    };

    let instance_name = body.instance_name.trim();
    if instance_name.is_empty() {
        return AppError::ValidationFailed("instance_name is required".to_string()).to_response();
    }

    match instance_service.find_for_user(&caller.id).await {
        Ok(Some(_)) => {
            return HttpResponse::Conflict().json(json!({
                "success": false,
                "error": "User already has a WhatsApp instance"
            }))
        }
        Ok(None) => {}
        Err(e) => return AppError::from(e).to_response(),
    }

    match instance_service
        .create_instance(&caller.id, instance_name)
        .await
    {
        Ok(instance) => HttpResponse::Created().json(instance),
        Err(e) => AppError::from(e).to_response(),
    }
}

/// PATCH /api/instances/status
pub async fn update_instance_status_endpoint(
    req: HttpRequest,
    body: web::Json<UpdateInstanceStatusRequest>,
    identity: web::Data<dyn IdentityProvider>,
    instance_service: web::Data<InstanceService>,
) -> HttpResponse {
    let caller = match resolve_caller(&req, identity.get_ref()).await {
        Ok(user) => user,
        Err(e) => return e.to_response(),
    };

    match instance_service.update_status(&caller.id, body.status).await {
        Ok(instance) => HttpResponse::Ok().json(instance),
        Err(e) => e.to_response(),
    }
}

/// DELETE /api/instances
pub async fn delete_instance_endpoint(
    req: HttpRequest,
    identity: web::Data<dyn IdentityProvider>,
    instance_service: web::Data<InstanceService>,
) -> HttpResponse {
    let caller = match resolve_caller(&req, identity.get_ref()).await {
        Ok(user) => user,
        Err(e) => return e.to_response(),
    };

    match instance_service.delete_instance(&caller.id).await {
        Ok(()) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": "WhatsApp disconnected successfully"
        })),
        Err(e) => {
            log::error!("(delete_instance_endpoint) {}", e);
            e.to_response()
        }
    }
}
