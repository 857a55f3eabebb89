//! handlers/audit_handler.rs
//! Endpoints solo para admins. Cada consulta queda registrada.

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::db::now_timestamp;
use crate::errors::AppError;
use crate::models::audit_model::{ActionType, AuditLogQuery};
use crate::services::audit_service::AuditService;
use crate::services::auth_service::{resolve_caller, IdentityProvider};
use crate::services::support_chat_service::SupportChatService;

/// GET /api/admin/audit-log?action_type=...
pub async fn audit_log_endpoint(
    req: HttpRequest,
    query: web::Query<AuditLogQuery>,
    identity: web::Data<dyn IdentityProvider>,
    audit_service: web::Data<AuditService>,
) -> HttpResponse {
    let caller = match resolve_caller(&req, identity.get_ref()).await {
        Ok(user) => user,
        Err(e) => return e.to_response(),
    };
    if let Err(e) = audit_service.require_admin(&caller.id).await {
        return e.to_response();
    }

    let filter = match query.action_type.as_deref() {
        None | Some("all") | Some("") => None,
        Some(raw) => match raw.parse::<ActionType>() {
            Ok(action) => Some(action),
            Err(e) => return AppError::ValidationFailed(e.to_string()).to_response(),
        },
    };

    if let Err(e) = audit_service
        .record_action(
            &caller.id,
            ActionType::ViewAuditLog,
            None,
            json!({ "timestamp": now_timestamp() }),
        )
        .await
    {
        log::error!("(audit_log_endpoint) No se pudo registrar el acceso: {:?}", e);
    }

    match audit_service.list_recent(filter).await {
        Ok(entries) => HttpResponse::Ok().json(entries),
        Err(e) => AppError::from(e).to_response(),
    }
}

/// GET /api/admin/support-chats/{user_id}
pub async fn user_support_chat_endpoint(
    req: HttpRequest,
    path: web::Path<String>,
    identity: web::Data<dyn IdentityProvider>,
    audit_service: web::Data<AuditService>,
    chat_service: web::Data<SupportChatService>,
) -> HttpResponse {
    let caller = match resolve_caller(&req, identity.get_ref()).await {
        Ok(user) => user,
        Err(e) => return e.to_response(),
    };
    if let Err(e) = audit_service.require_admin(&caller.id).await {
        return e.to_response();
    }
    let target_user_id = path.into_inner();

    // Sin registro de auditoría no se muestra la conversación
    if let Err(e) = audit_service
        .record_action(
            &caller.id,
            ActionType::ViewSupportChat,
            Some(&target_user_id),
            json!({ "timestamp": now_timestamp() }),
        )
        .await
    {
        return AppError::from(e).to_response();
    }

    match chat_service.list_for_user(&target_user_id).await {
        Ok(messages) => HttpResponse::Ok().json(messages),
        Err(e) => AppError::from(e).to_response(),
    }
}
