//! handlers/support_chat_handler.rs
use actix_web::{web, HttpRequest, HttpResponse};

use crate::errors::AppError;
use crate::models::support_chat_model::SupportChatRequest;
use crate::services::auth_service::{resolve_caller, IdentityProvider};
use crate::services::support_chat_service::SupportChatService;

/// POST /api/support-chat
/// Responde `text/event-stream` con los eventos del gateway de IA.
pub async fn support_chat_endpoint(
    req: HttpRequest,
    body: web::Json<SupportChatRequest>,
    identity: web::Data<dyn IdentityProvider>,
    chat_service: web::Data<SupportChatService>,
) -> HttpResponse {
    let caller = match resolve_caller(&req, identity.get_ref()).await {
        Ok(user) => user,
        Err(e) => return e.to_response(),
    };

    let messages = body.into_inner().messages;
    if messages.is_empty() {
        return AppError::ValidationFailed("messages must not be empty".to_string()).to_response();
    }

    match chat_service.open_stream(&caller.id, messages).await {
        Ok(stream) => HttpResponse::Ok()
            .content_type("text/event-stream")
            .append_header(("Cache-Control", "no-cache"))
            .streaming(stream),
        Err(e) => {
            log::error!("(support_chat_endpoint) {}", e);
            e.to_response()
        }
    }
}
