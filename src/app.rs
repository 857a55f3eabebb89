//! app.rs
use crate::handlers::{
    audit_handler, campaign_handler, document_handler, instance_handler, support_chat_handler,
    variation_handler,
};
use actix_web::web;

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/campaigns")
                    .route(
                        "/send",
                        web::post().to(campaign_handler::send_campaign_endpoint),
                    )
                    // Antes de "/{id}" para que no lo capture
                    .route(
                        "/risk",
                        web::get().to(campaign_handler::campaign_risk_endpoint),
                    )
                    .route("", web::get().to(campaign_handler::list_campaigns_endpoint))
                    .route(
                        "/{id}",
                        web::get().to(campaign_handler::get_campaign_endpoint),
                    ),
            )
            .route(
                "/variations",
                web::post().to(variation_handler::generate_variations_endpoint),
            )
            .route(
                "/support-chat",
                web::post().to(support_chat_handler::support_chat_endpoint),
            )
            .service(
                web::scope("/instances")
                    .route("", web::get().to(instance_handler::get_instance_endpoint))
                    .route("", web::post().to(instance_handler::create_instance_endpoint))
                    .route(
                        "",
                        web::delete().to(instance_handler::delete_instance_endpoint),
                    )
                    .route(
                        "/status",
                        web::patch().to(instance_handler::update_instance_status_endpoint),
                    ),
            )
            .service(
                web::scope("/admin")
                    .route(
                        "/audit-log",
                        web::get().to(audit_handler::audit_log_endpoint),
                    )
                    .route(
                        "/support-chats/{user_id}",
                        web::get().to(audit_handler::user_support_chat_endpoint),
                    ),
            )
            .route(
                "/documents/validate",
                web::post().to(document_handler::validate_document_endpoint),
            ),
    );
}
