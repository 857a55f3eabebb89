//! tests/handler_tests.rs
//! Endpoints HTTP montados sobre la app real, con identidad y gateway en memoria.

use std::sync::Arc;
use std::time::Duration;

use actix_web::{test, web, App};
use serde_json::{json, Value};
use sqlx::{Pool, Sqlite};

use super::support::{grant_role, seed_instance, test_db, RecordingGateway, StaticIdentity};
use crate::app;
use crate::config::{AppConfig, SendPolicy};
use crate::models::instance_model::InstanceStatus;
use crate::services::ai_gateway_service::AiGatewayService;
use crate::services::audit_service::AuditService;
use crate::services::auth_service::IdentityProvider;
use crate::services::campaign_service::CampaignService;
use crate::services::dispatch_service::DispatchService;
use crate::services::instance_service::InstanceService;
use crate::services::message_log_service::MessageLogService;
use crate::services::support_chat_service::SupportChatService;
use crate::services::variation_service::VariationService;

fn app_state(pool: Pool<Sqlite>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let identity: Arc<dyn IdentityProvider> = Arc::new(
            StaticIdentity::new()
                .with_user("tok-user", "user-1")
                .with_user("tok-other", "user-2")
                .with_user("tok-admin", "admin-1"),
        );
        let campaign_service = CampaignService::new(pool.clone());
        let log_service = MessageLogService::new(pool.clone());
        let instance_service = InstanceService::new(pool.clone(), String::new(), String::new());
        let dispatch_service = DispatchService::new(
            campaign_service.clone(),
            log_service.clone(),
            instance_service.clone(),
            Arc::new(RecordingGateway::failing_for(&["999"])),
            SendPolicy {
                stagger: Duration::ZERO,
                max_concurrency: 2,
            },
        );
        let ai_gateway = AiGatewayService::new(String::new(), None, "m".to_string());

        cfg.app_data(web::Data::new(AppConfig::default()))
            .app_data(web::Data::from(identity))
            .app_data(web::Data::new(campaign_service))
            .app_data(web::Data::new(log_service))
            .app_data(web::Data::new(instance_service))
            .app_data(web::Data::new(dispatch_service))
            .app_data(web::Data::new(AuditService::new(pool.clone(), 500)))
            .app_data(web::Data::new(VariationService::new(ai_gateway.clone(), 10)))
            .app_data(web::Data::new(SupportChatService::new(pool, ai_gateway)));
        app::init_app(cfg);
    }
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

#[actix_rt::test]
async fn test_validate_document_endpoint() {
    let db = test_db().await;
    let app = test::init_service(App::new().configure(app_state(db.pool.clone()))).await;

    let req = test::TestRequest::post()
        .uri("/api/documents/validate")
        .set_json(json!({ "document": "52998224725" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["valid"], true);
    assert_eq!(body["formatted"], "529.982.247-25");
    assert_eq!(body["kind"], "cpf");
    assert_eq!(body["kind_name"], "CPF");
}

#[actix_rt::test]
async fn test_send_requires_auth_and_connected_instance() {
    let db = test_db().await;
    seed_instance(&db.pool, "user-1", InstanceStatus::Disconnected).await;
    let app = test::init_service(App::new().configure(app_state(db.pool.clone()))).await;
    let payload = json!({
        "recipients": [{ "name": "Ana", "phone": "1" }],
        "message": "Oi {nome}"
    });

    let req = test::TestRequest::post()
        .uri("/api/campaigns/send")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 401);

    let req = test::TestRequest::post()
        .uri("/api/campaigns/send")
        .insert_header(bearer("tok-invalid"))
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 401);

    let req = test::TestRequest::post()
        .uri("/api/campaigns/send")
        .insert_header(bearer("tok-user"))
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 409);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
}

#[actix_rt::test]
async fn test_send_and_view_campaign() {
    let db = test_db().await;
    seed_instance(&db.pool, "user-1", InstanceStatus::Connected).await;
    let app = test::init_service(App::new().configure(app_state(db.pool.clone()))).await;

    let req = test::TestRequest::post()
        .uri("/api/campaigns/send")
        .insert_header(bearer("tok-user"))
        .set_json(json!({
            "clients": [
                { "Nome do Cliente": "Ana", "Telefone do Cliente": "111" },
                { "Nome do Cliente": "Bob", "Telefone do Cliente": "999" }
            ],
            "message": "Oi {nome}",
            "campaignName": "Teste"
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["results"], json!({ "total": 2, "sent": 1, "failed": 1 }));
    assert_eq!(body["outcomes"][1]["error"], "HTTP 503");
    let campaign_id = body["campaign"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/api/campaigns/{}", campaign_id))
        .insert_header(bearer("tok-user"))
        .to_request();
    let details: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(details["campaign"]["status"], "completed");
    assert_eq!(details["campaign"]["campaign_name"], "Teste");
    assert_eq!(details["logs"].as_array().unwrap().len(), 2);

    // Otro usuario no la ve
    let req = test::TestRequest::get()
        .uri(&format!("/api/campaigns/{}", campaign_id))
        .insert_header(bearer("tok-other"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 404);

    let req = test::TestRequest::get()
        .uri("/api/campaigns")
        .insert_header(bearer("tok-user"))
        .to_request();
    let list: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri("/api/campaigns/risk?contacts=40")
        .insert_header(bearer("tok-user"))
        .to_request();
    let risk: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(risk["already_sent_today"], 1);
    assert_eq!(risk["will_send"], 40);
    assert_eq!(risk["level"], "medium");
}

#[actix_rt::test]
async fn test_async_send_returns_immediately() {
    let db = test_db().await;
    seed_instance(&db.pool, "user-1", InstanceStatus::Connected).await;
    let app = test::init_service(App::new().configure(app_state(db.pool.clone()))).await;

    let req = test::TestRequest::post()
        .uri("/api/campaigns/send")
        .insert_header(bearer("tok-user"))
        .set_json(json!({
            "recipients": [{ "name": "Ana", "phone": "111" }],
            "message": "Oi",
            "async_send": true
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["total"], 1);
    assert_eq!(body["message"], "Campaign queued for async processing");
    assert!(body["campaign"].is_string());
}

#[actix_rt::test]
async fn test_instance_lifecycle_endpoints() {
    let db = test_db().await;
    let app = test::init_service(App::new().configure(app_state(db.pool.clone()))).await;

    let req = test::TestRequest::get()
        .uri("/api/instances")
        .insert_header(bearer("tok-user"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status().as_u16(), 404);

    let create = || {
        test::TestRequest::post()
            .uri("/api/instances")
            .insert_header(bearer("tok-user"))
            .set_json(json!({ "instanceName": "loja" }))
            .to_request()
    };
    assert_eq!(test::call_service(&app, create()).await.status().as_u16(), 201);
    assert_eq!(test::call_service(&app, create()).await.status().as_u16(), 409);

    let req = test::TestRequest::patch()
        .uri("/api/instances/status")
        .insert_header(bearer("tok-user"))
        .set_json(json!({ "status": "connected" }))
        .to_request();
    let instance: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(instance["status"], "connected");
    assert_eq!(instance["instance_name"], "loja");

    let req = test::TestRequest::delete()
        .uri("/api/instances")
        .insert_header(bearer("tok-user"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);

    let req = test::TestRequest::delete()
        .uri("/api/instances")
        .insert_header(bearer("tok-user"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status().as_u16(), 404);
}

#[actix_rt::test]
async fn test_admin_endpoints_are_audited() {
    let db = test_db().await;
    grant_role(&db.pool, "admin-1", "admin").await;
    let chats = SupportChatService::new(
        db.pool.clone(),
        AiGatewayService::new(String::new(), None, "m".to_string()),
    );
    chats.save_message("user-1", "user", "Ajuda").await.unwrap();
    let app = test::init_service(App::new().configure(app_state(db.pool.clone()))).await;

    let req = test::TestRequest::get()
        .uri("/api/admin/audit-log")
        .insert_header(bearer("tok-user"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status().as_u16(), 403);

    let req = test::TestRequest::get()
        .uri("/api/admin/support-chats/user-1")
        .insert_header(bearer("tok-admin"))
        .to_request();
    let messages: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(messages[0]["content"], "Ajuda");

    let req = test::TestRequest::get()
        .uri("/api/admin/audit-log?action_type=view_support_chat")
        .insert_header(bearer("tok-admin"))
        .to_request();
    let entries: Value = test::call_and_read_body_json(&app, req).await;
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["admin_user_id"], "admin-1");
    assert_eq!(entries[0]["target_user_id"], "user-1");

    let req = test::TestRequest::get()
        .uri("/api/admin/audit-log?action_type=all")
        .insert_header(bearer("tok-admin"))
        .to_request();
    let entries: Value = test::call_and_read_body_json(&app, req).await;
    // support chat + los dos accesos al log
    assert_eq!(entries.as_array().unwrap().len(), 3);

    let req = test::TestRequest::get()
        .uri("/api/admin/audit-log?action_type=bogus")
        .insert_header(bearer("tok-admin"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status().as_u16(), 400);
}

#[actix_rt::test]
async fn test_variations_reject_empty_message() {
    let db = test_db().await;
    let app = test::init_service(App::new().configure(app_state(db.pool.clone()))).await;

    let req = test::TestRequest::post()
        .uri("/api/variations")
        .insert_header(bearer("tok-user"))
        .set_json(json!({ "originalMessage": "  ", "count": 3 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Original message is required");

    let req = test::TestRequest::post()
        .uri("/api/variations")
        .insert_header(bearer("tok-user"))
        .set_json(json!({ "originalMessage": "Oi", "count": u64::MAX }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 400);
}
