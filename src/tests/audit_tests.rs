//! tests/audit_tests.rs
use serde_json::json;

use super::support::{grant_role, seed_profile, test_db};
use crate::errors::AppError;
use crate::models::audit_model::ActionType;
use crate::services::audit_service::AuditService;

#[tokio::test]
async fn test_require_admin() {
    let db = test_db().await;
    grant_role(&db.pool, "admin-1", "admin").await;
    grant_role(&db.pool, "user-1", "user").await;
    let service = AuditService::new(db.pool.clone(), 500);

    assert!(service.require_admin("admin-1").await.is_ok());
    let err = service.require_admin("user-1").await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert_eq!(err.status_code().as_u16(), 403);
    assert!(!service.is_admin("ghost").await.unwrap());
}

#[tokio::test]
async fn test_list_recent_enriches_and_filters() {
    let db = test_db().await;
    seed_profile(&db.pool, "admin-1", "admin@example.com", Some("Admin")).await;
    seed_profile(&db.pool, "user-1", "user@example.com", None).await;
    let service = AuditService::new(db.pool.clone(), 500);

    service
        .record_action("admin-1", ActionType::ViewAuditLog, None, json!({}))
        .await
        .unwrap();
    service
        .record_action(
            "admin-1",
            ActionType::ViewSupportChat,
            Some("user-1"),
            json!({ "reason": "ticket" }),
        )
        .await
        .unwrap();
    service
        .record_action("admin-2", ActionType::ManageRole, Some("ghost"), json!({}))
        .await
        .unwrap();

    let all = service.list_recent(None).await.unwrap();
    assert_eq!(all.len(), 3);
    // Más recientes primero
    assert_eq!(all[0].log.action_type, "manage_role");
    assert!(all[0].admin_profile.is_none());
    assert!(all[0].target_profile.is_none());

    let chats = service
        .list_recent(Some(ActionType::ViewSupportChat))
        .await
        .unwrap();
    assert_eq!(chats.len(), 1);
    let entry = &chats[0];
    assert_eq!(entry.log.target_user_id.as_deref(), Some("user-1"));
    assert_eq!(entry.log.details, Some(json!({ "reason": "ticket" })));
    assert_eq!(
        entry.admin_profile.as_ref().unwrap().full_name.as_deref(),
        Some("Admin")
    );
    assert_eq!(entry.target_profile.as_ref().unwrap().email, "user@example.com");

    // Serializado plano, con los perfiles al lado
    let value = serde_json::to_value(entry).unwrap();
    assert_eq!(value["action_type"], "view_support_chat");
    assert_eq!(value["admin_profile"]["email"], "admin@example.com");
}

#[tokio::test]
async fn test_list_limit() {
    let db = test_db().await;
    let service = AuditService::new(db.pool.clone(), 2);
    for _ in 0..3 {
        service
            .record_action("admin-1", ActionType::ExportData, None, json!({}))
            .await
            .unwrap();
    }
    assert_eq!(service.list_recent(None).await.unwrap().len(), 2);
}
