//! tests/session_tests.rs
//! Login/logout del cliente y proveedor de identidad HTTP.

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::support::StaticIdentity;
use crate::errors::AppError;
use crate::models::auth_model::{SessionContext, SignOutScope};
use crate::services::auth_service::{HttpIdentityProvider, IdentityProvider};
use crate::services::session_service::{
    AuthSessionManager, FileStorage, MemoryStorage, SessionStorage,
};

fn seed_storage(storage: &dyn SessionStorage) {
    storage.set("sb-abc123-auth-token", "{}").unwrap();
    storage.set("app.Supabase.cache", "x").unwrap();
    storage.set("theme", "dark").unwrap();
}

#[tokio::test]
async fn test_sign_in_persists_session() {
    let identity = Arc::new(StaticIdentity::new().with_user("tok-1", "user-1"));
    let persistent = Arc::new(MemoryStorage::new());
    let manager = AuthSessionManager::new(identity, persistent.clone(), Arc::new(MemoryStorage::new()));

    let mut ctx = SessionContext::default();
    manager
        .sign_in(&mut ctx, "user-1@example.com", "secret")
        .await
        .unwrap();

    assert!(ctx.is_authenticated());
    assert_eq!(ctx.access_token(), Some("tok-1"));
    let stored = persistent.get(&manager.session_key()).unwrap().unwrap();
    assert!(stored.contains("tok-1"));

    let mut other = SessionContext::default();
    let err = manager
        .sign_in(&mut other, "nobody@example.com", "secret")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthenticated));
    assert!(!other.is_authenticated());
}

#[tokio::test]
async fn test_sign_out_resets_even_when_server_fails() {
    let identity = Arc::new(
        StaticIdentity::new()
            .with_user("tok-1", "user-1")
            .failing_sign_out(),
    );
    let persistent = Arc::new(MemoryStorage::new());
    let transient = Arc::new(MemoryStorage::new());
    seed_storage(persistent.as_ref());
    transient.set("draft", "hola").unwrap();

    let manager = AuthSessionManager::new(identity.clone(), persistent.clone(), transient.clone());
    let mut ctx = SessionContext::default();
    manager
        .sign_in(&mut ctx, "user-1@example.com", "secret")
        .await
        .unwrap();

    manager.sign_out(&mut ctx).await;

    assert!(!ctx.is_authenticated());
    assert!(ctx.session.is_none());
    assert_eq!(
        identity.sign_out_scopes(),
        vec![SignOutScope::Global, SignOutScope::Local]
    );
    assert_eq!(persistent.keys().unwrap(), vec!["theme".to_string()]);
    assert!(transient.keys().unwrap().is_empty());
}

#[tokio::test]
async fn test_sign_out_without_session_still_cleans_storage() {
    let identity = Arc::new(StaticIdentity::new());
    let persistent = Arc::new(MemoryStorage::new());
    seed_storage(persistent.as_ref());

    let manager = AuthSessionManager::new(
        identity.clone(),
        persistent.clone(),
        Arc::new(MemoryStorage::new()),
    );
    let mut ctx = SessionContext::default();
    manager.sign_out(&mut ctx).await;

    assert!(identity.sign_out_scopes().is_empty());
    assert_eq!(persistent.keys().unwrap(), vec!["theme".to_string()]);
}

#[tokio::test]
async fn test_custom_namespace_on_file_storage() {
    let dir = TempDir::new().unwrap();
    let persistent = Arc::new(FileStorage::new(dir.path().join("storage.json")));
    persistent.set("myapp-auth-token", "{}").unwrap();
    persistent.set("legacy-IDP-state", "1").unwrap();
    persistent.set("sb-other", "kept").unwrap();

    let manager = AuthSessionManager::new(
        Arc::new(StaticIdentity::new()),
        persistent.clone(),
        Arc::new(MemoryStorage::new()),
    )
    .with_namespace("myapp-", "IDP");
    assert_eq!(manager.session_key(), "myapp-auth-token");

    let mut ctx = SessionContext::default();
    manager.sign_out(&mut ctx).await;

    // Releer del disco con otra instancia
    let reread = FileStorage::new(dir.path().join("storage.json"));
    assert_eq!(reread.keys().unwrap(), vec!["sb-other".to_string()]);
    assert_eq!(reread.get("sb-other").unwrap().as_deref(), Some("kept"));
}

#[tokio::test]
async fn test_http_identity_provider() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", "Bearer good"))
        .and(header("apikey", "anon"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "user-1", "email": "a@b.com", "role": "authenticated" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "good",
            "refresh_token": "r",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": { "id": "user-1", "email": "a@b.com" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/logout"))
        .and(query_param("scope", "global"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/logout"))
        .and(query_param("scope", "local"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let provider = HttpIdentityProvider::new(format!("{}/", server.uri()), "anon".to_string());

    let user = provider.get_user("good").await.unwrap();
    assert_eq!(user.id, "user-1");
    assert_eq!(user.email.as_deref(), Some("a@b.com"));
    assert!(matches!(
        provider.get_user("bad").await,
        Err(AppError::Unauthenticated)
    ));

    let session = provider.sign_in("a@b.com", "pw").await.unwrap();
    assert_eq!(session.access_token, "good");
    assert_eq!(session.user.id, "user-1");

    assert!(provider.sign_out("good", SignOutScope::Global).await.is_ok());
    assert!(provider.sign_out("good", SignOutScope::Local).await.is_err());

    let unconfigured = HttpIdentityProvider::new(String::new(), String::new());
    assert!(matches!(
        unconfigured.get_user("good").await,
        Err(AppError::Config(_))
    ));
}
