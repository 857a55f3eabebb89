//! services/auth_service.rs
//! Proveedor de identidad (REST estilo GoTrue) y resolución del llamador.

use actix_web::{http::header, HttpRequest};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;

use crate::errors::AppError;
use crate::models::auth_model::{AuthSession, AuthUser, SignOutScope};

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AppError>;

    /// Resuelve el usuario dueño del token; `Unauthenticated` si no es válido.
    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AppError>;

    async fn sign_out(&self, access_token: &str, scope: SignOutScope) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct HttpIdentityProvider {
    http_client: Client,
    auth_url: String,
    api_key: String,
}

impl HttpIdentityProvider {
    pub fn new(auth_url: String, api_key: String) -> Self {
        HttpIdentityProvider {
            http_client: Client::new(),
            auth_url: auth_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn endpoint(&self, path: &str) -> Result<String, AppError> {
        if self.auth_url.is_empty() {
            return Err(AppError::Config("AUTH_URL is not configured".to_string()));
        }
        Ok(format!("{}{}", self.auth_url, path))
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let resp = self
            .http_client
            .post(self.endpoint("/token?grant_type=password")?)
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Proveedor de identidad inaccesible: {}", e))?;

        match resp.status() {
            s if s.is_success() => Ok(resp
                .json::<AuthSession>()
                .await
                .map_err(|e| anyhow::anyhow!("Sesión inválida: {}", e))?),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => Err(AppError::Unauthenticated),
            other => Err(anyhow::anyhow!("sign_in respondió {}", other).into()),
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AppError> {
        let resp = self
            .http_client
            .get(self.endpoint("/user")?)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Proveedor de identidad inaccesible: {}", e))?;

        match resp.status() {
            s if s.is_success() => Ok(resp
                .json::<AuthUser>()
                .await
                .map_err(|e| anyhow::anyhow!("Usuario inválido: {}", e))?),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                Err(AppError::Unauthenticated)
            }
            other => Err(anyhow::anyhow!("get_user respondió {}", other).into()),
        }
    }

    async fn sign_out(&self, access_token: &str, scope: SignOutScope) -> Result<(), AppError> {
        let resp = self
            .http_client
            .post(self.endpoint(&format!("/logout?scope={}", scope.as_str()))?)
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("Proveedor de identidad inaccesible: {}", e))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(anyhow::anyhow!("sign_out({}) respondió {}", scope.as_str(), resp.status()).into())
        }
    }
}

/// Token del header `Authorization: Bearer <token>`
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resuelve el usuario que hace la petición.
pub async fn resolve_caller(
    req: &HttpRequest,
    identity: &dyn IdentityProvider,
) -> Result<AuthUser, AppError> {
    let token = bearer_token(req).ok_or(AppError::Unauthenticated)?;
    identity.get_user(token).await
}
