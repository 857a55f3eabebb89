//! tests/support.rs
//! Helpers compartidos: base temporal, proveedor de identidad y gateway falsos.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::{Pool, Sqlite};
use tempfile::TempDir;
use tokio::time::Instant;

use crate::db::{now_timestamp, run_migrations, setup_database};
use crate::errors::AppError;
use crate::models::auth_model::{AuthSession, AuthUser, SignOutScope};
use crate::models::instance_model::{Instance, InstanceStatus};
use crate::services::auth_service::IdentityProvider;
use crate::services::gateway_service::{MessageGateway, OutboundMessage, SendError};
use crate::services::instance_service::InstanceService;

/// Base SQLite migrada en un directorio temporal; se borra al soltarla.
pub struct TestDb {
    pub pool: Pool<Sqlite>,
    _dir: TempDir,
}

pub async fn test_db() -> TestDb {
    let dir = TempDir::new().expect("tempdir");
    let url = format!("sqlite:{}", dir.path().join("test.db").display());
    let pool = setup_database(&url).await.expect("setup_database");
    run_migrations(&pool).await.expect("migrations");
    TestDb { pool, _dir: dir }
}

pub async fn seed_instance(pool: &Pool<Sqlite>, user_id: &str, status: InstanceStatus) -> Instance {
    let service = InstanceService::new(pool.clone(), String::new(), String::new());
    service
        .create_instance(user_id, &format!("inst-{}", user_id))
        .await
        .expect("create_instance");
    service
        .update_status(user_id, status)
        .await
        .expect("update_status")
}

pub async fn seed_profile(pool: &Pool<Sqlite>, id: &str, email: &str, full_name: Option<&str>) {
    sqlx::query("INSERT INTO profiles (id, email, full_name, created_at) VALUES (?1, ?2, ?3, ?4)")
        .bind(id)
        .bind(email)
        .bind(full_name)
        .bind(now_timestamp())
        .execute(pool)
        .await
        .expect("insert profile");
}

pub async fn grant_role(pool: &Pool<Sqlite>, user_id: &str, role: &str) {
    sqlx::query("INSERT INTO user_roles (id, user_id, role, created_at) VALUES (?1, ?2, ?3, ?4)")
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(role)
        .bind(now_timestamp())
        .execute(pool)
        .await
        .expect("insert role");
}

pub async fn count_rows(pool: &Pool<Sqlite>, table: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .expect("count rows")
}

pub fn user(id: &str) -> AuthUser {
    AuthUser {
        id: id.to_string(),
        email: Some(format!("{}@example.com", id)),
    }
}

/// Proveedor de identidad en memoria: token -> usuario.
#[derive(Default)]
pub struct StaticIdentity {
    users: HashMap<String, AuthUser>,
    fail_sign_out: bool,
    pub sign_out_calls: Mutex<Vec<SignOutScope>>,
}

impl StaticIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, token: &str, user_id: &str) -> Self {
        self.users.insert(token.to_string(), user(user_id));
        self
    }

    pub fn failing_sign_out(mut self) -> Self {
        self.fail_sign_out = true;
        self
    }

    pub fn sign_out_scopes(&self) -> Vec<SignOutScope> {
        self.sign_out_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let (token, user) = self
            .users
            .iter()
            .find(|(_, u)| u.email.as_deref() == Some(email))
            .ok_or(AppError::Unauthenticated)?;
        if password.is_empty() {
            return Err(AppError::Unauthenticated);
        }
        Ok(AuthSession {
            access_token: token.clone(),
            refresh_token: Some(format!("refresh-{}", token)),
            expires_in: Some(3600),
            user: user.clone(),
        })
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser, AppError> {
        self.users
            .get(access_token)
            .cloned()
            .ok_or(AppError::Unauthenticated)
    }

    async fn sign_out(&self, _access_token: &str, scope: SignOutScope) -> Result<(), AppError> {
        self.sign_out_calls.lock().unwrap().push(scope);
        if self.fail_sign_out {
            return Err(AppError::Internal(anyhow::anyhow!("network down")));
        }
        Ok(())
    }
}

/// Gateway que guarda cada envío con su instante; falla para los teléfonos indicados.
#[derive(Default)]
pub struct RecordingGateway {
    pub calls: Mutex<Vec<(OutboundMessage, Instant)>>,
    failing_phones: HashSet<String>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(phones: &[&str]) -> Self {
        RecordingGateway {
            calls: Mutex::new(Vec::new()),
            failing_phones: phones.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn sent(&self) -> Vec<(OutboundMessage, Instant)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageGateway for RecordingGateway {
    async fn send(&self, message: &OutboundMessage) -> Result<(), SendError> {
        self.calls
            .lock()
            .unwrap()
            .push((message.clone(), Instant::now()));
        if self.failing_phones.contains(&message.recipient_phone) {
            return Err(SendError::Status(503));
        }
        Ok(())
    }
}
