//! services/audit_service.rs
//! Log de acciones administrativas y control de acceso de admins.

use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use sqlx::{Pool, QueryBuilder, Row, Sqlite};
use uuid::Uuid;

use crate::db::{now_timestamp, parse_timestamp};
use crate::errors::AppError;
use crate::models::audit_model::{ActionType, AdminActionLog, AuditLogEntry, ProfileSummary};

#[derive(Clone, Debug)]
pub struct AuditService {
    db_pool: Pool<Sqlite>,
    list_limit: i64,
}

impl AuditService {
    pub fn new(db_pool: Pool<Sqlite>, list_limit: i64) -> Self {
        AuditService {
            db_pool,
            list_limit,
        }
    }

    pub async fn is_admin(&self, user_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM user_roles WHERE user_id = ?1 AND role = 'admin'")
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await
            .context("Error consultando user_roles")?;
        Ok(row.is_some())
    }

    /// Falla con `Forbidden` si el usuario no es admin.
    pub async fn require_admin(&self, user_id: &str) -> Result<(), AppError> {
        if self.is_admin(user_id).await? {
            Ok(())
        } else {
            log::warn!("(require_admin) user={} intentó una acción de admin", user_id);
            Err(AppError::Forbidden("admin role required".to_string()))
        }
    }

    pub async fn record_action(
        &self,
        admin_user_id: &str,
        action: ActionType,
        target_user_id: Option<&str>,
        details: serde_json::Value,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO admin_action_logs (
                id, admin_user_id, action_type, target_user_id, details, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&id)
        .bind(admin_user_id)
        .bind(action.as_str())
        .bind(target_user_id)
        .bind(details.to_string())
        .bind(now_timestamp())
        .execute(&self.db_pool)
        .await
        .context("Error registrando admin_action_log")?;

        log::info!(
            "(record_action) admin={} action={} target={:?}",
            admin_user_id,
            action.as_str(),
            target_user_id
        );
        Ok(id)
    }

    /// Últimas acciones (más recientes primero) con los perfiles involucrados.
    pub async fn list_recent(&self, filter: Option<ActionType>) -> Result<Vec<AuditLogEntry>> {
        let rows = match filter {
            Some(action) => {
                sqlx::query(
                    r#"
                    SELECT id, admin_user_id, action_type, target_user_id, details, created_at
                    FROM admin_action_logs
                    WHERE action_type = ?1
                    ORDER BY created_at DESC
                    LIMIT ?2
                    "#,
                )
                .bind(action.as_str())
                .bind(self.list_limit)
                .fetch_all(&self.db_pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT id, admin_user_id, action_type, target_user_id, details, created_at
                    FROM admin_action_logs
                    ORDER BY created_at DESC
                    LIMIT ?1
                    "#,
                )
                .bind(self.list_limit)
                .fetch_all(&self.db_pool)
                .await
            }
        }
        .context("Error listando admin_action_logs")?;

        let mut logs = Vec::with_capacity(rows.len());
        for row in &rows {
            let created_at: String = row.try_get("created_at")?;
            let details: Option<String> = row.try_get("details")?;
            logs.push(AdminActionLog {
                id: row.try_get("id")?,
                admin_user_id: row.try_get("admin_user_id")?,
                action_type: row.try_get("action_type")?,
                target_user_id: row.try_get("target_user_id")?,
                details: details.and_then(|d| serde_json::from_str(&d).ok()),
                created_at: parse_timestamp(&created_at)?,
            });
        }

        let ids: HashSet<&str> = logs
            .iter()
            .flat_map(|log| {
                std::iter::once(log.admin_user_id.as_str()).chain(log.target_user_id.as_deref())
            })
            .collect();
        let profiles = self.load_profiles(ids).await?;

        Ok(logs
            .into_iter()
            .map(|log| AuditLogEntry {
                admin_profile: profiles.get(&log.admin_user_id).cloned(),
                target_profile: log
                    .target_user_id
                    .as_ref()
                    .and_then(|id| profiles.get(id))
                    .cloned(),
                log,
            })
            .collect())
    }

    async fn load_profiles(&self, ids: HashSet<&str>) -> Result<HashMap<String, ProfileSummary>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id, email, full_name FROM profiles WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let rows = builder
            .build()
            .fetch_all(&self.db_pool)
            .await
            .context("Error consultando profiles")?;

        let mut profiles = HashMap::with_capacity(rows.len());
        for row in rows {
            profiles.insert(
                row.try_get::<String, _>("id")?,
                ProfileSummary {
                    email: row.try_get("email")?,
                    full_name: row.try_get("full_name")?,
                },
            );
        }
        Ok(profiles)
    }
}
