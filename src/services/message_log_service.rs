//! services/message_log_service.rs
//! Un log por destinatario: se crea `pending` y termina `sent` o `failed`.

use anyhow::{Context, Result};
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};
use uuid::Uuid;

use crate::db::{now_timestamp, parse_optional_timestamp, parse_timestamp};
use crate::models::campaign_model::Recipient;
use crate::models::message_log_model::MessageLog;

#[derive(Clone, Debug)]
pub struct MessageLogService {
    db_pool: Pool<Sqlite>,
}

impl MessageLogService {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        MessageLogService { db_pool }
    }

    pub async fn insert_pending(
        &self,
        campaign_id: &str,
        recipient: &Recipient,
        message: &str,
    ) -> Result<String> {
        let log_id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO message_logs (
                id, campaign_id, client_name, client_phone, message,
                status, sent_at, error_message, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, 'pending', NULL, NULL, ?6)
            "#,
        )
        .bind(&log_id)
        .bind(campaign_id)
        .bind(&recipient.name)
        .bind(&recipient.phone)
        .bind(message)
        .bind(now_timestamp())
        .execute(&self.db_pool)
        .await
        .context("Error creando message_log")?;

        Ok(log_id)
    }

    pub async fn mark_sent(&self, log_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE message_logs
            SET status = 'sent', sent_at = ?1
            WHERE id = ?2
            "#,
        )
        .bind(now_timestamp())
        .bind(log_id)
        .execute(&self.db_pool)
        .await
        .context("Error marcando message_log como sent")?;
        Ok(())
    }

    /// Marca el fallo por id si lo tenemos; si no, por (campaña, teléfono).
    pub async fn mark_failed(
        &self,
        campaign_id: &str,
        log_id: Option<&str>,
        client_phone: &str,
        error_message: &str,
    ) -> Result<()> {
        let query = match log_id {
            Some(id) => sqlx::query(
                r#"
                UPDATE message_logs
                SET status = 'failed', error_message = ?1
                WHERE id = ?2
                "#,
            )
            .bind(error_message)
            .bind(id),
            None => sqlx::query(
                r#"
                UPDATE message_logs
                SET status = 'failed', error_message = ?1
                WHERE campaign_id = ?2 AND client_phone = ?3
                "#,
            )
            .bind(error_message)
            .bind(campaign_id)
            .bind(client_phone),
        };

        query
            .execute(&self.db_pool)
            .await
            .context("Error marcando message_log como failed")?;
        Ok(())
    }

    /// Logs de la campaña, los más recientes primero
    pub async fn list_for_campaign(&self, campaign_id: &str) -> Result<Vec<MessageLog>> {
        let rows = sqlx::query(
            r#"
            SELECT id, campaign_id, client_name, client_phone, message,
                   status, sent_at, error_message, created_at
            FROM message_logs
            WHERE campaign_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(campaign_id)
        .fetch_all(&self.db_pool)
        .await
        .context("Error listando message_logs")?;

        rows.iter().map(log_from_row).collect()
    }
}

fn log_from_row(row: &SqliteRow) -> Result<MessageLog> {
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(MessageLog {
        id: row.try_get("id")?,
        campaign_id: row.try_get("campaign_id")?,
        client_name: row.try_get("client_name")?,
        client_phone: row.try_get("client_phone")?,
        message: row.try_get("message")?,
        status: status.parse()?,
        sent_at: parse_optional_timestamp(row.try_get("sent_at")?)?,
        error_message: row.try_get("error_message")?,
        created_at: parse_timestamp(&created_at)?,
    })
}
