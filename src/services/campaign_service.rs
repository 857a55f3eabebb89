//! services/campaign_service.rs
//! Persistencia de campañas: creación, contadores atómicos y cierre.

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};
use uuid::Uuid;

use crate::db::{now_timestamp, parse_optional_timestamp, parse_timestamp};
use crate::models::campaign_model::{Campaign, CampaignStatus};

const CAMPAIGN_COLUMNS: &str = "id, user_id, instance_id, campaign_name, total_contacts, \
     sent_count, failed_count, status, created_at, completed_at";

/// Contador de una campaña que se incrementa en la base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignCounter {
    Sent,
    Failed,
}

impl CampaignCounter {
    fn column(&self) -> &'static str {
        match self {
            CampaignCounter::Sent => "sent_count",
            CampaignCounter::Failed => "failed_count",
        }
    }
}

#[derive(Clone, Debug)]
pub struct CampaignService {
    db_pool: Pool<Sqlite>,
}

impl CampaignService {
    pub fn new(db_pool: Pool<Sqlite>) -> Self {
        CampaignService { db_pool }
    }

    /// Crea la campaña en estado `in_progress` con contadores en 0.
    /// Es una sola escritura: si falla no queda nada.
    pub async fn create_campaign(
        &self,
        user_id: &str,
        instance_id: &str,
        campaign_name: &str,
        total_contacts: usize,
    ) -> Result<Campaign> {
        let id = Uuid::new_v4().to_string();
        let now = now_timestamp();
        let total = i64::try_from(total_contacts).context("Demasiados destinatarios")?;

        sqlx::query(
            r#"
            INSERT INTO message_campaigns (
                id, user_id, instance_id, campaign_name, total_contacts,
                sent_count, failed_count, status, created_at, completed_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, 0, 0, 'in_progress', ?6, NULL)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(instance_id)
        .bind(campaign_name)
        .bind(total)
        .bind(&now)
        .execute(&self.db_pool)
        .await
        .context("Fallo al insertar message_campaign")?;

        Ok(Campaign {
            id,
            user_id: user_id.to_string(),
            instance_id: instance_id.to_string(),
            campaign_name: campaign_name.to_string(),
            total_contacts: total,
            sent_count: 0,
            failed_count: 0,
            status: CampaignStatus::InProgress,
            created_at: parse_timestamp(&now)?,
            completed_at: None,
        })
    }

    /// Incrementa un contador en el servidor (`x = x + 1`), nunca leer-modificar-escribir.
    /// El `WHERE` impide superar `total_contacts`; devuelve si hubo incremento.
    pub async fn increment(&self, campaign_id: &str, counter: CampaignCounter) -> Result<bool> {
        let column = counter.column();
        let sql = format!(
            r#"
            UPDATE message_campaigns
            SET {column} = {column} + 1
            WHERE id = ?1
              AND sent_count + failed_count < total_contacts
            "#
        );

        let result = sqlx::query(&sql)
            .bind(campaign_id)
            .execute(&self.db_pool)
            .await
            .with_context(|| format!("Error incrementando {} de la campaña", column))?;

        if result.rows_affected() == 0 {
            log::warn!(
                "(increment) {} no se incrementó para campaign={} (¿contadores completos?)",
                column,
                campaign_id
            );
            return Ok(false);
        }
        Ok(true)
    }

    /// Cierra la campaña como `completed`, haya o no envíos exitosos.
    pub async fn complete_campaign(&self, campaign_id: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE message_campaigns
            SET status = 'completed', completed_at = ?1
            WHERE id = ?2
            "#,
        )
        .bind(now_timestamp())
        .bind(campaign_id)
        .execute(&self.db_pool)
        .await
        .context("Fallo al completar la campaña")?;
        Ok(())
    }

    pub async fn get_campaign(&self, campaign_id: &str) -> Result<Option<Campaign>> {
        let sql = format!("SELECT {CAMPAIGN_COLUMNS} FROM message_campaigns WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(campaign_id)
            .fetch_optional(&self.db_pool)
            .await
            .context("Error consultando message_campaigns")?;

        row.as_ref().map(campaign_from_row).transpose()
    }

    /// Historial del usuario, las más recientes primero
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Campaign>> {
        let sql = format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM message_campaigns \
             WHERE user_id = ?1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.db_pool)
            .await
            .context("Error listando campañas")?;

        rows.iter().map(campaign_from_row).collect()
    }

    /// Mensajes enviados con éxito por el usuario desde la medianoche UTC
    pub async fn count_sent_today(&self, user_id: &str) -> Result<i64> {
        let midnight = Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .context("Medianoche inválida")?
            .and_utc()
            .to_rfc3339_opts(SecondsFormat::Micros, true);

        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS cnt
            FROM message_logs l
            JOIN message_campaigns c ON c.id = l.campaign_id
            WHERE c.user_id = ?1
              AND l.status = 'sent'
              AND l.sent_at >= ?2
            "#,
        )
        .bind(user_id)
        .bind(midnight)
        .fetch_one(&self.db_pool)
        .await
        .context("Error contando envíos del día")?;

        Ok(row.try_get("cnt")?)
    }
}

fn campaign_from_row(row: &SqliteRow) -> Result<Campaign> {
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(Campaign {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        instance_id: row.try_get("instance_id")?,
        campaign_name: row.try_get("campaign_name")?,
        total_contacts: row.try_get("total_contacts")?,
        sent_count: row.try_get("sent_count")?,
        failed_count: row.try_get("failed_count")?,
        status: status.parse()?,
        created_at: parse_timestamp(&created_at)?,
        completed_at: parse_optional_timestamp(row.try_get("completed_at")?)?,
    })
}
