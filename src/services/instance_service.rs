//! services/instance_service.rs
//! Instancias de WhatsApp: una por usuario.

use anyhow::{Context, Result};
use reqwest::Client;
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};
use uuid::Uuid;

use crate::db::{now_timestamp, parse_timestamp};
use crate::errors::AppError;
use crate::models::instance_model::{Instance, InstanceStatus};

#[derive(Clone)]
pub struct InstanceService {
    db_pool: Pool<Sqlite>,
    http_client: Client,
    evolution_api_url: String,
    evolution_api_key: String,
}

impl InstanceService {
    pub fn new(db_pool: Pool<Sqlite>, evolution_api_url: String, evolution_api_key: String) -> Self {
        InstanceService {
            db_pool,
            http_client: Client::new(),
            evolution_api_url,
            evolution_api_key,
        }
    }

    /// Registra la instancia del usuario en estado `disconnected`.
    pub async fn create_instance(&self, user_id: &str, instance_name: &str) -> Result<Instance> {
        let id = Uuid::new_v4().to_string();
        let now = now_timestamp();

        sqlx::query(
            r#"
            INSERT INTO whatsapp_instances (id, user_id, instance_name, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, 'disconnected', ?4, ?4)
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(instance_name)
        .bind(&now)
        .execute(&self.db_pool)
        .await
        .context("Error creando whatsapp_instance")?;

        log::info!(
            "(create_instance) Instancia '{}' creada para user={} (ID={})",
            instance_name,
            user_id,
            id
        );

        self.find_for_user(user_id)
            .await?
            .context("La instancia recién creada no se encontró")
    }

    /// Busca la instancia del usuario (se espera a lo sumo una).
    pub async fn find_for_user(&self, user_id: &str) -> Result<Option<Instance>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, instance_name, status, created_at, updated_at
            FROM whatsapp_instances
            WHERE user_id = ?1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await
        .context("Error consultando whatsapp_instances")?;

        row.as_ref().map(instance_from_row).transpose()
    }

    /// Cambia el estado de conexión (callbacks del gateway de WhatsApp).
    pub async fn update_status(
        &self,
        user_id: &str,
        status: InstanceStatus,
    ) -> Result<Instance, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE whatsapp_instances
            SET status = ?1, updated_at = ?2
            WHERE user_id = ?3
            "#,
        )
        .bind(status.as_str())
        .bind(now_timestamp())
        .bind(user_id)
        .execute(&self.db_pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::InstanceNotFound);
        }

        log::info!(
            "(update_status) Instancia de user={} ahora '{}'",
            user_id,
            status.as_str()
        );

        self.find_for_user(user_id)
            .await?
            .ok_or(AppError::InstanceNotFound)
    }

    /// Desconecta: intenta borrar en la API de WhatsApp y luego borra la fila.
    /// Un fallo de la API externa no impide la limpieza local.
    pub async fn delete_instance(&self, user_id: &str) -> Result<(), AppError> {
        log::info!("(delete_instance) Borrando instancia de user={}", user_id);

        let instance = self
            .find_for_user(user_id)
            .await?
            .ok_or(AppError::InstanceNotFound)?;

        self.delete_remote(&instance.instance_name).await;

        sqlx::query("DELETE FROM whatsapp_instances WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.db_pool)
            .await
            .context("Error borrando whatsapp_instance")?;

        log::info!(
            "(delete_instance) Instancia '{}' borrada correctamente",
            instance.instance_name
        );
        Ok(())
    }

    async fn delete_remote(&self, instance_name: &str) {
        if self.evolution_api_url.is_empty() {
            log::warn!("(delete_remote) EVOLUTION_API_URL no definida, solo limpieza local");
            return;
        }

        let url = format!(
            "{}/instance/delete/{}",
            self.evolution_api_url.trim_end_matches('/'),
            instance_name
        );

        match self
            .http_client
            .delete(&url)
            .header("apikey", &self.evolution_api_key)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                log::info!("(delete_remote) Instancia borrada en la API de WhatsApp");
            }
            Ok(resp) => {
                log::warn!(
                    "(delete_remote) La API respondió {}, se continúa con la limpieza local",
                    resp.status()
                );
            }
            Err(e) => {
                log::error!("(delete_remote) Error llamando a la API de WhatsApp: {:?}", e);
            }
        }
    }
}

fn instance_from_row(row: &SqliteRow) -> Result<Instance> {
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Instance {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        instance_name: row.try_get("instance_name")?,
        status: status.parse()?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}
