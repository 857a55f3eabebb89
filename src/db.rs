//! db.rs
//! Conexión a SQLite, migraciones y helpers de timestamps.

use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

/// Abre (o crea) la base SQLite indicada en `database_url`.
pub async fn setup_database(database_url: &str) -> Result<Pool<Sqlite>> {
    // Crear la carpeta del archivo si hace falta
    if let Some(path) = database_url
        .strip_prefix("sqlite:")
        .map(|p| p.trim_start_matches("//"))
        .filter(|p| !p.starts_with(':'))
    {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("No se pudo crear directorio {:?}", parent))?;
            }
        }
    }

    log::info!("Conectando a SQLite en {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("DATABASE_URL inválida: {}", database_url))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await
        .context("No se pudo conectar a la base de datos SQLite")?;

    Ok(db_pool)
}

/// Corre migraciones con sqlx
pub async fn run_migrations(db_pool: &Pool<Sqlite>) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(db_pool)
        .await
        .context("Fallo en migraciones")?;
    Ok(())
}

/// Timestamp RFC 3339 en UTC con microsegundos (ordenable como texto)
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Timestamp inválido: {}", raw))?
        .with_timezone(&Utc))
}

pub fn parse_optional_timestamp(raw: Option<String>) -> Result<Option<DateTime<Utc>>> {
    raw.as_deref().map(parse_timestamp).transpose()
}
