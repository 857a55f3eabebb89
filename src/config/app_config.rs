//! config/app_config.rs
//! Configuración leída del entorno (.env incluido), con valores por defecto.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Intervalo entre envíos consecutivos de una campaña (anti-bloqueo)
pub const DEFAULT_STAGGER_MS: u64 = 3000;
/// Envíos salientes simultáneos como máximo
pub const DEFAULT_MAX_CONCURRENCY: usize = 16;
/// La IA genera bien hasta 10 variaciones por llamada
pub const DEFAULT_VARIATION_BATCH_SIZE: usize = 10;
/// Tope de variaciones por pedido
pub const DEFAULT_MAX_VARIATIONS: usize = 100;
/// Tiempo máximo de cada llamada al webhook de envío
pub const DEFAULT_SEND_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_AI_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";
pub const DEFAULT_AI_MODEL: &str = "google/gemini-2.5-flash";

/// Política de envío de una campaña
#[derive(Debug, Clone, Copy)]
pub struct SendPolicy {
    /// El destinatario `i` se envía no antes de `i * stagger`
    pub stagger: Duration,
    pub max_concurrency: usize,
}

impl Default for SendPolicy {
    fn default() -> Self {
        SendPolicy {
            stagger: Duration::from_millis(DEFAULT_STAGGER_MS),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub port: u16,
    pub http_workers: usize,

    // Webhook externo que entrega los mensajes
    pub send_webhook_url: String,
    pub send_policy: SendPolicy,
    pub send_timeout: Duration,

    // Gateway de IA
    pub ai_gateway_url: String,
    pub ai_gateway_api_key: Option<String>,
    pub ai_model: String,
    pub variation_batch_size: usize,
    pub max_variations: usize,

    // Proveedor de identidad
    pub auth_url: String,
    pub auth_api_key: String,

    // API de instancias de WhatsApp
    pub evolution_api_url: String,
    pub evolution_api_key: String,

    pub daily_send_limit: i64,
    pub audit_log_limit: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_url: "sqlite:data/comunicazap.db".to_string(),
            bind_addr: "0.0.0.0".to_string(),
            port: 5022,
            http_workers: 1,
            send_webhook_url: String::new(),
            send_policy: SendPolicy::default(),
            send_timeout: Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS),
            ai_gateway_url: DEFAULT_AI_GATEWAY_URL.to_string(),
            ai_gateway_api_key: None,
            ai_model: DEFAULT_AI_MODEL.to_string(),
            variation_batch_size: DEFAULT_VARIATION_BATCH_SIZE,
            max_variations: DEFAULT_MAX_VARIATIONS,
            auth_url: String::new(),
            auth_api_key: String::new(),
            evolution_api_url: String::new(),
            evolution_api_key: String::new(),
            daily_send_limit: 200,
            audit_log_limit: 500,
        }
    }
}

impl AppConfig {
    /// Lee la configuración de variables de entorno.
    /// Se espera que `dotenv()` ya se haya ejecutado.
    pub fn from_env() -> Self {
        let defaults = AppConfig::default();

        AppConfig {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: parse_var("PORT", defaults.port),
            http_workers: parse_var("HTTP_WORKERS", defaults.http_workers).max(1),
            send_webhook_url: first_var(&["SEND_WEBHOOK_URL", "N8N_WEBHOOK_URL"])
                .unwrap_or_default(),
            send_policy: SendPolicy {
                stagger: Duration::from_millis(parse_var("SEND_STAGGER_MS", DEFAULT_STAGGER_MS)),
                max_concurrency: parse_var("SEND_MAX_CONCURRENCY", DEFAULT_MAX_CONCURRENCY)
                    .max(1),
            },
            send_timeout: Duration::from_secs(
                parse_var("SEND_TIMEOUT_SECS", DEFAULT_SEND_TIMEOUT_SECS).max(1),
            ),
            ai_gateway_url: env::var("AI_GATEWAY_URL").unwrap_or(defaults.ai_gateway_url),
            ai_gateway_api_key: first_var(&["AI_GATEWAY_API_KEY", "LOVABLE_API_KEY"]),
            ai_model: env::var("AI_MODEL").unwrap_or(defaults.ai_model),
            variation_batch_size: parse_var("VARIATION_BATCH_SIZE", DEFAULT_VARIATION_BATCH_SIZE)
                .max(1),
            max_variations: parse_var("MAX_VARIATIONS", DEFAULT_MAX_VARIATIONS).max(1),
            auth_url: env::var("AUTH_URL").unwrap_or_default(),
            auth_api_key: env::var("AUTH_API_KEY").unwrap_or_default(),
            evolution_api_url: env::var("EVOLUTION_API_URL").unwrap_or_default(),
            evolution_api_key: env::var("EVOLUTION_API_KEY").unwrap_or_default(),
            daily_send_limit: parse_var("DAILY_SEND_LIMIT", defaults.daily_send_limit),
            audit_log_limit: parse_var("AUDIT_LOG_LIMIT", defaults.audit_log_limit),
        }
    }
}

/// Primera variable definida y no vacía de la lista
fn first_var(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

fn parse_var<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                log::warn!(
                    "(AppConfig) Valor inválido para {}='{}', usando {}",
                    name,
                    raw,
                    default
                );
                default
            }
        },
        Err(_) => default,
    }
}
