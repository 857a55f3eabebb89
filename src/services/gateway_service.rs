//! services/gateway_service.rs
//! Envío de un mensaje individual a través del webhook externo.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

/// Cuerpo que recibe el webhook por cada destinatario
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub instance_name: String,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub rendered_message: String,
}

/// Fallo de envío de un destinatario; se registra, no aborta la campaña
#[derive(Debug, Error)]
pub enum SendError {
    #[error("Send webhook is not configured")]
    NotConfigured,

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),

    /// No se pudo crear el log, así que no se envía
    #[error("Message log could not be recorded: {0}")]
    NotRecorded(String),
}

#[async_trait]
pub trait MessageGateway: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), SendError>;
}

/// POST JSON al webhook; éxito = HTTP 2xx.
/// Cada llamada tiene su propio timeout para que ninguna rama quede colgada.
#[derive(Clone)]
pub struct WebhookGateway {
    http_client: Client,
    webhook_url: String,
    timeout: Duration,
}

impl WebhookGateway {
    pub fn new(webhook_url: String, timeout: Duration) -> Self {
        WebhookGateway {
            http_client: Client::new(),
            webhook_url,
            timeout,
        }
    }
}

#[async_trait]
impl MessageGateway for WebhookGateway {
    async fn send(&self, message: &OutboundMessage) -> Result<(), SendError> {
        if self.webhook_url.is_empty() {
            return Err(SendError::NotConfigured);
        }

        let resp = self
            .http_client
            .post(&self.webhook_url)
            .timeout(self.timeout)
            .json(message)
            .send()
            .await?;

        log::debug!(
            "(WebhookGateway::send) -> '{}': status={}",
            message.recipient_phone,
            resp.status()
        );

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(SendError::Status(resp.status().as_u16()))
        }
    }
}
