use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLogStatus {
    Pending,
    Sent,
    Failed,
}

impl MessageLogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageLogStatus::Pending => "pending",
            MessageLogStatus::Sent => "sent",
            MessageLogStatus::Failed => "failed",
        }
    }
}

impl FromStr for MessageLogStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MessageLogStatus::Pending),
            "sent" => Ok(MessageLogStatus::Sent),
            "failed" => Ok(MessageLogStatus::Failed),
            other => Err(anyhow::anyhow!("Estado de log desconocido: {}", other)),
        }
    }
}

/// Un registro por (campaña, destinatario)
#[derive(Debug, Clone, Serialize)]
pub struct MessageLog {
    pub id: String,
    pub campaign_id: String,
    pub client_name: String,
    pub client_phone: String,
    pub message: String,
    pub status: MessageLogStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}
