use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::message_log_model::MessageLog;

/// Marcador que se reemplaza por el nombre del destinatario
pub const NAME_PLACEHOLDER: &str = "{nome}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Pending => "pending",
            CampaignStatus::InProgress => "in_progress",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Failed => "failed",
        }
    }
}

impl FromStr for CampaignStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CampaignStatus::Pending),
            "in_progress" => Ok(CampaignStatus::InProgress),
            "completed" => Ok(CampaignStatus::Completed),
            "failed" => Ok(CampaignStatus::Failed),
            other => Err(anyhow::anyhow!("Estado de campaña desconocido: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Campaign {
    pub id: String,
    pub user_id: String,
    pub instance_id: String,
    pub campaign_name: String,
    pub total_contacts: i64,
    pub sent_count: i64,
    pub failed_count: i64,
    pub status: CampaignStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Destinatario de una campaña.
/// Acepta también las columnas de la planilla importada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    #[serde(alias = "Nome do Cliente")]
    pub name: String,
    #[serde(alias = "Telefone do Cliente")]
    pub phone: String,
}

/// POST /api/campaigns/send
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitCampaignRequest {
    #[serde(alias = "clients")]
    pub recipients: Vec<Recipient>,
    pub message: String,
    #[serde(default, alias = "campaignName")]
    pub campaign_name: Option<String>,
    /// Si viene, el destinatario `i` usa la variación `i % len`
    #[serde(default, alias = "messageVariations")]
    pub message_variations: Option<Vec<String>>,
    #[serde(default)]
    pub async_send: bool,
}

impl SubmitCampaignRequest {
    /// Plantilla que le toca al destinatario en la posición `index`
    pub fn template_for(&self, index: usize) -> &str {
        match &self.message_variations {
            Some(variations) if !variations.is_empty() => &variations[index % variations.len()],
            _ => &self.message,
        }
    }
}

/// Sustituye el marcador de nombre en todas sus apariciones
pub fn render_message(template: &str, recipient_name: &str) -> String {
    template.replace(NAME_PLACEHOLDER, recipient_name)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipientOutcome {
    pub name: String,
    pub phone: String,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignResult {
    pub campaign_id: String,
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    /// En el orden de entrada de los destinatarios
    pub outcomes: Vec<RecipientOutcome>,
}

impl CampaignResult {
    pub fn from_outcomes(campaign_id: String, outcomes: Vec<RecipientOutcome>) -> Self {
        let sent = outcomes.iter().filter(|o| o.success).count();
        CampaignResult {
            campaign_id,
            total: outcomes.len(),
            sent,
            failed: outcomes.len() - sent,
            outcomes,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CampaignDetails {
    pub campaign: Campaign,
    pub logs: Vec<MessageLog>,
}
