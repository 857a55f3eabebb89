use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    Disconnected,
    Connecting,
    Connected,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Disconnected => "disconnected",
            InstanceStatus::Connecting => "connecting",
            InstanceStatus::Connected => "connected",
        }
    }
}

impl FromStr for InstanceStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disconnected" => Ok(InstanceStatus::Disconnected),
            "connecting" => Ok(InstanceStatus::Connecting),
            "connected" => Ok(InstanceStatus::Connected),
            other => Err(anyhow::anyhow!("Estado de instancia desconocido: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Instance {
    pub id: String,
    pub user_id: String,
    pub instance_name: String,
    pub status: InstanceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// POST /api/instances
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInstanceRequest {
    #[serde(alias = "instanceName")]
    pub instance_name: String,
}

/// PATCH /api/instances/status
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateInstanceStatusRequest {
    pub status: InstanceStatus,
}
