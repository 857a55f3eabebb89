use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    ViewSupportChat,
    ManageRole,
    ViewAuditLog,
    ExportData,
    SystemConfig,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::ViewSupportChat => "view_support_chat",
            ActionType::ManageRole => "manage_role",
            ActionType::ViewAuditLog => "view_audit_log",
            ActionType::ExportData => "export_data",
            ActionType::SystemConfig => "system_config",
        }
    }
}

impl FromStr for ActionType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view_support_chat" => Ok(ActionType::ViewSupportChat),
            "manage_role" => Ok(ActionType::ManageRole),
            "view_audit_log" => Ok(ActionType::ViewAuditLog),
            "export_data" => Ok(ActionType::ExportData),
            "system_config" => Ok(ActionType::SystemConfig),
            other => Err(anyhow::anyhow!("Tipo de acción desconocido: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminActionLog {
    pub id: String,
    pub admin_user_id: String,
    /// Se guarda como texto para no perder tipos que no conocemos
    pub action_type: String,
    pub target_user_id: Option<String>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileSummary {
    pub email: String,
    pub full_name: Option<String>,
}

/// Registro de auditoría con los perfiles del admin y del usuario afectado
#[derive(Debug, Clone, Serialize)]
pub struct AuditLogEntry {
    #[serde(flatten)]
    pub log: AdminActionLog,
    pub admin_profile: Option<ProfileSummary>,
    pub target_profile: Option<ProfileSummary>,
}

/// GET /api/admin/audit-log?action_type=...
#[derive(Debug, Clone, Deserialize)]
pub struct AuditLogQuery {
    /// "all" o ausente: sin filtro
    pub action_type: Option<String>,
}
