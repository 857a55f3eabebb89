use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// GET /api/campaigns/risk?contacts=N
#[derive(Debug, Clone, Deserialize)]
pub struct RiskQuery {
    pub contacts: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    pub contact_count: i64,
    pub daily_limit: i64,
    pub already_sent_today: i64,
    pub remaining_today: i64,
    pub will_send: i64,
    pub level: RiskLevel,
}

impl RiskAssessment {
    /// Hasta 30 envíos es bajo, hasta 50 medio, más es alto.
    pub fn assess(contact_count: i64, daily_limit: i64, already_sent_today: i64) -> Self {
        let remaining_today = (daily_limit - already_sent_today).max(0);
        let will_send = contact_count.max(0).min(remaining_today);
        let level = if will_send <= 30 {
            RiskLevel::Low
        } else if will_send <= 50 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        };

        RiskAssessment {
            contact_count,
            daily_limit,
            already_sent_today,
            remaining_today,
            will_send,
            level,
        }
    }
}
