use serde::{Deserialize, Serialize};

fn default_count() -> usize {
    3
}

/// POST /api/variations
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateVariationsRequest {
    #[serde(alias = "originalMessage")]
    pub original_message: String,
    #[serde(default = "default_count")]
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateVariationsResponse {
    pub success: bool,
    /// La primera es siempre la original
    pub variations: Vec<String>,
}
