use serde::{Deserialize, Serialize};

/// Tipo de documento fiscal según la cantidad de dígitos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// 11 dígitos
    Cpf,
    /// 14 dígitos
    Cnpj,
}

/// POST /api/documents/validate
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateDocumentRequest {
    pub document: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidateDocumentResponse {
    pub valid: bool,
    pub formatted: String,
    pub kind: Option<DocumentKind>,
    pub kind_name: String,
}
