use serde::{Deserialize, Serialize};

/// Usuario resuelto por el proveedor de identidad
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

/// Alcance de la invalidación de sesión en el servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutScope {
    /// Todas las sesiones del usuario
    Global,
    /// Solo la sesión del token
    Local,
}

impl SignOutScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignOutScope::Global => "global",
            SignOutScope::Local => "local",
        }
    }
}

/// Estado de sesión que se pasa explícitamente a cada operación
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub session: Option<AuthSession>,
    pub user: Option<AuthUser>,
}

impl SessionContext {
    pub fn from_session(session: AuthSession) -> Self {
        let user = session.user.clone();
        SessionContext {
            session: Some(session),
            user: Some(user),
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.access_token.as_str())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some() && self.user.is_some()
    }
}
