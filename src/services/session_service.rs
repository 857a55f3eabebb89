//! services/session_service.rs
//! Sesión del lado cliente: login y logout "a prueba de fallos".
//!
//! El logout invalida en el servidor, limpia lo local y siempre deja el
//! contexto como deslogueado, aunque alguna de las etapas falle.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};

use crate::errors::AppError;
use crate::models::auth_model::{SessionContext, SignOutScope};
use crate::services::auth_service::IdentityProvider;

/// Prefijo de las claves que escribe el proveedor de identidad
pub const DEFAULT_NAMESPACE_PREFIX: &str = "sb-";
pub const DEFAULT_NAMESPACE_MARKER: &str = "supabase";

/// Almacenamiento clave/valor local
pub trait SessionStorage: Send + Sync {
    fn keys(&self) -> Result<Vec<String>>;
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// En memoria; sirve como almacenamiento transitorio
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow!("MemoryStorage envenenado"))
    }
}

impl SessionStorage for MemoryStorage {
    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }
}

/// Persistente: un objeto JSON en disco
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStorage {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("No se pudo leer {:?}", self.path))?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).with_context(|| format!("JSON inválido en {:?}", self.path))
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("No se pudo escribir {:?}", self.path))
    }

    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _lock = self
            .guard
            .lock()
            .map_err(|_| anyhow!("FileStorage envenenado"))?;
        let mut entries = self.read_all()?;
        f(&mut entries);
        self.write_all(&entries)
    }
}

impl SessionStorage for FileStorage {
    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.read_all()?.into_keys().collect())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    fn clear(&self) -> Result<()> {
        self.update(|entries| entries.clear())
    }
}

/// Etapas del logout, en orden
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupStep {
    GlobalInvalidation,
    LocalInvalidation,
    SweepPersistedKeys,
    ClearTransient,
}

impl CleanupStep {
    pub const ORDER: [CleanupStep; 4] = [
        CleanupStep::GlobalInvalidation,
        CleanupStep::LocalInvalidation,
        CleanupStep::SweepPersistedKeys,
        CleanupStep::ClearTransient,
    ];
}

pub struct AuthSessionManager {
    identity: Arc<dyn IdentityProvider>,
    persistent: Arc<dyn SessionStorage>,
    transient: Arc<dyn SessionStorage>,
    namespace_prefix: String,
    namespace_marker: String,
}

impl AuthSessionManager {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        persistent: Arc<dyn SessionStorage>,
        transient: Arc<dyn SessionStorage>,
    ) -> Self {
        AuthSessionManager {
            identity,
            persistent,
            transient,
            namespace_prefix: DEFAULT_NAMESPACE_PREFIX.to_string(),
            namespace_marker: DEFAULT_NAMESPACE_MARKER.to_string(),
        }
    }

    pub fn with_namespace(mut self, prefix: &str, marker: &str) -> Self {
        self.namespace_prefix = prefix.to_string();
        self.namespace_marker = marker.to_lowercase();
        self
    }

    pub fn session_key(&self) -> String {
        format!("{}auth-token", self.namespace_prefix)
    }

    /// Inicia sesión y la guarda en el contexto y en el almacenamiento persistente.
    pub async fn sign_in(
        &self,
        ctx: &mut SessionContext,
        email: &str,
        password: &str,
    ) -> Result<(), AppError> {
        let session = self.identity.sign_in(email, password).await?;

        let serialized = serde_json::to_string(&session).context("No se pudo serializar sesión")?;
        if let Err(e) = self.persistent.set(&self.session_key(), &serialized) {
            log::warn!("(sign_in) No se pudo persistir la sesión: {:?}", e);
        }

        log::info!("(sign_in) Sesión iniciada para user={}", session.user.id);
        *ctx = SessionContext::from_session(session);
        Ok(())
    }

    /// Nunca falla: cada etapa se intenta aunque la anterior haya fallado,
    /// y al final el contexto queda vacío.
    pub async fn sign_out(&self, ctx: &mut SessionContext) {
        for step in CleanupStep::ORDER {
            if let Err(e) = self.run_step(step, ctx).await {
                log::warn!("(sign_out) Etapa {:?} falló, se continúa: {}", step, e);
            }
        }

        *ctx = SessionContext::default();
        log::info!("(sign_out) Estado local reiniciado");
    }

    async fn run_step(&self, step: CleanupStep, ctx: &SessionContext) -> Result<()> {
        match step {
            CleanupStep::GlobalInvalidation | CleanupStep::LocalInvalidation => {
                let Some(token) = ctx.access_token() else {
                    return Ok(());
                };
                let scope = if step == CleanupStep::GlobalInvalidation {
                    SignOutScope::Global
                } else {
                    SignOutScope::Local
                };
                self.identity
                    .sign_out(token, scope)
                    .await
                    .map_err(|e| anyhow!(e.to_string()))
            }
            CleanupStep::SweepPersistedKeys => {
                let mut failures = 0;
                for key in self.persistent.keys()? {
                    if self.is_namespaced(&key) && self.persistent.remove(&key).is_err() {
                        failures += 1;
                    }
                }
                if failures > 0 {
                    return Err(anyhow!("{} claves no se pudieron borrar", failures));
                }
                Ok(())
            }
            CleanupStep::ClearTransient => self.transient.clear(),
        }
    }

    fn is_namespaced(&self, key: &str) -> bool {
        key.starts_with(&self.namespace_prefix)
            || (!self.namespace_marker.is_empty()
                && key.to_lowercase().contains(&self.namespace_marker))
    }
}
