//! config/mod.rs
//! Configuración global del servicio.

pub mod app_config;

pub use app_config::{AppConfig, SendPolicy};
