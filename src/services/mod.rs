//! services/mod.rs
//! Módulo que agrupa distintos "servicios" o "capas de negocio" de la app.

pub mod ai_gateway_service;
pub mod audit_service;
pub mod auth_service;
pub mod campaign_service;
pub mod dispatch_service;
pub mod document_service;
pub mod gateway_service;
pub mod instance_service;
pub mod message_log_service;
pub mod session_service;
pub mod support_chat_service;
pub mod variation_service;
