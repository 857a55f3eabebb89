//! models/mod.rs
//! Módulo raíz para modelos/estructuras compartidas.

pub mod audit_model;
pub mod auth_model;
pub mod campaign_model;
pub mod document_model;
pub mod instance_model;
pub mod message_log_model;
pub mod risk_model;
pub mod support_chat_model;
pub mod variation_model;
