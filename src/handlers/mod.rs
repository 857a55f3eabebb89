//! handlers/mod.rs
//! Módulo que agrupa los distintos handlers HTTP.

pub mod audit_handler;
pub mod campaign_handler;
pub mod document_handler;
pub mod instance_handler;
pub mod support_chat_handler;
pub mod variation_handler;
