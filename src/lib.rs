//! Backend de ComunicaZap: campañas de WhatsApp, variaciones con IA,
//! chat de soporte, auditoría de admins y validación de CPF/CNPJ.

pub mod app;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod logger;
pub mod models;
pub mod services;

#[cfg(test)]
mod tests;
