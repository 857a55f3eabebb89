//! tests/mod.rs
//! Pruebas de servicios y endpoints contra SQLite temporal y servidores mock.

mod support;

mod audit_tests;
mod handler_tests;
mod session_tests;
