//! config/mod.rs
//! Configuración construida al inicio del proceso.

pub mod app_config;
