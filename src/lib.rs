//! lib.rs
//! Sincroniza los cadastros pendientes de Supabase con el formulario del
//! panel, guarda el estado de cada registro y avisa por Telegram.

pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod services;

#[cfg(test)]
mod tests;
