//! models/mod.rs
//! Módulo raíz para modelos/estructuras compartidas.

pub mod outcome_model;
pub mod record_model;
pub mod summary_model;
