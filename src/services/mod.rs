//! services/mod.rs
//! Módulo que agrupa los componentes de la sincronización.

pub mod dispatch_service;
pub mod form_session_service;
pub mod outcome_classifier;
pub mod record_store_service;
pub mod report_service;
pub mod sync_service;
