//! error.rs
//! Taxonomía de errores de la sincronización.

use thiserror::Error;

/// Errores tipados del pipeline. Los detalles internos del navegador
/// viajan como `anyhow::Error` y se convierten aquí en el borde.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Variable de entorno faltante o inválida
    #[error("Error de configuración: {0}")]
    Config(String),

    /// No se pudo leer el almacén (red, auth, respuesta inválida)
    #[error("Almacén no disponible: {0}")]
    StoreUnavailable(String),

    /// Falló la escritura de estado de un registro
    #[error("Error escribiendo estado del registro {id}: {message}")]
    StoreWriteError { id: i64, message: String },

    /// El panel rechazó las credenciales
    #[error("Autenticación rechazada: {0}")]
    AuthenticationError(String),

    /// El navegador no pudo arrancar o navegar
    #[error("No se pudo iniciar la sesión del navegador: {0}")]
    SessionStartError(String),

    /// Falló el envío del resumen
    #[error("Error enviando notificación: {0}")]
    Notification(String),
}

impl SyncError {
    /// Los errores fatales impiden procesar cualquier registro más.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::Config(_)
                | SyncError::StoreUnavailable(_)
                | SyncError::AuthenticationError(_)
                | SyncError::SessionStartError(_)
        )
    }

    /// Etiqueta corta usada en logs y en el resumen.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Config(_) => "config",
            SyncError::StoreUnavailable(_) => "store_unavailable",
            SyncError::StoreWriteError { .. } => "store_write",
            SyncError::AuthenticationError(_) => "authentication",
            SyncError::SessionStartError(_) => "session_start",
            SyncError::Notification(_) => "notification",
        }
    }
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;
