//! models/outcome_model.rs
//! Resultado crudo de un intento de envío y su clasificación.

/// Señal terminal observada (o no) tras pulsar "Salvar".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawAttemptResult {
    /// Apareció el elemento de confirmación
    Confirmed,
    /// Apareció el banner de error, con su texto si se pudo leer
    ErrorBanner(Option<String>),
    /// Ninguna señal antes del timeout
    Timeout,
    /// El motor falló durante el intento
    EngineError(String),
}

impl RawAttemptResult {
    /// Texto de diagnóstico para logs y para el resumen.
    pub fn detail(&self) -> Option<String> {
        match self {
            RawAttemptResult::Confirmed => None,
            RawAttemptResult::ErrorBanner(Some(text)) => {
                Some(format!("banner de error: {}", text))
            }
            RawAttemptResult::ErrorBanner(None) => Some("banner de error".to_string()),
            RawAttemptResult::Timeout => {
                Some("sin señal de confirmación antes del timeout".to_string())
            }
            RawAttemptResult::EngineError(msg) => Some(format!("error del navegador: {}", msg)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Success,
    Failure,
}

/// Valor transitorio por registro; no se persiste como entidad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub record_id: i64,
    pub kind: OutcomeKind,
    pub detail: Option<String>,
}
