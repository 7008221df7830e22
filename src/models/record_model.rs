//! models/record_model.rs
//! Registros pendientes tal como los entrega el almacén.

use serde::Deserialize;
use serde_json::Value;

/// Valor guardado en la columna de estado cuando el cadastro quedó OK
pub const STATUS_SUCCESS: &str = "Cadastro OK";
/// Valor guardado cuando el cadastro falló
pub const STATUS_FAILURE: &str = "Erro no Cadastro";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    Pending,
    Success,
    Failure,
}

impl RecordStatus {
    /// Valor de la columna en el almacén (`None` = null).
    pub fn as_column_value(&self) -> Option<&'static str> {
        match self {
            RecordStatus::Pending => None,
            RecordStatus::Success => Some(STATUS_SUCCESS),
            RecordStatus::Failure => Some(STATUS_FAILURE),
        }
    }

    /// Cualquier valor desconocido cuenta como pendiente: solo
    /// `Cadastro OK` excluye al registro de la próxima corrida.
    pub fn from_column_value(value: Option<&str>) -> Self {
        match value {
            Some(STATUS_SUCCESS) => RecordStatus::Success,
            Some(STATUS_FAILURE) => RecordStatus::Failure,
            _ => RecordStatus::Pending,
        }
    }
}

/// Una faixa musical a registrar en el panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: i64,
    pub isrc: String,
    /// Se usa como título de la música en el formulario
    pub artista: String,
    pub titulares: String,
    pub status: RecordStatus,
}

/// Fila que no pudo convertirse en `Record`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub id: Option<i64>,
    pub reason: String,
}

/// Resultado de `fetch_pending`: registros válidos en orden del almacén
/// y filas descartadas por datos incompletos.
#[derive(Debug, Clone, Default)]
pub struct PendingBatch {
    pub records: Vec<Record>,
    pub rejected: Vec<RejectedRow>,
}

impl PendingBatch {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Fila cruda de la tabla. Las columnas numéricas a veces llegan como
/// número (ISRC importado desde planilla), por eso `Value`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRow {
    pub id: Option<i64>,
    #[serde(rename = "ISRC")]
    pub isrc: Option<Value>,
    #[serde(rename = "ARTISTA")]
    pub artista: Option<Value>,
    #[serde(rename = "TITULARES")]
    pub titulares: Option<Value>,
    #[serde(rename = "PAINEL_NEW")]
    pub painel_new: Option<String>,
}

impl RawRow {
    /// Valida la fila en el borde del almacén.
    pub fn into_record(self) -> Result<Record, RejectedRow> {
        let id = self.id.ok_or_else(|| RejectedRow {
            id: None,
            reason: "fila sin id".to_string(),
        })?;

        let reject = |campo: &str| RejectedRow {
            id: Some(id),
            reason: format!("campo {} vacío o ausente", campo),
        };

        let isrc = field_text(self.isrc.as_ref()).ok_or_else(|| reject("ISRC"))?;
        let artista = field_text(self.artista.as_ref()).ok_or_else(|| reject("ARTISTA"))?;
        let titulares = field_text(self.titulares.as_ref()).ok_or_else(|| reject("TITULARES"))?;

        Ok(Record {
            id,
            isrc,
            artista,
            titulares,
            status: RecordStatus::from_column_value(self.painel_new.as_deref()),
        })
    }
}

fn field_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
