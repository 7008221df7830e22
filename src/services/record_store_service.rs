//! services/record_store_service.rs
//! Acceso tipado a la tabla de cadastros (API REST de Supabase).

use std::future::Future;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{Map, Value};

use crate::{
    config::app_config::StoreConfig,
    error::{SyncError, SyncResult},
    models::record_model::{PendingBatch, RawRow, RecordStatus, RejectedRow, STATUS_SUCCESS},
};

/// Columna que guarda el estado del cadastro en el panel nuevo
pub const STATUS_COLUMN: &str = "PAINEL_NEW";
/// Filas pedidas por GET; coincide con el `max-rows` por defecto de Supabase
pub const PAGE_SIZE: u64 = 1000;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Todos los registros con estado distinto de Success, en el orden
    /// que define el almacén.
    async fn fetch_pending(&self) -> SyncResult<PendingBatch>;

    /// Idempotente: aplicar dos veces el mismo estado deja la fila igual.
    async fn update_status(
        &self,
        id: i64,
        status: RecordStatus,
        detail: Option<&str>,
    ) -> SyncResult<()>;
}

#[derive(Clone, Debug)]
pub struct SupabaseStore {
    http_client: Client,
    config: StoreConfig,
}

impl SupabaseStore {
    pub fn new(config: &StoreConfig) -> SyncResult<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SyncError::StoreUnavailable(format!("cliente HTTP: {}", e)))?;

        Ok(Self {
            http_client,
            config: config.clone(),
        })
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url,
            urlencoding::encode(&self.config.table)
        )
    }

    /// apikey + Bearer en cada llamada
    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    /// Cuenta los pendientes sin descargar filas (HEAD + count=exact).
    pub async fn count_pending(&self) -> SyncResult<u64> {
        let resp = self
            .authorized(self.http_client.head(self.table_url()))
            .header("Prefer", "count=exact")
            .query(&[("select", "id"), ("or", pending_filter().as_str()), ("limit", "1")])
            .send()
            .await
            .map_err(|e| SyncError::StoreUnavailable(format!("HEAD {}: {}", self.table_url(), e)))?;

        if !resp.status().is_success() {
            return Err(SyncError::StoreUnavailable(format!(
                "HEAD devolvió {}",
                resp.status()
            )));
        }

        let range = resp
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                SyncError::StoreUnavailable("respuesta sin cabecera content-range".to_string())
            })?;

        parse_content_range_total(range).ok_or_else(|| {
            SyncError::StoreUnavailable(format!("content-range inválido: '{}'", range))
        })
    }

    /// Una página de pendientes en orden estable de id.
    async fn fetch_page(&self, offset: u64, limit: u64) -> SyncResult<Vec<Value>> {
        let params: Vec<(&str, String)> = vec![
            ("select", "*".to_string()),
            ("or", pending_filter()),
            // Orden estable para que las porciones de cada worker no se pisen
            ("order", "id.asc".to_string()),
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
        ];

        let resp = self
            .authorized(self.http_client.get(self.table_url()))
            .query(&params)
            .send()
            .await
            .map_err(|e| SyncError::StoreUnavailable(format!("GET {}: {}", self.table_url(), e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::StoreUnavailable(format!("{} - {}", status, body)));
        }

        resp.json::<Vec<Value>>()
            .await
            .map_err(|e| SyncError::StoreUnavailable(format!("JSON inválido: {}", e)))
    }
}

#[async_trait]
impl RecordStore for SupabaseStore {
    async fn fetch_pending(&self) -> SyncResult<PendingBatch> {
        log::info!(
            "Buscando pendientes en '{}' (slice={:?})...",
            self.config.table,
            self.config.slice
        );

        let (start, max_rows) = match self.config.slice {
            Some(slice) => (slice.offset, Some(slice.limit)),
            None => (0, None),
        };
        let rows = fetch_all_pages(start, max_rows, PAGE_SIZE, |offset, limit| {
            self.fetch_page(offset, limit)
        })
        .await?;

        let batch = partition_rows(rows);
        log::info!(
            "Encontrados {} registros para procesar ({} descartados).",
            batch.records.len(),
            batch.rejected.len()
        );
        for rejected in &batch.rejected {
            log::warn!(
                "Fila descartada (id={:?}): {}",
                rejected.id,
                rejected.reason
            );
        }
        Ok(batch)
    }

    async fn update_status(
        &self,
        id: i64,
        status: RecordStatus,
        detail: Option<&str>,
    ) -> SyncResult<()> {
        let body = status_patch_body(status, detail, self.config.detail_column.as_deref());

        let resp = self
            .authorized(self.http_client.patch(self.table_url()))
            .header("Prefer", "return=minimal")
            .query(&[("id", format!("eq.{}", id))])
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::StoreWriteError {
                id,
                message: e.to_string(),
            })?;

        match resp.status() {
            StatusCode::NO_CONTENT | StatusCode::OK => Ok(()),
            other => {
                let text = resp.text().await.unwrap_or_default();
                Err(SyncError::StoreWriteError {
                    id,
                    message: format!("{} - {}", other, text),
                })
            }
        }
    }
}

/// Lee páginas consecutivas desde `start` hasta recibir una vacía o
/// juntar `max_rows`. Una página corta no corta la lectura: el servidor
/// puede tener un `max-rows` menor que `page_size`.
pub async fn fetch_all_pages<F, Fut>(
    start: u64,
    max_rows: Option<u64>,
    page_size: u64,
    mut fetch: F,
) -> SyncResult<Vec<Value>>
where
    F: FnMut(u64, u64) -> Fut,
    Fut: Future<Output = SyncResult<Vec<Value>>>,
{
    let page_size = page_size.max(1);
    let mut rows: Vec<Value> = Vec::new();

    loop {
        let read = rows.len() as u64;
        let limit = match max_rows {
            Some(max) if read >= max => break,
            Some(max) => (max - read).min(page_size),
            None => page_size,
        };

        let page = fetch(start + read, limit).await?;
        if page.is_empty() {
            break;
        }
        log::debug!("Página offset={} con {} filas", start + read, page.len());
        rows.extend(page);
    }

    Ok(rows)
}

/// Filtro PostgREST: estado nulo o distinto de "Cadastro OK".
pub fn pending_filter() -> String {
    format!(
        "({col}.is.null,{col}.neq.{ok})",
        col = STATUS_COLUMN,
        ok = STATUS_SUCCESS
    )
}

/// Convierte las filas crudas en registros válidos y descartados.
/// Una fila ya en Success nunca pasa, aunque el filtro del servidor falle.
pub fn partition_rows(rows: Vec<Value>) -> PendingBatch {
    let mut batch = PendingBatch::default();

    for row in rows {
        let row_id = row.get("id").and_then(Value::as_i64);
        let raw = match serde_json::from_value::<RawRow>(row) {
            Ok(raw) => raw,
            Err(e) => {
                batch.rejected.push(RejectedRow {
                    id: row_id,
                    reason: format!("fila con formato inválido: {}", e),
                });
                continue;
            }
        };

        match raw.into_record() {
            Ok(record) if record.status == RecordStatus::Success => {
                log::warn!("Registro {} ya está en Success, se ignora", record.id);
            }
            Ok(record) => batch.records.push(record),
            Err(rejected) => batch.rejected.push(rejected),
        }
    }

    batch
}

/// Cuerpo del PATCH de estado.
pub fn status_patch_body(
    status: RecordStatus,
    detail: Option<&str>,
    detail_column: Option<&str>,
) -> Value {
    let mut body = Map::new();
    body.insert(
        STATUS_COLUMN.to_string(),
        status
            .as_column_value()
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null),
    );
    if let Some(column) = detail_column {
        body.insert(
            column.to_string(),
            detail
                .map(|d| Value::String(d.to_string()))
                .unwrap_or(Value::Null),
        );
    }
    Value::Object(body)
}

/// Total de un `content-range` de PostgREST ("0-0/1234", "*/0").
pub fn parse_content_range_total(header: &str) -> Option<u64> {
    let (_, total) = header.trim().rsplit_once('/')?;
    total.trim().parse().ok()
}
