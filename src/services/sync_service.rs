//! services/sync_service.rs
//! Corrida de sincronización: pendientes -> formulario -> estado -> resumen.

use std::any::Any;
use std::future::Future;
use std::io;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;

use crate::{
    config::app_config::Credentials,
    models::{
        outcome_model::{OutcomeKind, RawAttemptResult},
        record_model::{Record, RecordStatus},
        summary_model::{FailureDetail, RunSummary},
    },
    services::{
        form_session_service::{FormEngine, FormSession},
        outcome_classifier::to_outcome,
        record_store_service::RecordStore,
    },
};

/// Detalle para una faixa que el panel aceptó pero cuyo estado no se
/// pudo guardar. No se reintenta: podría duplicar el cadastro.
pub const WRITE_FAILED_AFTER_SUBMIT: &str = "enviado pero falló la escritura de estado";

pub struct SyncDriver<'a, S, E> {
    store: &'a S,
    engine: &'a E,
    worker_id: String,
}

impl<'a, S, E> SyncDriver<'a, S, E>
where
    S: RecordStore,
    E: FormEngine,
{
    pub fn new(store: &'a S, engine: &'a E, worker_id: &str) -> Self {
        Self {
            store,
            engine,
            worker_id: worker_id.to_string(),
        }
    }

    /// Ejecuta una corrida completa. Nunca falla: los errores fatales
    /// quedan en `RunSummary::fatal`.
    pub async fn run(&self, credentials: &Credentials) -> RunSummary {
        let mut summary = RunSummary::new(&self.worker_id);

        // 1) Pendientes
        let batch = match self.store.fetch_pending().await {
            Ok(batch) => batch,
            Err(e) => {
                log::error!("(run) No se pudieron leer los pendientes: {}", e);
                summary.set_fatal(&e);
                return summary.finish();
            }
        };
        summary.rejected_count = batch.rejected.len();

        if batch.is_empty() {
            log::info!("(run) Ningún registro pendiente. Finalizando...");
            return summary.finish();
        }

        // 2) Una sola sesión para toda la corrida
        let mut session = match self.engine.open(credentials).await {
            Ok(session) => session,
            Err(e) => {
                log::error!("(run) No se pudo abrir la sesión: {}", e);
                summary.set_fatal(&e);
                return summary.finish();
            }
        };

        // 3) Registros en orden, uno a la vez
        let total = batch.records.len();
        log::info!("(run) Iniciando cadastro de {} faixas...", total);
        for (pos, record) in batch.records.iter().enumerate() {
            self.process_record(&mut session, record, pos + 1, total, &mut summary)
                .await;
        }

        // 4) Cierre, siempre
        if let Err(e) = session.close().await {
            log::warn!("(run) Error cerrando la sesión: {:?}", e);
        }

        log::info!(
            "(run) Total: {} enviados, {} OK, {} con falla.",
            summary.submitted_count,
            summary.success_count,
            summary.failure_count
        );
        summary.finish()
    }

    /// Un registro. Cualquier error queda contenido aquí.
    async fn process_record(
        &self,
        session: &mut E::Session,
        record: &Record,
        pos: usize,
        total: usize,
        summary: &mut RunSummary,
    ) {
        log::info!(
            "[{}/{}] Enviando id={} ISRC={} ARTISTA={} TITULARES={}",
            pos,
            total,
            record.id,
            record.isrc,
            record.artista,
            record.titulares
        );

        // Único punto donde los errores del motor se vuelven datos
        let raw = match AssertUnwindSafe(session.submit(record)).catch_unwind().await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => RawAttemptResult::EngineError(format!("{:#}", e)),
            Err(panic) => RawAttemptResult::EngineError(panic_message(panic.as_ref())),
        };

        let outcome = to_outcome(record.id, &raw);
        let status = match outcome.kind {
            OutcomeKind::Success => RecordStatus::Success,
            OutcomeKind::Failure => RecordStatus::Failure,
        };
        let write = self
            .store
            .update_status(record.id, status, outcome.detail.as_deref())
            .await;

        match (outcome.kind, write) {
            (OutcomeKind::Success, Ok(())) => {
                log::info!(
                    "[{}/{}] ISRC {} registrado y estado actualizado",
                    pos,
                    total,
                    record.isrc
                );
                summary.record_success();
            }
            (OutcomeKind::Success, Err(e)) => {
                log::warn!(
                    "[{}/{}] ISRC {} registrado pero no se pudo guardar el estado: {}",
                    pos,
                    total,
                    record.isrc,
                    e
                );
                summary.record_failure(FailureDetail {
                    record_id: record.id,
                    isrc: record.isrc.clone(),
                    detail: format!("{}: {}", WRITE_FAILED_AFTER_SUBMIT, e),
                    needs_reconciliation: true,
                });
            }
            (OutcomeKind::Failure, write) => {
                let mut detail = outcome
                    .detail
                    .unwrap_or_else(|| "falla sin detalle".to_string());
                log::error!(
                    "[{}/{}] Error en el cadastro del ISRC {}: {}",
                    pos,
                    total,
                    record.isrc,
                    detail
                );
                if let Err(e) = write {
                    log::warn!(
                        "[{}/{}] Tampoco se pudo guardar el estado de falla: {}",
                        pos,
                        total,
                        e
                    );
                    detail = format!("{}; escritura de estado falló: {}", detail, e);
                }
                summary.record_failure(FailureDetail {
                    record_id: record.id,
                    isrc: record.isrc.clone(),
                    detail,
                    needs_reconciliation: false,
                });
            }
        }
    }
}

/// Corre `run` hasta que termine o hasta que llegue `interrupt`
/// (`None`). Si no se puede escuchar la señal, la corrida sigue sin ella.
pub async fn run_unless_interrupted<R, I>(run: R, interrupt: I) -> Option<R::Output>
where
    R: Future,
    I: Future<Output = io::Result<()>>,
{
    tokio::pin!(run);

    let signal = tokio::select! {
        output = &mut run => return Some(output),
        signal = interrupt => signal,
    };

    match signal {
        Ok(()) => None,
        Err(e) => {
            log::warn!("No se pudo escuchar Ctrl-C ({}); la corrida continúa.", e);
            Some(run.await)
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        format!("panic: {}", msg)
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("panic: {}", msg)
    } else {
        "panic sin mensaje".to_string()
    }
}
