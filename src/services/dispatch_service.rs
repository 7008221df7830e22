//! services/dispatch_service.rs
//! Reparte los pendientes entre workers paralelos del CI.

use serde::Serialize;

use crate::services::record_store_service::SupabaseStore;

/// Registros por worker
pub const BATCH_SIZE: u64 = 250;
/// Máximo de workers en paralelo; lo que sobre queda para la próxima corrida
pub const MAX_WORKERS: u64 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerSlice {
    pub worker_id: u64,
    pub offset: u64,
    pub limit: u64,
}

/// Formato que entiende `fromJSON` en la matriz del workflow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkerMatrix {
    pub include: Vec<WorkerSlice>,
}

pub fn plan_matrix(total: u64, batch_size: u64, max_workers: u64) -> WorkerMatrix {
    if total == 0 || batch_size == 0 {
        return WorkerMatrix::default();
    }

    let workers = total.div_ceil(batch_size).min(max_workers);
    let include = (0..workers)
        .map(|i| WorkerSlice {
            worker_id: i + 1,
            offset: i * batch_size,
            limit: batch_size,
        })
        .collect();

    WorkerMatrix { include }
}

/// Si el almacén no responde, la matriz queda vacía y el CI no
/// arranca ningún worker.
pub async fn build_matrix(store: &SupabaseStore) -> WorkerMatrix {
    match store.count_pending().await {
        Ok(total) => {
            log::info!("Encontrados {} registros pendientes.", total);
            let matrix = plan_matrix(total, BATCH_SIZE, MAX_WORKERS);
            if matrix.include.is_empty() {
                log::info!("Ningún registro para procesar; no se iniciará ningún worker.");
            } else {
                log::info!(
                    "Total de registros: {}. Workers calculados: {}.",
                    total,
                    matrix.include.len()
                );
            }
            matrix
        }
        Err(e) => {
            log::error!("Error contando pendientes: {}", e);
            WorkerMatrix::default()
        }
    }
}
