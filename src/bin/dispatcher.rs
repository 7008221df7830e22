//! bin/dispatcher.rs
//! Calcula la matriz de workers para el CI e imprime el JSON en stdout.
//! Los logs van a stderr para no ensuciar la salida.

use std::process::ExitCode;

use dotenv::dotenv;

use painel_sync::config::app_config::StoreConfig;
use painel_sync::logger::init_stderr_logger;
use painel_sync::services::dispatch_service::{build_matrix, WorkerMatrix};
use painel_sync::services::record_store_service::SupabaseStore;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    init_stderr_logger();

    let matrix = match StoreConfig::from_env().and_then(|config| SupabaseStore::new(&config)) {
        Ok(store) => build_matrix(&store).await,
        Err(e) => {
            log::error!("{}", e);
            WorkerMatrix::default()
        }
    };

    match serde_json::to_string(&matrix) {
        Ok(output) => {
            log::info!("Matriz generada: {}", output);
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("No se pudo serializar la matriz: {}", e);
            ExitCode::FAILURE
        }
    }
}
