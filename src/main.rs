use std::process::ExitCode;

use dotenv::dotenv;

use painel_sync::config::app_config::AppConfig;
use painel_sync::logger::{init_logger, init_stderr_logger};
use painel_sync::services::form_session_service::ChromeFormEngine;
use painel_sync::services::record_store_service::SupabaseStore;
use painel_sync::services::report_service::{RunReporter, TelegramNotifier};
use painel_sync::services::sync_service::{run_unless_interrupted, SyncDriver};

/// Códigos de salida: 0 corrida completa (aunque haya fallas por
/// registro), 1 error fatal, 2 configuración inválida, 130 interrumpido.
const EXIT_FATAL: u8 = 1;
const EXIT_CONFIG: u8 = 2;
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok(); // Cargar .env al inicio

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_stderr_logger();
            log::error!("{}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if let Err(e) = init_logger(&config.worker_id, config.log_file.as_deref()) {
        eprintln!("No se pudo inicializar el logger: {:#}", e);
        return ExitCode::from(EXIT_CONFIG);
    }

    log::info!(
        "Iniciando automatización (tabla={}, slice={:?}, notificación={})",
        config.store.table,
        config.store.slice,
        config.notify.enabled
    );

    let store = match SupabaseStore::new(&config.store) {
        Ok(store) => store,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::from(EXIT_FATAL);
        }
    };
    let engine = ChromeFormEngine::new(&config.form);
    let reporter = RunReporter::new(TelegramNotifier::new(&config.notify), &config.notify);
    let driver = SyncDriver::new(&store, &engine, &config.worker_id);

    // Con Ctrl-C se descarta la corrida; la sesión del navegador se
    // libera en su Drop
    let run = driver.run(&config.credentials);
    let Some(summary) = run_unless_interrupted(run, tokio::signal::ctrl_c()).await else {
        log::warn!("Interrumpido por señal; abortando la corrida.");
        return ExitCode::from(EXIT_INTERRUPTED);
    };

    reporter.send(&summary).await;

    if summary.is_fatal() {
        ExitCode::from(EXIT_FATAL)
    } else {
        ExitCode::SUCCESS
    }
}
