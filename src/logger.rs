//! logger.rs
//! Configuración del logger usando env_logger.

use std::fs::OpenOptions;
use std::io::Write;

use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};

/// Inicializa el logger global. Con `log_file` escribe en modo append
/// sobre ese archivo; sin él, a stderr.
pub fn init_logger(worker_id: &str, log_file: Option<&str>) -> Result<()> {
    let mut builder = build_logger(worker_id);

    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("No se pudo abrir el archivo de log {}", path))?;
        builder.target(Target::Pipe(Box::new(file)));
    }

    builder
        .try_init()
        .context("El logger ya estaba inicializado")?;
    Ok(())
}

/// Logger a stderr para binarios auxiliares (stdout queda libre).
pub fn init_stderr_logger() {
    let _ = Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .target(Target::Stderr)
        .try_init();
}

fn build_logger(worker_id: &str) -> Builder {
    // RUST_LOG manda; si no está, "info"
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    let worker = worker_id.to_string();
    builder.format(move |buf, record| {
        writeln!(
            buf,
            "{} [{}] [Worker {}]: {}",
            chrono::Local::now().format("%d/%m/%Y %H:%M:%S"),
            record.level(),
            worker,
            record.args()
        )
    });
    builder
}
