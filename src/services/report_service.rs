//! services/report_service.rs
//! Resumen de la corrida y envío por Telegram.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    config::app_config::NotifyConfig,
    error::{SyncError, SyncResult},
    models::summary_model::RunSummary,
};

const TELEGRAM_API_URL: &str = "https://api.telegram.org";
const NOTIFY_TIMEOUT: Duration = Duration::from_secs(15);
/// Largo máximo de cada línea de falla en el mensaje
const MAX_DETAIL_CHARS: usize = 200;
/// Largo máximo de la causa fatal (puede traer el body HTTP entero)
const MAX_FATAL_CHARS: usize = 500;
/// Telegram rechaza textos de más de 4096 caracteres
pub const TELEGRAM_MAX_CHARS: usize = 4096;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> SyncResult<()>;
}

#[derive(Clone)]
pub struct TelegramNotifier {
    http_client: Client,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &NotifyConfig) -> Self {
        let http_client = Client::builder()
            .timeout(NOTIFY_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http_client,
            token: config.telegram_token.clone(),
            chat_id: config.telegram_chat_id.clone(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) -> SyncResult<()> {
        let url = format!("{}/bot{}/sendMessage", TELEGRAM_API_URL, self.token);
        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
        });

        let resp = self
            .http_client
            .post(&url)
            .json(&payload)
            .send()
            .await
            // el token va en la URL: no la incluimos en el error
            .map_err(|e| SyncError::Notification(e.without_url().to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(SyncError::Notification(format!("{} - {}", status, body)));
        }
        Ok(())
    }
}

pub struct RunReporter<N> {
    notifier: N,
    enabled: bool,
    max_failures: usize,
}

impl<N: Notifier> RunReporter<N> {
    pub fn new(notifier: N, config: &NotifyConfig) -> Self {
        Self {
            notifier,
            enabled: config.enabled,
            max_failures: config.max_failures,
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Envía el resumen. Un fallo de entrega solo se registra en el log.
    pub async fn send(&self, summary: &RunSummary) {
        log::info!(
            "Resumen: enviados={} ok={} fallas={} descartados={} fatal={:?}",
            summary.submitted_count,
            summary.success_count,
            summary.failure_count,
            summary.rejected_count,
            summary.fatal
        );

        if !self.enabled {
            log::info!("Notificación por Telegram deshabilitada.");
            return;
        }

        log::info!("Enviando notificación por Telegram...");
        let message = format_summary(summary, self.max_failures);
        match self.notifier.notify(&message).await {
            Ok(()) => log::info!("Telegram enviado con éxito."),
            Err(e) => log::error!("Error al enviar notificación por Telegram: {}", e),
        }
    }
}

/// Texto del mensaje. Como máximo `max_failures` líneas de falla y nunca
/// más de `TELEGRAM_MAX_CHARS` caracteres.
pub fn format_summary(summary: &RunSummary, max_failures: usize) -> String {
    let mut lines = Vec::new();

    match &summary.fatal {
        None => lines.push(format!(
            "Painel New concluído (worker {}) 📝",
            summary.worker_id
        )),
        Some(fatal) => lines.push(format!(
            "Painel New ABORTADO (worker {}) ⚠️\nCausa: {}",
            summary.worker_id,
            truncate_chars(&fatal.message, MAX_FATAL_CHARS)
        )),
    }

    lines.push(format!("Enviados: {}", summary.submitted_count));
    lines.push(format!("Cadastrados: {}", summary.success_count));
    lines.push(format!("Falhas: {}", summary.failure_count));
    if summary.rejected_count > 0 {
        lines.push(format!("Descartados (dados incompletos): {}", summary.rejected_count));
    }
    let reconcile = summary.reconciliation_count();
    if reconcile > 0 {
        lines.push(format!("Conferir manualmente: {}", reconcile));
    }

    if summary.failure_count > 0 {
        lines.push(String::new());
        for failure in summary.failures.iter().take(max_failures) {
            lines.push(format!(
                "- id {} (ISRC {}): {}",
                failure.record_id,
                failure.isrc,
                truncate_chars(&failure.detail, MAX_DETAIL_CHARS)
            ));
        }
        let hidden = summary.failures.len().saturating_sub(max_failures);
        if hidden > 0 {
            lines.push(format!("... e mais {} falha(s)", hidden));
        }
    }

    lines.push(String::new());
    lines.push("Por gentileza validar relatório de logs, Obrigado!".to_string());
    // Telegram cuenta en UTF-16: el "…" final y el emoji del encabezado
    truncate_chars(&lines.join("\n"), TELEGRAM_MAX_CHARS - 2)
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}…", cut)
}
