//! services/form_session_service.rs
//! Sesión autenticada del navegador contra el panel y envío del
//! formulario de una faixa.

use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::{
    browser::{Browser, BrowserConfig},
    element::Element,
    page::Page,
};
use futures_util::StreamExt;
use tempfile::TempDir;
use tokio::{task::JoinHandle, time::timeout};

use crate::{
    config::app_config::{Credentials, FormConfig},
    error::{SyncError, SyncResult},
    models::{outcome_model::RawAttemptResult, record_model::Record},
};

/// Intervalo entre consultas de selectores
const POLL_INTERVAL: Duration = Duration::from_millis(250);
/// Pausa para que select2 y los checkboxes reaccionen
const WIDGET_SETTLE: Duration = Duration::from_millis(500);
/// Tiempo máximo para cada comando CDP
const CDP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Tiempo máximo para cerrar el navegador antes de matarlo
const CLOSE_TIMEOUT: Duration = Duration::from_secs(15);

/// Checkboxes de titulares, en el orden en que el panel los espera
const TITULAR_CHECKBOXES: [&str; 5] = [
    "input#titular_2",
    "input#titular_1",
    "input#titular_4",
    "input#titular_5",
    "input#titular_3",
];

/// Navegadores que buscamos en PATH si no se configuró uno
const CHROME_CANDIDATES: [&str; 4] = [
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
];

/// Motor capaz de abrir sesiones (estado "Unopened").
#[async_trait]
pub trait FormEngine: Send + Sync {
    type Session: FormSession;

    /// Falla con `AuthenticationError` o `SessionStartError`; ambos fatales.
    async fn open(&self, credentials: &Credentials) -> SyncResult<Self::Session>;
}

/// Sesión abierta. `close` consume la sesión: no hay vuelta atrás.
#[async_trait]
pub trait FormSession: Send {
    /// Un único intento por registro; nunca reintenta.
    async fn submit(&mut self, record: &Record) -> Result<RawAttemptResult>;

    async fn close(self) -> Result<()>;
}

pub struct ChromeFormEngine {
    config: FormConfig,
}

impl ChromeFormEngine {
    pub fn new(config: &FormConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn browser_config(&self, profile_dir: &TempDir) -> SyncResult<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .user_data_dir(profile_dir.path())
            .request_timeout(CDP_REQUEST_TIMEOUT)
            .args(vec![
                "--disable-gpu",
                "--disable-dev-shm-usage",
                "--no-first-run",
                "--no-default-browser-check",
                "--disable-extensions",
                "--disable-popup-blocking",
            ]);

        if let Some(path) = self.resolve_executable() {
            log::info!("Usando navegador en {:?}", path);
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(SyncError::SessionStartError)
    }

    fn resolve_executable(&self) -> Option<std::path::PathBuf> {
        if let Some(path) = &self.config.chrome_executable {
            return Some(path.into());
        }
        // Si no hay ninguno, chromiumoxide intenta su propia detección
        CHROME_CANDIDATES
            .iter()
            .find_map(|name| which::which(name).ok())
    }
}

#[async_trait]
impl FormEngine for ChromeFormEngine {
    type Session = ChromeFormSession;

    async fn open(&self, credentials: &Credentials) -> SyncResult<ChromeFormSession> {
        let profile_dir = tempfile::Builder::new()
            .prefix(&format!("painel-chrome-{}-", uuid::Uuid::new_v4()))
            .tempdir()
            .map_err(|e| SyncError::SessionStartError(format!("perfil temporal: {}", e)))?;

        let browser_config = self.browser_config(&profile_dir)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| SyncError::SessionStartError(format!("lanzando navegador: {}", e)))?;

        // Los eventos CDP se consumen en su propia tarea
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let session = ChromeFormSession::assemble(
                    browser,
                    None,
                    handler_task,
                    profile_dir,
                    self.config.clone(),
                );
                release_after_failure(session).await;
                return Err(SyncError::SessionStartError(format!("nueva pestaña: {}", e)));
            }
        };

        let session = ChromeFormSession::assemble(
            browser,
            Some(page),
            handler_task,
            profile_dir,
            self.config.clone(),
        );

        match session.login(credentials).await {
            Ok(()) => Ok(session),
            Err(err) => {
                release_after_failure(session).await;
                Err(err)
            }
        }
    }
}

async fn release_after_failure(session: ChromeFormSession) {
    if let Err(e) = session.close().await {
        log::warn!("Error cerrando el navegador tras fallo de apertura: {:?}", e);
    }
}

/// Aborta la tarea de eventos al salir de scope
struct HandlerGuard(JoinHandle<()>);

impl Drop for HandlerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Sesión viva. Si se descarta sin `close` (p.ej. Ctrl-C), el `Drop` de
/// `Browser` mata el proceso y el perfil temporal se borra igual.
pub struct ChromeFormSession {
    browser: Browser,
    page: Option<Page>,
    _handler: HandlerGuard,
    _profile_dir: TempDir,
    config: FormConfig,
}

impl ChromeFormSession {
    fn assemble(
        browser: Browser,
        page: Option<Page>,
        handler_task: JoinHandle<()>,
        profile_dir: TempDir,
        config: FormConfig,
    ) -> Self {
        Self {
            browser,
            page,
            _handler: HandlerGuard(handler_task),
            _profile_dir: profile_dir,
            config,
        }
    }

    fn page(&self) -> Result<&Page> {
        self.page
            .as_ref()
            .ok_or_else(|| anyhow!("la sesión no tiene pestaña abierta"))
    }

    async fn login(&self, credentials: &Credentials) -> SyncResult<()> {
        log::info!("Iniciando sesión en el panel ({})...", self.config.login_url());

        self.fill_login(credentials)
            .await
            .map_err(|e| SyncError::SessionStartError(format!("{:#}", e)))?;

        tokio::time::sleep(self.config.login_settle).await;

        let current_url = self
            .page()
            .map_err(|e| SyncError::SessionStartError(e.to_string()))?
            .url()
            .await
            .map_err(|e| SyncError::SessionStartError(format!("leyendo URL: {}", e)))?
            .unwrap_or_default();

        if current_url.contains("login") {
            log::error!("Login falló: seguimos en la página de login");
            return Err(SyncError::AuthenticationError(format!(
                "credenciales rechazadas para {}",
                credentials.username
            )));
        }

        log::info!("Login realizado con éxito.");
        Ok(())
    }

    async fn fill_login(&self, credentials: &Credentials) -> Result<()> {
        let page = self.page()?;
        page.goto(self.config.login_url())
            .await
            .context("Error navegando a la página de login")?;

        type_into(page, "input#login-username", &credentials.username).await?;
        type_into(page, "input#login-password", &credentials.password).await?;
        click(page, "button[type=\"submit\"]").await?;
        Ok(())
    }

    /// Llena y envía el formulario, luego espera la señal terminal.
    /// Sin límite propio: `submit` lo acota con `timeout`.
    async fn fill_and_submit(&self, record: &Record) -> Result<RawAttemptResult> {
        let page = self.page()?;

        page.goto(self.config.form_url())
            .await
            .context("Error navegando al formulario")?;
        wait_for_element(page, "input#titulo").await?;

        type_into(page, "input#titulo", &record.artista).await?;
        type_into(page, "input#isrc", &record.isrc).await?;

        // select2: abrir, buscar el titular y confirmar con Enter
        click(page, "span.select2-selection").await?;
        let search = wait_for_element(page, "input.select2-search__field").await?;
        search
            .type_str(&record.titulares)
            .await
            .context("Error escribiendo titulares")?
            .press_key("Enter")
            .await
            .context("Error confirmando titulares")?;
        tokio::time::sleep(WIDGET_SETTLE).await;

        for selector in TITULAR_CHECKBOXES {
            click(page, selector).await?;
        }
        tokio::time::sleep(WIDGET_SETTLE).await;

        click(page, "button#AdicionarTitular").await?;
        click(page, "button#BtnSalvar").await?;

        self.wait_terminal_signal(page).await
    }

    async fn wait_terminal_signal(&self, page: &Page) -> Result<RawAttemptResult> {
        loop {
            if page
                .find_element(self.config.success_selector.as_str())
                .await
                .is_ok()
            {
                return Ok(RawAttemptResult::Confirmed);
            }
            if let Ok(banner) = page.find_element(self.config.error_selector.as_str()).await {
                let text = banner
                    .inner_text()
                    .await
                    .ok()
                    .flatten()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty());
                return Ok(RawAttemptResult::ErrorBanner(text));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl FormSession for ChromeFormSession {
    async fn submit(&mut self, record: &Record) -> Result<RawAttemptResult> {
        attempt_within(self.config.submit_timeout, self.fill_and_submit(record)).await
    }

    async fn close(mut self) -> Result<()> {
        if let Some(page) = self.page.take() {
            let _ = finish_within(CLOSE_TIMEOUT, page.close()).await;
        }

        let closed = finish_within(CLOSE_TIMEOUT, shutdown_browser(&mut self.browser)).await;
        match closed {
            Some(Ok(())) => {
                log::info!("Navegador cerrado.");
                return Ok(());
            }
            Some(Err(e)) => log::warn!("Cierre ordenado falló ({:#}); matando el proceso", e),
            None => log::warn!(
                "El navegador no cerró en {:?}; matando el proceso",
                CLOSE_TIMEOUT
            ),
        }

        match self.browser.kill().await {
            Some(Err(e)) => Err(anyhow!(e).context("Error matando el navegador")),
            _ => Ok(()),
        }
    }
}

async fn shutdown_browser(browser: &mut Browser) -> Result<()> {
    browser
        .close()
        .await
        .context("Error cerrando el navegador")?;
    browser
        .wait()
        .await
        .context("Error esperando la salida del navegador")?;
    Ok(())
}

/// Espera `fut` como máximo `limit`; `None` si se agotó el tiempo.
pub async fn finish_within<F: Future>(limit: Duration, fut: F) -> Option<F::Output> {
    timeout(limit, fut).await.ok()
}

/// Un intento acotado: agotar el tiempo es `Timeout`, nunca `Err`.
pub async fn attempt_within<F>(limit: Duration, attempt: F) -> Result<RawAttemptResult>
where
    F: Future<Output = Result<RawAttemptResult>>,
{
    finish_within(limit, attempt)
        .await
        .unwrap_or(Ok(RawAttemptResult::Timeout))
}

async fn wait_for_element(page: &Page, selector: &str) -> Result<Element> {
    loop {
        if let Ok(element) = page.find_element(selector).await {
            return Ok(element);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

async fn type_into(page: &Page, selector: &str, value: &str) -> Result<()> {
    page.find_element(selector)
        .await
        .with_context(|| format!("No se encontró {}", selector))?
        .click()
        .await
        .with_context(|| format!("No se pudo enfocar {}", selector))?
        .type_str(value)
        .await
        .with_context(|| format!("No se pudo escribir en {}", selector))?;
    Ok(())
}

async fn click(page: &Page, selector: &str) -> Result<()> {
    page.find_element(selector)
        .await
        .with_context(|| format!("No se encontró {}", selector))?
        .click()
        .await
        .with_context(|| format!("No se pudo hacer click en {}", selector))?;
    Ok(())
}
