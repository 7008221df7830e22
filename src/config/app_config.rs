//! config/app_config.rs
//! Configuración de la corrida. Se construye una sola vez al arrancar
//! (desde .env / variables de entorno) y se pasa por referencia.

use std::time::Duration;

use crate::error::{SyncError, SyncResult};

const DEFAULT_TABLE: &str = "cadastros";
const DEFAULT_WORKER_ID: &str = "local";
const DEFAULT_PAINEL_BASE_URL: &str = "https://sistemamd.com.br";
const DEFAULT_SUCCESS_SELECTOR: &str = ".alert-success";
const DEFAULT_ERROR_SELECTOR: &str = ".alert-danger";
const DEFAULT_SUBMIT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOGIN_SETTLE_MILLIS: u64 = 2000;
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REPORT_MAX_FAILURES: usize = 10;

/// Credenciales del panel
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

// Sin Debug derivado: no queremos la contraseña en los logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Porción del conjunto pendiente asignada a este worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSlice {
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub api_key: String,
    pub table: String,
    pub slice: Option<JobSlice>,
    pub detail_column: Option<String>,
    pub timeout: Duration,
}

impl StoreConfig {
    pub fn from_env() -> SyncResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Solo la parte del almacén; el dispatcher no necesita credenciales
    /// del panel ni de Telegram.
    pub fn from_lookup<F>(lookup: F) -> SyncResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| SyncError::Config(format!("falta la variable {}", key)))
        };

        let offset = parse_opt::<u64>(get("JOB_OFFSET"), "JOB_OFFSET")?;
        let limit = parse_opt::<u64>(get("JOB_LIMIT"), "JOB_LIMIT")?;
        let slice = match (offset, limit) {
            (Some(offset), Some(limit)) => Some(JobSlice { offset, limit }),
            _ => None,
        };

        Ok(StoreConfig {
            base_url: required("SUPABASE_URL")?.trim_end_matches('/').to_string(),
            api_key: required("SUPABASE_API_KEY")?,
            table: get("TABELA").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            slice,
            detail_column: get("STATUS_DETAIL_COLUMN"),
            timeout: Duration::from_secs(
                parse_opt(get("STORE_TIMEOUT_SECS"), "STORE_TIMEOUT_SECS")?
                    .unwrap_or(DEFAULT_STORE_TIMEOUT_SECS),
            ),
        })
    }
}

#[derive(Debug, Clone)]
pub struct FormConfig {
    pub base_url: String,
    pub success_selector: String,
    pub error_selector: String,
    pub submit_timeout: Duration,
    pub login_settle: Duration,
    pub chrome_executable: Option<String>,
}

impl FormConfig {
    pub fn login_url(&self) -> String {
        format!("{}/login?login_error", self.base_url)
    }

    pub fn form_url(&self) -> String {
        format!("{}/musicas/add", self.base_url)
    }
}

#[derive(Debug, Clone)]
pub struct NotifyConfig {
    pub enabled: bool,
    pub telegram_token: String,
    pub telegram_chat_id: String,
    pub max_failures: usize,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub worker_id: String,
    pub credentials: Credentials,
    pub store: StoreConfig,
    pub form: FormConfig,
    pub notify: NotifyConfig,
    /// `None` = stderr
    pub log_file: Option<String>,
}

impl AppConfig {
    /// Lee el entorno del proceso.
    pub fn from_env() -> SyncResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Construye la config con una función de búsqueda arbitraria
    /// (en tests se usa un HashMap).
    pub fn from_lookup<F>(lookup: F) -> SyncResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| SyncError::Config(format!("falta la variable {}", key)))
        };

        let worker_id = get("WORKER_ID").unwrap_or_else(|| DEFAULT_WORKER_ID.to_string());

        let credentials = Credentials {
            username: required("LOGIN_USERNAME")?,
            password: required("LOGIN_PASSWORD")?,
        };

        let store = StoreConfig::from_lookup(&lookup)?;

        let form = FormConfig {
            base_url: get("PAINEL_BASE_URL")
                .unwrap_or_else(|| DEFAULT_PAINEL_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            success_selector: get("FORM_SUCCESS_SELECTOR")
                .unwrap_or_else(|| DEFAULT_SUCCESS_SELECTOR.to_string()),
            error_selector: get("FORM_ERROR_SELECTOR")
                .unwrap_or_else(|| DEFAULT_ERROR_SELECTOR.to_string()),
            submit_timeout: Duration::from_secs(
                parse_opt(get("SUBMIT_TIMEOUT_SECS"), "SUBMIT_TIMEOUT_SECS")?
                    .unwrap_or(DEFAULT_SUBMIT_TIMEOUT_SECS),
            ),
            login_settle: Duration::from_millis(
                parse_opt(get("LOGIN_SETTLE_MILLIS"), "LOGIN_SETTLE_MILLIS")?
                    .unwrap_or(DEFAULT_LOGIN_SETTLE_MILLIS),
            ),
            chrome_executable: get("CHROME_EXECUTABLE"),
        };

        let disabled = get("DISABLE_TELEGRAM_NOTIFICATION")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let notify = if disabled {
            NotifyConfig {
                enabled: false,
                telegram_token: get("TELEGRAM_TOKEN").unwrap_or_default(),
                telegram_chat_id: get("TELEGRAM_CHAT_ID").unwrap_or_default(),
                max_failures: DEFAULT_REPORT_MAX_FAILURES,
            }
        } else {
            NotifyConfig {
                enabled: true,
                telegram_token: required("TELEGRAM_TOKEN")?,
                telegram_chat_id: required("TELEGRAM_CHAT_ID")?,
                max_failures: parse_opt(get("REPORT_MAX_FAILURES"), "REPORT_MAX_FAILURES")?
                    .unwrap_or(DEFAULT_REPORT_MAX_FAILURES),
            }
        };

        let log_file = match get("LOG_FILE") {
            Some(path) if path == "-" => None,
            Some(path) => Some(path),
            None => Some(format!("painel_novo_{}.log", worker_id)),
        };

        Ok(AppConfig {
            worker_id,
            credentials,
            store,
            form,
            notify,
            log_file,
        })
    }
}

fn parse_opt<T: std::str::FromStr>(value: Option<String>, key: &str) -> SyncResult<Option<T>> {
    value
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| SyncError::Config(format!("valor inválido para {}: '{}'", key, v)))
        })
        .transpose()
}
