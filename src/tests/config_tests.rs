//! tests/config_tests.rs

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use crate::config::app_config::{AppConfig, JobSlice, StoreConfig};
    use crate::error::SyncError;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("LOGIN_USERNAME", "operador"),
            ("LOGIN_PASSWORD", "segredo"),
            ("TELEGRAM_TOKEN", "123:abc"),
            ("TELEGRAM_CHAT_ID", "-100123"),
            ("SUPABASE_URL", "https://proj.supabase.co/"),
            ("SUPABASE_API_KEY", "chave"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<AppConfig, SyncError> {
        AppConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn defaults_are_applied() {
        let config = load(&base_env()).unwrap();

        assert_eq!(config.worker_id, "local");
        assert_eq!(config.store.table, "cadastros");
        assert_eq!(config.store.base_url, "https://proj.supabase.co");
        assert_eq!(config.store.slice, None);
        assert!(config.notify.enabled);
        assert_eq!(config.form.submit_timeout, Duration::from_secs(30));
        assert_eq!(config.form.login_url(), "https://sistemamd.com.br/login?login_error");
        assert_eq!(config.form.form_url(), "https://sistemamd.com.br/musicas/add");
        assert_eq!(config.log_file.as_deref(), Some("painel_novo_local.log"));
    }

    #[test]
    fn missing_required_variable_is_a_config_error() {
        let mut env = base_env();
        env.remove("SUPABASE_API_KEY");

        let err = load(&env).unwrap_err();
        assert!(matches!(err, SyncError::Config(ref msg) if msg.contains("SUPABASE_API_KEY")));
        assert!(err.is_fatal());
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let mut env = base_env();
        env.insert("LOGIN_PASSWORD", "   ");
        assert!(load(&env).is_err());
    }

    #[test]
    fn telegram_is_optional_when_disabled() {
        let mut env = base_env();
        env.remove("TELEGRAM_TOKEN");
        env.remove("TELEGRAM_CHAT_ID");
        env.insert("DISABLE_TELEGRAM_NOTIFICATION", "TRUE");

        let config = load(&env).unwrap();
        assert!(!config.notify.enabled);
    }

    #[test]
    fn slice_requires_offset_and_limit() {
        let mut env = base_env();
        env.insert("JOB_OFFSET", "250");
        assert_eq!(load(&env).unwrap().store.slice, None);

        env.insert("JOB_LIMIT", "250");
        env.insert("WORKER_ID", "2");
        let config = load(&env).unwrap();
        assert_eq!(
            config.store.slice,
            Some(JobSlice {
                offset: 250,
                limit: 250
            })
        );
        assert_eq!(config.log_file.as_deref(), Some("painel_novo_2.log"));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let mut env = base_env();
        env.insert("JOB_LIMIT", "muitos");
        env.insert("JOB_OFFSET", "0");
        assert!(matches!(load(&env), Err(SyncError::Config(_))));
    }

    #[test]
    fn dash_log_file_means_stderr() {
        let mut env = base_env();
        env.insert("LOG_FILE", "-");
        assert_eq!(load(&env).unwrap().log_file, None);
    }

    #[test]
    fn password_is_not_printed_by_debug() {
        let config = load(&base_env()).unwrap();
        let printed = format!("{:?}", config.credentials);
        assert!(!printed.contains("segredo"));
    }

    #[test]
    fn store_config_loads_without_panel_credentials() {
        let env = HashMap::from([
            ("SUPABASE_URL", "https://proj.supabase.co"),
            ("SUPABASE_API_KEY", "chave"),
            ("TABELA", "cadastros_teste"),
        ]);
        let store = StoreConfig::from_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(store.table, "cadastros_teste");
    }
}
