use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use market_client::ClientConfig;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080/api";
const DEFAULT_TOKEN_FILE: &str = ".market_token";

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub token_file: PathBuf,
    pub log_level: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = non_blank(lookup("MARKET_API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let token_file = non_blank(lookup("MARKET_TOKEN_FILE"))
            .unwrap_or_else(|| DEFAULT_TOKEN_FILE.to_string())
            .into();
        let log_level = non_blank(lookup("LOG_LEVEL"))
            .or_else(|| non_blank(lookup("RUST_LOG")))
            .unwrap_or_else(|| "warn".to_string());
        let connect_timeout_secs = parse_secs(
            "MARKET_CONNECT_TIMEOUT_SECS",
            lookup("MARKET_CONNECT_TIMEOUT_SECS"),
            5,
        )?;
        let request_timeout_secs = parse_secs(
            "MARKET_REQUEST_TIMEOUT_SECS",
            lookup("MARKET_REQUEST_TIMEOUT_SECS"),
            15,
        )?;

        Ok(Self {
            api_url,
            token_file,
            log_level,
            connect_timeout_secs,
            request_timeout_secs,
        })
    }

    /// Конфигурация клиента. `server` из `--server` важнее `MARKET_API_URL`.
    pub fn client_config(&self, server: Option<String>) -> ClientConfig {
        let base_url = normalize_server(server.unwrap_or_else(|| self.api_url.clone()));
        ClientConfig {
            base_url,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

pub fn normalize_server(server: String) -> String {
    let server = server.trim().trim_end_matches('/').to_string();
    if server.starts_with("http://") || server.starts_with("https://") {
        return server;
    }

    format!("http://{server}")
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_secs(key: &str, raw: Option<String>, default: u64) -> Result<u64> {
    let value = match non_blank(raw) {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?,
        None => default,
    };

    if value == 0 {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let s = settings(&[]).expect("defaults must parse");
        assert_eq!(s.api_url, DEFAULT_API_URL);
        assert_eq!(s.token_file, PathBuf::from(".market_token"));
        assert_eq!(s.log_level, "warn");
        assert_eq!(s.connect_timeout_secs, 5);
        assert_eq!(s.request_timeout_secs, 15);
    }

    #[test]
    fn log_level_falls_back_to_rust_log() {
        let s = settings(&[("RUST_LOG", "debug")]).expect("must parse");
        assert_eq!(s.log_level, "debug");

        let s = settings(&[("RUST_LOG", "debug"), ("LOG_LEVEL", "info")]).expect("must parse");
        assert_eq!(s.log_level, "info");
    }

    #[test]
    fn zero_or_garbage_timeouts_are_rejected() {
        assert!(settings(&[("MARKET_REQUEST_TIMEOUT_SECS", "0")]).is_err());
        assert!(settings(&[("MARKET_CONNECT_TIMEOUT_SECS", "soon")]).is_err());
    }

    #[test]
    fn server_flag_overrides_env_url() {
        let s = settings(&[("MARKET_API_URL", "http://api.local/api")]).expect("must parse");
        assert_eq!(s.client_config(None).base_url, "http://api.local/api");
        assert_eq!(
            s.client_config(Some("localhost:9999/api/".to_string()))
                .base_url,
            "http://localhost:9999/api"
        );
    }

    #[test]
    fn normalize_server_keeps_scheme() {
        let s = normalize_server("https://example.com:8080/api".to_string());
        assert_eq!(s, "https://example.com:8080/api");
    }

    #[test]
    fn normalize_server_adds_http_scheme() {
        let s = normalize_server("127.0.0.1:8080".to_string());
        assert_eq!(s, "http://127.0.0.1:8080");
    }
}
