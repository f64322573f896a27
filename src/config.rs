use std::env;
use std::time::Duration;
use url::Url;

pub fn init_logging() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
}

const RAG_API_URL: &str = "http://localhost:8000";
const LOGIN_PATH: &str = "/auth/login";
const TOKEN_CACHE_FILE: &str = "tokencache.json";
const BIND_HOST: &str = "127.0.0.1";
const BIND_PORT: u16 = 8080;
const REQUEST_TIMEOUT_SECS: u64 = 30;
const STATIC_DIR: &str = "./static";

/// Extensions the backend accepts for ingestion.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "docx", "xlsx", "pptx"];

pub fn login_path() -> String {
    String::from(LOGIN_PATH)
}

pub fn token_cache_file() -> String {
    String::from(TOKEN_CACHE_FILE)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid URL in {key}: {message}")]
    InvalidUrl { key: String, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Runtime settings for the console, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: Url,
    pub login_path: String,
    pub token_cache_file: String,
    pub bind_host: String,
    pub bind_port: u16,
    pub request_timeout: Duration,
    pub simulate_ingestion: bool,
    pub static_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_base_url: Url::parse(RAG_API_URL).expect("Default RAG API URL is valid"),
            login_path: login_path(),
            token_cache_file: token_cache_file(),
            bind_host: BIND_HOST.to_string(),
            bind_port: BIND_PORT,
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            simulate_ingestion: true,
            static_dir: STATIC_DIR.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine; real environment variables still apply.
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();

        let api_base_url = match lookup("RAG_API_URL") {
            Some(raw) => Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
                key: "RAG_API_URL".to_string(),
                message: e.to_string(),
            })?,
            None => defaults.api_base_url,
        };

        let bind_port = match lookup("BIND_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                key: "BIND_PORT".to_string(),
                value: raw,
            })?,
            None => defaults.bind_port,
        };

        let request_timeout = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidValue {
                    key: "REQUEST_TIMEOUT_SECS".to_string(),
                    value: raw,
                })?,
            None => defaults.request_timeout,
        };

        let simulate_ingestion = match lookup("SIMULATE_INGESTION") {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidValue {
                key: "SIMULATE_INGESTION".to_string(),
                value: raw,
            })?,
            None => defaults.simulate_ingestion,
        };

        Ok(AppConfig {
            api_base_url,
            login_path: lookup("LOGIN_PATH").unwrap_or(defaults.login_path),
            token_cache_file: lookup("TOKEN_CACHE_FILE").unwrap_or(defaults.token_cache_file),
            bind_host: lookup("BIND_HOST").unwrap_or(defaults.bind_host),
            bind_port,
            request_timeout,
            simulate_ingestion,
            static_dir: lookup("STATIC_DIR").unwrap_or(defaults.static_dir),
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
