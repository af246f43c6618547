use serde::Deserialize;
use std::fs;
use std::path::Path;

const ENV_HOST: &str = "HOST";
const ENV_PORT: &str = "PORT";
const ENV_ENVIRONMENT: &str = "INTAKE_ENVIRONMENT";
const ENV_CONFIG_PATH: &str = "INTAKE_CONFIG_PATH";
const ENV_WEBHOOK_SECRET: &str = "INTAKE_WEBHOOK_SECRET";
const ENV_DISABLE_WEBHOOK_SIGNATURE: &str = "INTAKE_DISABLE_WEBHOOK_SIGNATURE";

const ENV_POSTGRES_HOST: &str = "INTAKE_POSTGRES_HOST";
const ENV_POSTGRES_PORT: &str = "INTAKE_POSTGRES_PORT";
const ENV_POSTGRES_USER: &str = "INTAKE_POSTGRES_USER";
const ENV_POSTGRES_PASSWORD: &str = "INTAKE_POSTGRES_PASSWORD";
const ENV_POSTGRES_DB: &str = "INTAKE_POSTGRES_DB";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const DEFAULT_POSTGRES_HOST: &str = "127.0.0.1";
const DEFAULT_POSTGRES_PORT: u16 = 5432;
const DEFAULT_POSTGRES_USER: &str = "intake";
const DEFAULT_POSTGRES_PASSWORD: &str = "intake";
const DEFAULT_POSTGRES_DB: &str = "intake";
const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_JSON_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Webhook section of the YAML file
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    #[serde(default = "default_true")]
    pub verify_signature: bool,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            verify_signature: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Maximum accepted JSON body size
    #[serde(default = "default_json_limit")]
    pub json_limit_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            json_limit_bytes: DEFAULT_JSON_LIMIT_BYTES,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_json_limit() -> usize {
    DEFAULT_JSON_LIMIT_BYTES
}

/// YAML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub database: DatabaseConfig,
    pub webhook: WebhookConfig,
    pub webhook_secret: Option<String>,
    pub http: HttpConfig,
}

impl Config {
    /// Load configuration from environment and config file
    pub fn from_env() -> Self {
        let config_path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let file = Self::load_config_file(&config_path).unwrap_or_default();

        Self::from_sources(|key| std::env::var(key).ok(), file)
    }

    fn from_sources(get: impl Fn(&str) -> Option<String>, file: ConfigFile) -> Self {
        let port = get(ENV_PORT)
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let host = get(ENV_HOST).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let environment = get(ENV_ENVIRONMENT).unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

        let database = DatabaseConfig {
            host: get(ENV_POSTGRES_HOST).unwrap_or_else(|| DEFAULT_POSTGRES_HOST.to_string()),
            port: get(ENV_POSTGRES_PORT)
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_POSTGRES_PORT),
            user: get(ENV_POSTGRES_USER).unwrap_or_else(|| DEFAULT_POSTGRES_USER.to_string()),
            password: get(ENV_POSTGRES_PASSWORD)
                .unwrap_or_else(|| DEFAULT_POSTGRES_PASSWORD.to_string()),
            database: get(ENV_POSTGRES_DB).unwrap_or_else(|| DEFAULT_POSTGRES_DB.to_string()),
            max_connections: DEFAULT_POOL_SIZE,
        };

        let mut webhook = file.webhook;
        if get(ENV_DISABLE_WEBHOOK_SIGNATURE).is_some_and(|v| v.trim().eq_ignore_ascii_case("true")) {
            webhook.verify_signature = false;
        }
        let webhook_secret = get(ENV_WEBHOOK_SECRET).filter(|s| !s.is_empty());

        Self {
            host,
            port,
            environment,
            database,
            webhook,
            webhook_secret,
            http: file.http,
        }
    }

    /// Load configuration from YAML file
    fn load_config_file(path: &str) -> Option<ConfigFile> {
        let path = Path::new(path);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => Self::parse_config_file(path, &contents),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                None
            }
        }
    }

    fn parse_config_file(path: &Path, contents: &str) -> Option<ConfigFile> {
        let contents = contents.trim();
        if contents.is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Some(ConfigFile::default());
        }

        match serde_yaml::from_str(contents) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "Loaded configuration from file");
                Some(config)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to parse config file, using defaults");
                None
            }
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_sources(|_| None, ConfigFile::default())
    }
}
