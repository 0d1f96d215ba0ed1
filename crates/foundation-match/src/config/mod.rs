use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_EVALUATOR_BASE_URL: &str = "https://router.requesty.ai/v1";
pub const DEFAULT_EVALUATOR_MODEL: &str = "anthropic/claude-haiku-4-5";
pub const DEFAULT_EVALUATOR_TEMPERATURE: f32 = 0.3;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub evaluator: EvaluatorConfig,
    pub corpus: CorpusConfig,
    pub matching: MatchingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let api_key = env::var("EVALUATOR_API_KEY")
            .or_else(|_| env::var("REQUESTY_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty());
        let base_url = env::var("EVALUATOR_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_EVALUATOR_BASE_URL.to_string());
        let model =
            env::var("EVALUATOR_MODEL").unwrap_or_else(|_| DEFAULT_EVALUATOR_MODEL.to_string());
        let temperature = match env::var("EVALUATOR_TEMPERATURE") {
            Ok(raw) => raw
                .trim()
                .parse::<f32>()
                .ok()
                .filter(|value| (0.0..=2.0).contains(value))
                .ok_or(ConfigError::InvalidTemperature)?,
            Err(_) => DEFAULT_EVALUATOR_TEMPERATURE,
        };

        let corpus_path = env::var("FOUNDATION_CORPUS_PATH")
            .unwrap_or_else(|_| "data/foundations.json".to_string());

        let default_limit = parse_limit("MATCH_DEFAULT_LIMIT", 5)?;
        let max_limit = parse_limit("MATCH_MAX_LIMIT", 20)?;
        if default_limit > max_limit {
            return Err(ConfigError::InvalidLimit {
                variable: "MATCH_DEFAULT_LIMIT",
            });
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            evaluator: EvaluatorConfig {
                api_key,
                base_url,
                model,
                temperature,
            },
            corpus: CorpusConfig {
                path: PathBuf::from(corpus_path),
            },
            matching: MatchingConfig {
                default_limit,
                max_limit,
            },
        })
    }
}

fn parse_limit(variable: &'static str, default: usize) -> Result<usize, ConfigError> {
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|limit| *limit > 0)
            .ok_or(ConfigError::InvalidLimit { variable }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Connection settings for the OpenAI-compatible judgment endpoint.
#[derive(Clone)]
pub struct EvaluatorConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl EvaluatorConfig {
    /// The evaluator is mandatory for scoring, so a missing key is fatal once a client is built.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or(ConfigError::MissingEvaluatorKey)
    }
}

impl fmt::Debug for EvaluatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluatorConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// Location of the foundation corpus snapshot.
#[derive(Debug, Clone)]
pub struct CorpusConfig {
    pub path: PathBuf,
}

/// Result-size bounds for scoring requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchingConfig {
    pub default_limit: usize,
    pub max_limit: usize,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTemperature,
    InvalidLimit { variable: &'static str },
    MissingEvaluatorKey,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTemperature => {
                write!(f, "EVALUATOR_TEMPERATURE must be a number between 0.0 and 2.0")
            }
            ConfigError::InvalidLimit { variable } => {
                write!(f, "{variable} must be a positive integer within MATCH_MAX_LIMIT")
            }
            ConfigError::MissingEvaluatorKey => {
                write!(f, "EVALUATOR_API_KEY (or REQUESTY_API_KEY) must be set")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidTemperature
            | ConfigError::InvalidLimit { .. }
            | ConfigError::MissingEvaluatorKey => None,
        }
    }
}
