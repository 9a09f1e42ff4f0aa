use gateway_core::config as core_config;
use gateway_core::config::get_env;
use gateway_core::error::AppError;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub log_level: String,
    pub rag_service: RagServiceConfig,
    pub upload: UploadConfig,
    pub session: SessionConfig,
    pub rate_limit: RateLimitConfig,
    pub static_dir: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RagServiceConfig {
    /// Base URL of the upstream RAG service.
    pub url: String,
    /// Timeout for processing-heavy relay calls, in seconds.
    pub request_timeout_seconds: u64,
    /// Timeout for the readiness probe against the upstream.
    pub health_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Directory uploads are spooled to for the duration of one request.
    pub dir: String,
    /// Maximum accepted upload size in bytes.
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Required, no default: refuses to start without it.
    pub secret: String,
    pub max_age_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub upload_attempts: u32,
    pub upload_window_seconds: u64,
    pub ask_attempts: u32,
    pub ask_window_seconds: u64,
    pub summarize_attempts: u32,
    pub summarize_window_seconds: u64,
    pub compare_attempts: u32,
    pub compare_window_seconds: u64,
    pub global_ip_limit: u32,
    pub global_ip_window_seconds: u64,
}

impl GatewayConfig {
    pub fn load() -> Result<Self, AppError> {
        let mut common = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        let is_prod = environment == Environment::Prod;

        // PORT takes precedence over the config-file port.
        if let Ok(port) = env::var("PORT") {
            common.port = port
                .parse()
                .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid PORT: {}", e)))?;
        }

        Ok(GatewayConfig {
            common,
            environment,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            rag_service: RagServiceConfig {
                url: get_env("RAG_SERVICE_URL", Some("http://localhost:8000"), is_prod)?
                    .trim_end_matches('/')
                    .to_string(),
                request_timeout_seconds: get_env("RAG_REQUEST_TIMEOUT_SECONDS", Some("180"), is_prod)?
                    .parse()
                    .unwrap_or(180),
                health_timeout_seconds: get_env("RAG_HEALTH_TIMEOUT_SECONDS", Some("5"), is_prod)?
                    .parse()
                    .unwrap_or(5),
            },
            upload: UploadConfig {
                dir: get_env("UPLOAD_DIR", Some("uploads"), is_prod)?,
                max_bytes: get_env("UPLOAD_MAX_BYTES", Some("20971520"), is_prod)?
                    .parse()
                    .unwrap_or(20 * 1024 * 1024),
            },
            session: SessionConfig {
                // No default even in dev: the session secret must be explicit.
                secret: get_env("SESSION_SECRET", None, is_prod)?,
                max_age_hours: get_env("SESSION_MAX_AGE_HOURS", Some("24"), is_prod)?
                    .parse()
                    .unwrap_or(24),
            },
            rate_limit: RateLimitConfig {
                upload_attempts: get_env("RATE_LIMIT_UPLOAD_ATTEMPTS", Some("10"), is_prod)?
                    .parse()
                    .unwrap_or(10),
                upload_window_seconds: get_env(
                    "RATE_LIMIT_UPLOAD_WINDOW_SECONDS",
                    Some("900"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(900),
                ask_attempts: get_env("RATE_LIMIT_ASK_ATTEMPTS", Some("60"), is_prod)?
                    .parse()
                    .unwrap_or(60),
                ask_window_seconds: get_env("RATE_LIMIT_ASK_WINDOW_SECONDS", Some("900"), is_prod)?
                    .parse()
                    .unwrap_or(900),
                summarize_attempts: get_env("RATE_LIMIT_SUMMARIZE_ATTEMPTS", Some("15"), is_prod)?
                    .parse()
                    .unwrap_or(15),
                summarize_window_seconds: get_env(
                    "RATE_LIMIT_SUMMARIZE_WINDOW_SECONDS",
                    Some("900"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(900),
                compare_attempts: get_env("RATE_LIMIT_COMPARE_ATTEMPTS", Some("10"), is_prod)?
                    .parse()
                    .unwrap_or(10),
                compare_window_seconds: get_env(
                    "RATE_LIMIT_COMPARE_WINDOW_SECONDS",
                    Some("900"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(900),
                global_ip_limit: get_env("RATE_LIMIT_GLOBAL_IP_LIMIT", Some("300"), is_prod)?
                    .parse()
                    .unwrap_or(300),
                global_ip_window_seconds: get_env(
                    "RATE_LIMIT_GLOBAL_IP_WINDOW_SECONDS",
                    Some("900"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(900),
            },
            static_dir: get_env("STATIC_DIR", Some("static"), is_prod)?,
        })
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
