// src/config.rs

use std::{env, fmt, net::SocketAddr};

/// Whitelist used when the `allowed_emails` table is empty or unreachable.
/// Overridden by `WHITELIST_FALLBACK`.
pub const DEFAULT_WHITELIST: &[&str] = &[
    "admin@learning-hub.local",
    "trainer@learning-hub.local",
    "hr@learning-hub.local",
];

/// Outbound mail settings. `user`/`pass` empty means delivery is disabled.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
    pub timeout_secs: u64,
}

impl SmtpConfig {
    pub fn is_configured(&self) -> bool {
        !self.user.is_empty() && !self.pass.is_empty()
    }
}

/// Process-wide settings, built once in `main` and shared through `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    pub cors_origins: Vec<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub admin_name: String,
    pub seed_sample_course: bool,
    pub fallback_whitelist: Vec<String>,
    pub smtp: SmtpConfig,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{key} must be set"),
            ConfigError::Invalid { key, value } => write!(f, "invalid value '{value}' for {key}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").unwrap_or_else(|| "sqlite://data/lms.db".to_string());
        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let jwt_expiration = parse_or("JWT_EXPIRATION", get("JWT_EXPIRATION"), 7 * 24 * 3600)?;
        let rust_log = get("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:5000".to_string());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::Invalid {
            key: "BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let cors_origins = get("CORS_ORIGINS")
            .map(|raw| split_list(&raw))
            .unwrap_or_else(|| vec!["http://localhost:3000".to_string()]);

        let fallback_whitelist = get("WHITELIST_FALLBACK")
            .map(|raw| split_list(&raw))
            .unwrap_or_else(|| DEFAULT_WHITELIST.iter().map(|e| e.to_string()).collect())
            .into_iter()
            .map(|e| e.to_lowercase())
            .collect();

        let seed_sample_course = match get("SEED_SAMPLE_COURSE") {
            None => true,
            Some(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"),
        };

        let smtp_user = get("SMTP_USER").unwrap_or_default();
        let smtp = SmtpConfig {
            server: get("SMTP_SERVER").unwrap_or_else(|| "smtp.gmail.com".to_string()),
            port: parse_or("SMTP_PORT", get("SMTP_PORT"), 587)?,
            pass: get("SMTP_PASS").unwrap_or_default(),
            from: get("SMTP_FROM").unwrap_or_else(|| smtp_user.clone()),
            user: smtp_user,
            timeout_secs: parse_or("SMTP_TIMEOUT_SECS", get("SMTP_TIMEOUT_SECS"), 20)?,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            bind_addr,
            cors_origins,
            admin_email: get("ADMIN_EMAIL").map(|e| e.trim().to_lowercase()),
            admin_password: get("ADMIN_PASSWORD"),
            admin_name: get("ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
            seed_sample_course,
            fallback_whitelist,
            smtp,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
