use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

use crate::services::token_service::DEFAULT_QR_TOKEN_TTL_SECS;

const DEFAULT_SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Clone)]
pub struct BrevoConfig {
    pub api_key: String,
    pub sender_email: String,
    pub sender_name: Option<String>,
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub qr_secret: String,
    pub session_secret: String,
    pub session_ttl_secs: i64,
    pub qr_token_ttl_secs: i64,
    pub public_base_url: String,
    pub allowed_email_domain: Option<String>,
    pub brevo: Option<BrevoConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source; `from_env` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = var("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port: u16 = parse_or("PORT", var("PORT"), 3000)?;

        let qr_secret = var("QR_SECRET").ok_or(ConfigError::Missing("QR_SECRET"))?;
        let session_secret = var("SESSION_SECRET").unwrap_or_else(|| {
            warn!("SESSION_SECRET not set, deriving the session key from QR_SECRET");
            format!("{}:session", qr_secret)
        });

        let session_ttl_secs = parse_or(
            "SESSION_TTL_SECS",
            var("SESSION_TTL_SECS"),
            DEFAULT_SESSION_TTL_SECS,
        )?;
        let qr_token_ttl_secs = parse_or(
            "QR_TOKEN_TTL_SECS",
            var("QR_TOKEN_TTL_SECS"),
            DEFAULT_QR_TOKEN_TTL_SECS,
        )?;
        if qr_token_ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                key: "QR_TOKEN_TTL_SECS",
                message: "must be positive".to_string(),
            });
        }

        let public_base_url = var("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://{}:{}", host, port))
            .trim_end_matches('/')
            .to_string();

        let allowed_email_domain = var("ALLOWED_EMAIL_DOMAIN")
            .map(|d| d.trim_start_matches('@').to_ascii_lowercase());

        let brevo = match (var("BREVO_API_KEY"), var("BREVO_SENDER_EMAIL")) {
            (Some(api_key), Some(sender_email)) => Some(BrevoConfig {
                api_key,
                sender_email,
                sender_name: var("BREVO_SENDER_NAME"),
            }),
            _ => {
                info!("Brevo not configured, email notifications disabled");
                None
            }
        };

        Ok(Self {
            database_url: var("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://volunteer.db?mode=rwc".to_string()),
            host,
            port,
            qr_secret,
            session_secret,
            session_ttl_secs,
            qr_token_ttl_secs,
            public_base_url,
            allowed_email_domain,
            brevo,
        })
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: e.to_string(),
        }),
    }
}
