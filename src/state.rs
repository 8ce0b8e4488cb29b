use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::services::email_service::BrevoMailer;
use crate::services::notification_service::{NotificationDispatcher, Notifier};
use crate::services::token_service::{SigningKeyError, TokenSigner};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<AppConfig>,
    /// Signs attendance QR tokens (activity ids).
    pub qr_signer: TokenSigner,
    /// Signs `access_token` session cookies (user ids).
    pub session_signer: TokenSigner,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: AppConfig) -> Result<Self, SigningKeyError> {
        let mailer = config.brevo.clone().map(BrevoMailer::new);
        let notifier = NotificationDispatcher::new(pool.clone(), mailer, config.public_base_url.clone());
        Self::with_notifier(pool, config, Arc::new(notifier))
    }

    pub fn with_notifier(
        pool: SqlitePool,
        config: AppConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, SigningKeyError> {
        Ok(Self {
            qr_signer: TokenSigner::qr(config.qr_secret.as_bytes())?,
            session_signer: TokenSigner::session(config.session_secret.as_bytes())?,
            pool,
            config: Arc::new(config),
            notifier,
        })
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}
