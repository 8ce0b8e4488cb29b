//! In-app and email notifications, honouring each user's preferences.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::database::{notification_repo, user_repo};
use crate::models::{NotificationCategory, NotificationChannel, NotificationPreferenceRow, NotificationRow};
use crate::services::email_service::BrevoMailer;

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub category: NotificationCategory,
    pub target_url: Option<String>,
}

impl Notice {
    pub fn new(
        user_id: i64,
        category: NotificationCategory,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            title: title.into(),
            message: message.into(),
            category,
            target_url: None,
        }
    }

    pub fn with_target(mut self, url: impl Into<String>) -> Self {
        self.target_url = Some(url.into());
        self
    }
}

/// Fire-and-forget notification sink. Implementations must not block the
/// caller and must contain their own failures.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    pool: SqlitePool,
    mailer: Option<BrevoMailer>,
    public_base_url: String,
}

impl NotificationDispatcher {
    pub fn new(pool: SqlitePool, mailer: Option<BrevoMailer>, public_base_url: String) -> Self {
        Self {
            pool,
            mailer,
            public_base_url,
        }
    }

    /// Stores the in-app row and sends email as the preferences allow.
    /// Returns the in-app notification id when one was created.
    pub async fn deliver(&self, notice: &Notice) -> sqlx::Result<Option<i64>> {
        let prefs = notification_repo::load_preferences(&self.pool, notice.user_id).await?;
        let Some(channel) = pick_channel(&prefs, notice.category, self.mailer.is_some()) else {
            info!(user_id = notice.user_id, category = notice.category.as_str(), "notification suppressed by preferences");
            return Ok(None);
        };

        let mut created = None;
        if matches!(channel, NotificationChannel::InApp | NotificationChannel::Both) {
            let id = notification_repo::insert_notification(
                &self.pool,
                notification_repo::NewNotification {
                    user_id: notice.user_id,
                    title: &notice.title,
                    message: &notice.message,
                    category: notice.category.as_str(),
                    target_url: notice.target_url.as_deref().unwrap_or(""),
                    channel: channel.as_str(),
                },
            )
            .await?;
            created = Some(id);
        }

        if matches!(channel, NotificationChannel::Email | NotificationChannel::Both) {
            self.send_email(notice).await;
        }

        Ok(created)
    }

    async fn send_email(&self, notice: &Notice) {
        let Some(mailer) = &self.mailer else {
            return;
        };
        let user = match user_repo::load_user(&self.pool, notice.user_id).await {
            Ok(Some(u)) => u,
            Ok(None) => return,
            Err(e) => {
                warn!(user_id = notice.user_id, error = %e, "could not load email recipient");
                return;
            }
        };

        let mut body = notice.message.clone();
        if let Some(target) = &notice.target_url {
            body.push_str(&format!("\n\nMore details: {}{}", self.public_base_url, target));
        }

        if let Err(e) = mailer
            .send_email(&user.email, Some(&user.display_name), &notice.title, body)
            .await
        {
            warn!(user_id = notice.user_id, error = %e, "email notification failed");
        }
    }
}

impl Notifier for NotificationDispatcher {
    fn notify(&self, notice: Notice) {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            if let Err(e) = dispatcher.deliver(&notice).await {
                warn!(
                    user_id = notice.user_id,
                    category = notice.category.as_str(),
                    error = %e,
                    "notification dispatch failed"
                );
            }
        });
    }
}

fn pick_channel(
    prefs: &NotificationPreferenceRow,
    category: NotificationCategory,
    email_available: bool,
) -> Option<NotificationChannel> {
    if !prefs.allows(category) {
        return None;
    }
    let in_app = prefs.in_app_enabled;
    let email = prefs.email_enabled && email_available;
    match (in_app, email) {
        (true, true) => Some(NotificationChannel::Both),
        (true, false) => Some(NotificationChannel::InApp),
        (false, true) => Some(NotificationChannel::Email),
        (false, false) => None,
    }
}

#[derive(Debug, Serialize)]
pub struct NotificationInbox {
    pub unread_count: i64,
    pub notifications: Vec<NotificationRow>,
}

pub async fn load_inbox(pool: &SqlitePool, user_id: i64) -> sqlx::Result<NotificationInbox> {
    let notifications = notification_repo::list_for_user(pool, user_id, 100).await?;
    let unread_count = notification_repo::count_unread(pool, user_id).await?;
    Ok(NotificationInbox {
        unread_count,
        notifications,
    })
}
