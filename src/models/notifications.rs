use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct NotificationRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub message: String,
    pub category: String,
    pub target_url: String,
    pub channel: String,
    pub is_read: bool,
    pub read_at: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationPreferenceRow {
    pub in_app_enabled: bool,
    pub email_enabled: bool,
    pub idea_updates: bool,
    pub activity_reminders: bool,
    pub hours_updates: bool,
}

impl Default for NotificationPreferenceRow {
    fn default() -> Self {
        Self {
            in_app_enabled: true,
            email_enabled: true,
            idea_updates: true,
            activity_reminders: true,
            hours_updates: true,
        }
    }
}

impl NotificationPreferenceRow {
    pub fn allows(&self, category: NotificationCategory) -> bool {
        match category {
            NotificationCategory::General => true,
            NotificationCategory::Idea => self.idea_updates,
            NotificationCategory::Activity => self.activity_reminders,
            NotificationCategory::Hours => self.hours_updates,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    General,
    Idea,
    Activity,
    Hours,
}

impl NotificationCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationCategory::General => "general",
            NotificationCategory::Idea => "idea",
            NotificationCategory::Activity => "activity",
            NotificationCategory::Hours => "hours",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationChannel {
    InApp,
    Email,
    Both,
}

impl NotificationChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationChannel::InApp => "in_app",
            NotificationChannel::Email => "email",
            NotificationChannel::Both => "both",
        }
    }
}
