use sqlx::SqlitePool;

use crate::models::{NotificationPreferenceRow, NotificationRow};

pub struct NewNotification<'a> {
    pub user_id: i64,
    pub title: &'a str,
    pub message: &'a str,
    pub category: &'a str,
    pub target_url: &'a str,
    pub channel: &'a str,
}

pub async fn insert_notification(pool: &SqlitePool, n: NewNotification<'_>) -> sqlx::Result<i64> {
    let res = sqlx::query(
        r#"
INSERT INTO notifications (user_id, title, message, category, target_url, channel)
VALUES (?, ?, ?, ?, ?, ?)
"#,
    )
    .bind(n.user_id)
    .bind(n.title)
    .bind(n.message)
    .bind(n.category)
    .bind(n.target_url)
    .bind(n.channel)
    .execute(pool)
    .await?;
    Ok(res.last_insert_rowid())
}

pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: i64,
    limit: i64,
) -> sqlx::Result<Vec<NotificationRow>> {
    sqlx::query_as::<_, NotificationRow>(
        r#"
SELECT id, user_id, title, message, category, target_url, channel, is_read, read_at, created_at
FROM notifications
WHERE user_id = ?
ORDER BY created_at DESC, id DESC
LIMIT ?
"#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn count_unread(pool: &SqlitePool, user_id: i64) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn mark_read(pool: &SqlitePool, user_id: i64, notification_id: i64) -> sqlx::Result<u64> {
    let res = sqlx::query(
        r#"
UPDATE notifications
SET is_read = 1, read_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
WHERE id = ? AND user_id = ? AND is_read = 0
"#,
    )
    .bind(notification_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

pub async fn mark_all_read(pool: &SqlitePool, user_id: i64) -> sqlx::Result<u64> {
    let res = sqlx::query(
        r#"
UPDATE notifications
SET is_read = 1, read_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
WHERE user_id = ? AND is_read = 0
"#,
    )
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

/// Preferences for `user_id`, falling back to all-enabled defaults.
pub async fn load_preferences(pool: &SqlitePool, user_id: i64) -> sqlx::Result<NotificationPreferenceRow> {
    let row = sqlx::query_as::<_, NotificationPreferenceRow>(
        r#"
SELECT in_app_enabled, email_enabled, idea_updates, activity_reminders, hours_updates
FROM notification_preferences
WHERE user_id = ?
"#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.unwrap_or_default())
}

pub async fn upsert_preferences(
    pool: &SqlitePool,
    user_id: i64,
    prefs: &NotificationPreferenceRow,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
INSERT INTO notification_preferences (
  user_id, in_app_enabled, email_enabled, idea_updates, activity_reminders, hours_updates
) VALUES (?, ?, ?, ?, ?, ?)
ON CONFLICT (user_id) DO UPDATE SET
  in_app_enabled = excluded.in_app_enabled,
  email_enabled = excluded.email_enabled,
  idea_updates = excluded.idea_updates,
  activity_reminders = excluded.activity_reminders,
  hours_updates = excluded.hours_updates,
  updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
"#,
    )
    .bind(user_id)
    .bind(prefs.in_app_enabled)
    .bind(prefs.email_enabled)
    .bind(prefs.idea_updates)
    .bind(prefs.activity_reminders)
    .bind(prefs.hours_updates)
    .execute(pool)
    .await?;
    Ok(())
}
