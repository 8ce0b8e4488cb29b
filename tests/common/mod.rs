#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use sqlx::SqlitePool;
use volunteer_portal::config::AppConfig;
use volunteer_portal::database::user_repo::{self, NewUser};
use volunteer_portal::db;
use volunteer_portal::services::notification_service::{Notice, Notifier};
use volunteer_portal::services::token_service::TokenSigner;
use volunteer_portal::state::AppState;

pub const QR_SECRET: &str = "integration-qr-secret";
pub const SESSION_SECRET: &str = "integration-session-secret";

/// Keeps every notice instead of delivering it.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn for_user(&self, user_id: i64) -> Vec<Notice> {
        self.notices()
            .into_iter()
            .filter(|n| n.user_id == user_id)
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

pub async fn memory_pool() -> SqlitePool {
    db::open_pool_in_memory().await.unwrap()
}

pub fn qr_signer() -> TokenSigner {
    TokenSigner::qr(QR_SECRET.as_bytes()).unwrap()
}

pub fn test_config() -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "QR_SECRET" => Some(QR_SECRET.to_string()),
        "SESSION_SECRET" => Some(SESSION_SECRET.to_string()),
        "PUBLIC_BASE_URL" => Some("http://portal.test".to_string()),
        _ => None,
    })
    .unwrap()
}

pub fn test_state(pool: SqlitePool, notifier: Arc<RecordingNotifier>) -> AppState {
    AppState::with_notifier(pool, test_config(), notifier).unwrap()
}

/// Inserts a user with a throwaway password hash.
pub async fn create_user(pool: &SqlitePool, email: &str) -> i64 {
    user_repo::insert_user(
        pool,
        NewUser {
            email,
            password_hash: "not-a-real-hash",
            display_name: email.split('@').next().unwrap_or(email),
            title: "",
            student_id: "",
            faculty: "",
            department: "",
            year: None,
        },
    )
    .await
    .unwrap()
    .unwrap()
}

pub async fn grant_role(pool: &SqlitePool, user_id: i64, role: &str) {
    sqlx::query("INSERT INTO user_roles (user_id, role_code) VALUES (?, ?)")
        .bind(user_id)
        .bind(role)
        .execute(pool)
        .await
        .unwrap();
}

/// Inserts an activity with a fixed id so scenarios can name it.
pub async fn create_activity(
    pool: &SqlitePool,
    id: i64,
    title: &str,
    hours_tenths: i64,
    capacity: i64,
    status: &str,
) {
    sqlx::query(
        r#"
INSERT INTO activities (id, title, category, scheduled_at, location, capacity, hours_reward_tenths, status)
VALUES (?, ?, 'community', '2030-06-01T09:00', 'Main campus', ?, ?, ?)
"#,
    )
    .bind(id)
    .bind(title)
    .bind(capacity)
    .bind(hours_tenths)
    .bind(status)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn add_signup(pool: &SqlitePool, activity_id: i64, user_id: i64, status: &str) {
    sqlx::query("INSERT INTO signups (activity_id, user_id, status) VALUES (?, ?, ?)")
        .bind(activity_id)
        .bind(user_id)
        .bind(status)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn signup_status(pool: &SqlitePool, activity_id: i64, user_id: i64) -> Option<String> {
    sqlx::query_scalar("SELECT status FROM signups WHERE activity_id = ? AND user_id = ?")
        .bind(activity_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .unwrap()
}

pub async fn attendance_count(pool: &SqlitePool, activity_id: i64, user_id: i64) -> i64 {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM attendance_records WHERE activity_id = ? AND user_id = ?",
    )
    .bind(activity_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .unwrap()
}
