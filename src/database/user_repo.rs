use sqlx::{Executor, Sqlite, SqlitePool};

use crate::models::UserRow;

const USER_COLUMNS: &str = r#"
  id,
  email,
  password_hash,
  display_name,
  title,
  student_id,
  faculty,
  department,
  year,
  created_at
"#;

pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub display_name: &'a str,
    pub title: &'a str,
    pub student_id: &'a str,
    pub faculty: &'a str,
    pub department: &'a str,
    pub year: Option<i64>,
}

/// Returns the new id, or `None` when the email is taken.
pub async fn insert_user<'e, E>(executor: E, user: NewUser<'_>) -> sqlx::Result<Option<i64>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>(
        r#"
INSERT INTO users (email, password_hash, display_name, title, student_id, faculty, department, year)
VALUES (?, ?, ?, ?, ?, ?, ?, ?)
ON CONFLICT (email) DO NOTHING
RETURNING id
"#,
    )
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.display_name)
    .bind(user.title)
    .bind(user.student_id)
    .bind(user.faculty)
    .bind(user.department)
    .bind(user.year)
    .fetch_optional(executor)
    .await
}

pub async fn load_user(pool: &SqlitePool, user_id: i64) -> sqlx::Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
    sqlx::query_as::<_, UserRow>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn load_user_by_email(pool: &SqlitePool, email: &str) -> sqlx::Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
    sqlx::query_as::<_, UserRow>(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn list_users(pool: &SqlitePool, search: Option<&str>) -> sqlx::Result<Vec<UserRow>> {
    let pattern = format!("%{}%", search.unwrap_or(""));
    let sql = format!(
        "SELECT {} FROM users WHERE email LIKE ? OR display_name LIKE ? OR student_id LIKE ? ORDER BY id ASC",
        USER_COLUMNS
    );
    sqlx::query_as::<_, UserRow>(&sql)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(pool)
        .await
}

pub struct ProfileUpdate<'a> {
    pub display_name: &'a str,
    pub title: &'a str,
    pub student_id: &'a str,
    pub faculty: &'a str,
    pub department: &'a str,
    pub year: Option<i64>,
}

pub async fn update_profile(
    pool: &SqlitePool,
    user_id: i64,
    update: ProfileUpdate<'_>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(
        r#"
UPDATE users
SET display_name = ?, title = ?, student_id = ?, faculty = ?, department = ?, year = ?
WHERE id = ?
"#,
    )
    .bind(update.display_name)
    .bind(update.title)
    .bind(update.student_id)
    .bind(update.faculty)
    .bind(update.department)
    .bind(update.year)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

pub async fn delete_user(pool: &SqlitePool, user_id: i64) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn count_users(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
}
