use sqlx::{Executor, Sqlite, SqlitePool};

use crate::models::{ActivitySignupRow, SignupRow, UserSignupRow};

const SIGNUP_COLUMNS: &str = "id, activity_id, user_id, status, note, joined_at, updated_at";

// Statuses that occupy a place; must agree with SignupStatus::holds_spot.
const SQL_HELD_SPOTS: &str = r#"
(SELECT COUNT(*) FROM signups s
 WHERE s.activity_id = ?
   AND s.status IN ('requested', 'confirmed', 'attended'))
"#;

pub async fn load_signup<'e, E>(
    executor: E,
    activity_id: i64,
    user_id: i64,
) -> sqlx::Result<Option<SignupRow>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {} FROM signups WHERE activity_id = ? AND user_id = ?",
        SIGNUP_COLUMNS
    );
    sqlx::query_as::<_, SignupRow>(&sql)
        .bind(activity_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

pub async fn load_signup_by_id(pool: &SqlitePool, signup_id: i64) -> sqlx::Result<Option<SignupRow>> {
    let sql = format!("SELECT {} FROM signups WHERE id = ?", SIGNUP_COLUMNS);
    sqlx::query_as::<_, SignupRow>(&sql)
        .bind(signup_id)
        .fetch_optional(pool)
        .await
}

/// Inserts a signup in one statement, choosing `confirmed` while places are
/// free and `waitlist` otherwise. Returns the stored status, or `None` when
/// the activity is missing, closed, or the user already has a signup.
pub async fn insert_signup_with_capacity(
    pool: &SqlitePool,
    activity_id: i64,
    user_id: i64,
    note: &str,
) -> sqlx::Result<Option<String>> {
    let sql = format!(
        r#"
INSERT INTO signups (activity_id, user_id, status, note)
SELECT a.id, ?, CASE WHEN {held} < a.capacity THEN 'confirmed' ELSE 'waitlist' END, ?
FROM activities a
WHERE a.id = ? AND a.status IN ('upcoming', 'ongoing')
ON CONFLICT (activity_id, user_id) DO NOTHING
RETURNING status
"#,
        held = SQL_HELD_SPOTS
    );
    sqlx::query_scalar::<_, String>(&sql)
        .bind(user_id)
        .bind(activity_id)
        .bind(note)
        .bind(activity_id)
        .fetch_optional(pool)
        .await
}

/// Re-activates a cancelled signup under the same capacity rule.
pub async fn reactivate_signup(
    pool: &SqlitePool,
    activity_id: i64,
    user_id: i64,
    note: &str,
) -> sqlx::Result<Option<String>> {
    let sql = format!(
        r#"
UPDATE signups
SET status = CASE
      WHEN {held} < (SELECT capacity FROM activities WHERE id = ?) THEN 'confirmed'
      ELSE 'waitlist'
    END,
    note = ?,
    updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
WHERE activity_id = ? AND user_id = ? AND status = 'cancelled'
RETURNING status
"#,
        held = SQL_HELD_SPOTS
    );
    sqlx::query_scalar::<_, String>(&sql)
        .bind(activity_id)
        .bind(activity_id)
        .bind(note)
        .bind(activity_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn cancel_signup<'e, E>(executor: E, activity_id: i64, user_id: i64) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(
        r#"
UPDATE signups
SET status = 'cancelled', updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
WHERE activity_id = ? AND user_id = ? AND status NOT IN ('attended', 'cancelled')
"#,
    )
    .bind(activity_id)
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(res.rows_affected())
}

/// Moves a signup from `from` to `to`. Attended signups never match, and a
/// row that left `from` in the meantime is left alone (0 rows).
pub async fn set_signup_status<'e, E>(
    executor: E,
    signup_id: i64,
    from: &str,
    to: &str,
) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(
        r#"
UPDATE signups
SET status = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
WHERE id = ? AND status = ? AND status <> 'attended'
"#,
    )
    .bind(to)
    .bind(signup_id)
    .bind(from)
    .execute(executor)
    .await?;
    Ok(res.rows_affected())
}

/// Promotes the oldest waitlisted signup when a place is free. Returns the
/// promoted user.
pub async fn promote_next_waitlisted<'e, E>(executor: E, activity_id: i64) -> sqlx::Result<Option<i64>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        r#"
UPDATE signups
SET status = 'confirmed', updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
WHERE id = (
    SELECT id FROM signups
    WHERE activity_id = ? AND status = 'waitlist'
    ORDER BY joined_at ASC, id ASC
    LIMIT 1
  )
  AND {held} < (SELECT capacity FROM activities WHERE id = ?)
RETURNING user_id
"#,
        held = SQL_HELD_SPOTS
    );
    sqlx::query_scalar::<_, i64>(&sql)
        .bind(activity_id)
        .bind(activity_id)
        .bind(activity_id)
        .fetch_optional(executor)
        .await
}

pub async fn mark_attended<'e, E>(executor: E, activity_id: i64, user_id: i64) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(
        r#"
UPDATE signups
SET status = 'attended', updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
WHERE activity_id = ? AND user_id = ?
"#,
    )
    .bind(activity_id)
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(res.rows_affected())
}

/// Rolls `attended` back to `confirmed`; any other status is left alone.
pub async fn revert_attended<'e, E>(executor: E, activity_id: i64, user_id: i64) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(
        r#"
UPDATE signups
SET status = 'confirmed', updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
WHERE activity_id = ? AND user_id = ? AND status = 'attended'
"#,
    )
    .bind(activity_id)
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(res.rows_affected())
}

#[derive(Debug, Clone, Copy, Default, sqlx::FromRow)]
pub struct SignupCounts {
    pub held: i64,
    pub waitlisted: i64,
}

pub async fn count_signups(pool: &SqlitePool, activity_id: i64) -> sqlx::Result<SignupCounts> {
    sqlx::query_as::<_, SignupCounts>(
        r#"
SELECT
  COALESCE(SUM(CASE WHEN status IN ('requested', 'confirmed', 'attended') THEN 1 ELSE 0 END), 0) AS held,
  COALESCE(SUM(CASE WHEN status = 'waitlist' THEN 1 ELSE 0 END), 0) AS waitlisted
FROM signups
WHERE activity_id = ?
"#,
    )
    .bind(activity_id)
    .fetch_one(pool)
    .await
}

pub async fn list_signups_for_user(pool: &SqlitePool, user_id: i64) -> sqlx::Result<Vec<UserSignupRow>> {
    sqlx::query_as::<_, UserSignupRow>(
        r#"
SELECT
  s.id,
  s.activity_id,
  a.title AS activity_title,
  a.scheduled_at,
  s.status,
  s.joined_at
FROM signups s
JOIN activities a ON a.id = s.activity_id
WHERE s.user_id = ?
ORDER BY a.scheduled_at DESC, s.id DESC
"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn list_signups_for_activity(
    pool: &SqlitePool,
    activity_id: i64,
) -> sqlx::Result<Vec<ActivitySignupRow>> {
    sqlx::query_as::<_, ActivitySignupRow>(
        r#"
SELECT
  s.id,
  s.user_id,
  u.display_name,
  u.email,
  s.status,
  s.note,
  s.joined_at
FROM signups s
JOIN users u ON u.id = s.user_id
WHERE s.activity_id = ?
ORDER BY s.joined_at ASC, s.id ASC
"#,
    )
    .bind(activity_id)
    .fetch_all(pool)
    .await
}

pub async fn count_all_signups(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM signups")
        .fetch_one(pool)
        .await
}
