use sqlx::{Executor, Sqlite, SqlitePool};

use crate::models::{AttendanceRecordRow, UserAttendanceRow};

const SQL_INSERT_ATTENDANCE_IF_ABSENT: &str = r#"
INSERT INTO attendance_records (
  activity_id,
  user_id,
  ip_address,
  user_agent,
  device_id,
  latitude,
  longitude,
  staff_assisted,
  granted_by
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
ON CONFLICT (activity_id, user_id) DO NOTHING
"#;

pub struct NewAttendanceRecord<'a> {
    pub activity_id: i64,
    pub user_id: i64,
    pub ip_address: Option<&'a str>,
    pub user_agent: &'a str,
    pub device_id: Option<&'a str>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub staff_assisted: bool,
    pub granted_by: Option<i64>,
}

/// Create-if-absent keyed by (activity, user). Returns 0 when a record for the
/// pair already exists.
pub async fn insert_if_absent<'e, E>(executor: E, record: NewAttendanceRecord<'_>) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(SQL_INSERT_ATTENDANCE_IF_ABSENT)
        .bind(record.activity_id)
        .bind(record.user_id)
        .bind(record.ip_address)
        .bind(record.user_agent)
        .bind(record.device_id)
        .bind(record.latitude)
        .bind(record.longitude)
        .bind(record.staff_assisted)
        .bind(record.granted_by)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

pub async fn exists_for_pair<'e, E>(executor: E, activity_id: i64, user_id: i64) -> sqlx::Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM attendance_records WHERE activity_id = ? AND user_id = ?",
    )
    .bind(activity_id)
    .bind(user_id)
    .fetch_one(executor)
    .await
    .map(|n| n > 0)
}

pub async fn load_for_pair(
    pool: &SqlitePool,
    activity_id: i64,
    user_id: i64,
) -> sqlx::Result<Option<AttendanceRecordRow>> {
    sqlx::query_as::<_, AttendanceRecordRow>(
        r#"
SELECT id, activity_id, user_id, scanned_at, ip_address, user_agent, device_id,
       latitude, longitude, staff_assisted, granted_by
FROM attendance_records
WHERE activity_id = ? AND user_id = ?
"#,
    )
    .bind(activity_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Deletes a record and returns the (activity, user) pair it belonged to.
pub async fn delete_returning_pair<'e, E>(executor: E, record_id: i64) -> sqlx::Result<Option<(i64, i64)>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, (i64, i64)>(
        "DELETE FROM attendance_records WHERE id = ? RETURNING activity_id, user_id",
    )
    .bind(record_id)
    .fetch_optional(executor)
    .await
}

pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> sqlx::Result<Vec<UserAttendanceRow>> {
    sqlx::query_as::<_, UserAttendanceRow>(
        r#"
SELECT
  r.id,
  r.activity_id,
  a.title AS activity_title,
  a.hours_reward_tenths,
  r.scanned_at,
  r.staff_assisted
FROM attendance_records r
JOIN activities a ON a.id = r.activity_id
WHERE r.user_id = ?
ORDER BY r.scanned_at DESC, r.id DESC
"#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn count_records(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM attendance_records")
        .fetch_one(pool)
        .await
}

pub async fn total_hours_tenths(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
SELECT COALESCE(SUM(a.hours_reward_tenths), 0)
FROM attendance_records r
JOIN activities a ON a.id = r.activity_id
"#,
    )
    .fetch_one(pool)
    .await
}
