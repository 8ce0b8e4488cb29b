use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};

use crate::models::ActivityRow;

const ACTIVITY_COLUMNS: &str = r#"
  id,
  title,
  description,
  category,
  scheduled_at,
  location,
  capacity,
  hours_reward_tenths,
  status,
  created_by,
  created_at
"#;

const SQL_INSERT_ACTIVITY: &str = r#"
INSERT INTO activities (
  title,
  description,
  category,
  scheduled_at,
  location,
  capacity,
  hours_reward_tenths,
  created_by
) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
"#;

pub struct NewActivity<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub category: &'a str,
    pub scheduled_at: &'a str,
    pub location: &'a str,
    pub capacity: i64,
    pub hours_reward_tenths: i64,
    pub created_by: Option<i64>,
}

pub async fn insert_activity(pool: &SqlitePool, activity: NewActivity<'_>) -> sqlx::Result<i64> {
    let res = sqlx::query(SQL_INSERT_ACTIVITY)
        .bind(activity.title)
        .bind(activity.description)
        .bind(activity.category)
        .bind(activity.scheduled_at)
        .bind(activity.location)
        .bind(activity.capacity)
        .bind(activity.hours_reward_tenths)
        .bind(activity.created_by)
        .execute(pool)
        .await?;
    Ok(res.last_insert_rowid())
}

pub async fn load_activity<'e, E>(executor: E, activity_id: i64) -> sqlx::Result<Option<ActivityRow>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {} FROM activities WHERE id = ?", ACTIVITY_COLUMNS);
    sqlx::query_as::<_, ActivityRow>(&sql)
        .bind(activity_id)
        .fetch_optional(executor)
        .await
}

#[derive(Debug, Default, Clone)]
pub struct ActivityFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub location: Option<String>,
    pub min_hours_tenths: Option<i64>,
}

pub async fn list_activities(
    pool: &SqlitePool,
    filter: &ActivityFilter,
) -> sqlx::Result<Vec<ActivityRow>> {
    let mut qb: QueryBuilder<'_, Sqlite> =
        QueryBuilder::new(format!("SELECT {} FROM activities WHERE 1 = 1", ACTIVITY_COLUMNS));

    if let Some(q) = &filter.search {
        let pattern = format!("%{}%", q);
        qb.push(" AND (title LIKE ")
            .push_bind(pattern.clone())
            .push(" OR description LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category) = &filter.category {
        qb.push(" AND category = ").push_bind(category.clone());
    }
    if let Some(from) = &filter.date_from {
        qb.push(" AND substr(scheduled_at, 1, 10) >= ")
            .push_bind(from.clone());
    }
    if let Some(to) = &filter.date_to {
        qb.push(" AND substr(scheduled_at, 1, 10) <= ")
            .push_bind(to.clone());
    }
    if let Some(location) = &filter.location {
        qb.push(" AND location LIKE ")
            .push_bind(format!("%{}%", location));
    }
    if let Some(min) = filter.min_hours_tenths {
        qb.push(" AND hours_reward_tenths >= ").push_bind(min);
    }
    qb.push(" ORDER BY scheduled_at ASC, id ASC");

    qb.build_query_as::<ActivityRow>().fetch_all(pool).await
}

const SQL_UPDATE_ACTIVITY: &str = r#"
UPDATE activities
SET title = ?,
    description = ?,
    category = ?,
    scheduled_at = ?,
    location = ?,
    capacity = ?,
    hours_reward_tenths = ?
WHERE id = ?
"#;

pub async fn update_activity(
    pool: &SqlitePool,
    activity_id: i64,
    activity: NewActivity<'_>,
) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_UPDATE_ACTIVITY)
        .bind(activity.title)
        .bind(activity.description)
        .bind(activity.category)
        .bind(activity.scheduled_at)
        .bind(activity.location)
        .bind(activity.capacity)
        .bind(activity.hours_reward_tenths)
        .bind(activity_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn set_activity_status(
    pool: &SqlitePool,
    activity_id: i64,
    status: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query("UPDATE activities SET status = ? WHERE id = ?")
        .bind(status)
        .bind(activity_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete_activity(pool: &SqlitePool, activity_id: i64) -> sqlx::Result<u64> {
    let res = sqlx::query("DELETE FROM activities WHERE id = ?")
        .bind(activity_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn count_activities_by_status(pool: &SqlitePool) -> sqlx::Result<Vec<(String, i64)>> {
    sqlx::query_as::<_, (String, i64)>(
        "SELECT status, COUNT(*) FROM activities GROUP BY status ORDER BY status",
    )
    .fetch_all(pool)
    .await
}

pub async fn count_activities(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM activities")
        .fetch_one(pool)
        .await
}
