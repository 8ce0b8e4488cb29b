use sqlx::{Executor, Sqlite, SqlitePool};

use crate::models::{GroupListRow, GroupMemberRow, GroupPostRow, GroupRow};

pub async fn insert_group<'e, E>(
    executor: E,
    name: &str,
    description: &str,
    invite_code: &str,
    created_by: i64,
) -> sqlx::Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(
        "INSERT INTO volunteer_groups (name, description, invite_code, created_by) VALUES (?, ?, ?, ?)",
    )
    .bind(name)
    .bind(description)
    .bind(invite_code)
    .bind(created_by)
    .execute(executor)
    .await?;
    Ok(res.last_insert_rowid())
}

pub async fn load_group(pool: &SqlitePool, group_id: i64) -> sqlx::Result<Option<GroupRow>> {
    sqlx::query_as::<_, GroupRow>(
        "SELECT id, name, description, invite_code, created_by, created_at FROM volunteer_groups WHERE id = ?",
    )
    .bind(group_id)
    .fetch_optional(pool)
    .await
}

pub async fn list_groups(pool: &SqlitePool) -> sqlx::Result<Vec<GroupListRow>> {
    sqlx::query_as::<_, GroupListRow>(
        r#"
SELECT
  g.id,
  g.name,
  g.description,
  (SELECT COUNT(*) FROM group_memberships m WHERE m.group_id = g.id) AS member_count,
  g.created_at
FROM volunteer_groups g
ORDER BY g.created_at DESC, g.id DESC
"#,
    )
    .fetch_all(pool)
    .await
}

pub async fn add_member<'e, E>(executor: E, group_id: i64, user_id: i64) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(
        "INSERT INTO group_memberships (group_id, user_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
    )
    .bind(group_id)
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(res.rows_affected())
}

pub async fn is_member(pool: &SqlitePool, group_id: i64, user_id: i64) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM group_memberships WHERE group_id = ? AND user_id = ?",
    )
    .bind(group_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .map(|n| n > 0)
}

pub async fn list_members(pool: &SqlitePool, group_id: i64) -> sqlx::Result<Vec<GroupMemberRow>> {
    sqlx::query_as::<_, GroupMemberRow>(
        r#"
SELECT m.user_id, u.display_name, m.joined_at
FROM group_memberships m
JOIN users u ON u.id = m.user_id
WHERE m.group_id = ?
ORDER BY m.joined_at ASC, m.user_id ASC
"#,
    )
    .bind(group_id)
    .fetch_all(pool)
    .await
}

pub async fn insert_post(
    pool: &SqlitePool,
    group_id: i64,
    author_id: i64,
    content: &str,
) -> sqlx::Result<i64> {
    let res = sqlx::query("INSERT INTO group_posts (group_id, author_id, content) VALUES (?, ?, ?)")
        .bind(group_id)
        .bind(author_id)
        .bind(content)
        .execute(pool)
        .await?;
    Ok(res.last_insert_rowid())
}

pub async fn list_posts(pool: &SqlitePool, group_id: i64) -> sqlx::Result<Vec<GroupPostRow>> {
    sqlx::query_as::<_, GroupPostRow>(
        r#"
SELECT p.id, p.author_id, u.display_name AS author_name, p.content, p.created_at
FROM group_posts p
LEFT JOIN users u ON u.id = p.author_id
WHERE p.group_id = ?
ORDER BY p.created_at DESC, p.id DESC
"#,
    )
    .bind(group_id)
    .fetch_all(pool)
    .await
}
