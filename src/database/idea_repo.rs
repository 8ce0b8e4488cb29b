use sqlx::SqlitePool;

use crate::models::{IdeaListRow, IdeaRow};

pub async fn insert_idea(
    pool: &SqlitePool,
    proposer_id: i64,
    title: &str,
    description: &str,
    target_hours_tenths: i64,
) -> sqlx::Result<i64> {
    let res = sqlx::query(
        "INSERT INTO ideas (proposer_id, title, description, target_hours_tenths) VALUES (?, ?, ?, ?)",
    )
    .bind(proposer_id)
    .bind(title)
    .bind(description)
    .bind(target_hours_tenths)
    .execute(pool)
    .await?;
    Ok(res.last_insert_rowid())
}

pub async fn load_idea(pool: &SqlitePool, idea_id: i64) -> sqlx::Result<Option<IdeaRow>> {
    sqlx::query_as::<_, IdeaRow>(
        r#"
SELECT id, proposer_id, title, description, target_hours_tenths, status, review_note,
       created_at, reviewed_at
FROM ideas
WHERE id = ?
"#,
    )
    .bind(idea_id)
    .fetch_optional(pool)
    .await
}

const SQL_LIST_IDEAS: &str = r#"
SELECT
  i.id,
  u.display_name AS proposer_name,
  i.title,
  i.description,
  i.target_hours_tenths,
  i.status,
  i.created_at,
  (SELECT COUNT(*) FROM idea_votes v WHERE v.idea_id = i.id) AS vote_count,
  EXISTS (SELECT 1 FROM idea_votes v WHERE v.idea_id = i.id AND v.user_id = ?) AS voted_by_me
FROM ideas i
LEFT JOIN users u ON u.id = i.proposer_id
WHERE (? IS NULL OR i.status = ?)
ORDER BY i.created_at DESC, i.id DESC
"#;

pub async fn list_ideas(
    pool: &SqlitePool,
    viewer_id: i64,
    status: Option<&str>,
) -> sqlx::Result<Vec<IdeaListRow>> {
    sqlx::query_as::<_, IdeaListRow>(SQL_LIST_IDEAS)
        .bind(viewer_id)
        .bind(status)
        .bind(status)
        .fetch_all(pool)
        .await
}

/// Records a vote; returns 0 when the user already voted.
pub async fn insert_vote(pool: &SqlitePool, idea_id: i64, user_id: i64) -> sqlx::Result<u64> {
    let res = sqlx::query(
        "INSERT INTO idea_votes (idea_id, user_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
    )
    .bind(idea_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

/// Moves a pending idea to `status`; returns 0 if it was already reviewed.
pub async fn review_idea(
    pool: &SqlitePool,
    idea_id: i64,
    status: &str,
    note: &str,
) -> sqlx::Result<u64> {
    let res = sqlx::query(
        r#"
UPDATE ideas
SET status = ?, review_note = ?, reviewed_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
WHERE id = ? AND status = 'pending'
"#,
    )
    .bind(status)
    .bind(note)
    .bind(idea_id)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

pub async fn count_pending(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ideas WHERE status = 'pending'")
        .fetch_one(pool)
        .await
}
