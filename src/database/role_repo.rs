use sqlx::{Executor, Sqlite, SqlitePool};

pub async fn list_role_codes<'e, E>(executor: E, user_id: i64) -> sqlx::Result<Vec<String>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, String>(
        r#"
SELECT r.code
FROM user_roles ur
JOIN roles r ON r.code = ur.role_code
WHERE ur.user_id = ?
ORDER BY r.display_order ASC
"#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

pub async fn assign_role<'e, E>(executor: E, user_id: i64, role_code: &str) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(
        "INSERT INTO user_roles (user_id, role_code) VALUES (?, ?) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(role_code)
    .execute(executor)
    .await?;
    Ok(res.rows_affected())
}

pub async fn clear_roles<'e, E>(executor: E, user_id: i64) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query("DELETE FROM user_roles WHERE user_id = ?")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

pub async fn list_known_role_codes(pool: &SqlitePool) -> sqlx::Result<Vec<String>> {
    sqlx::query_scalar::<_, String>("SELECT code FROM roles ORDER BY display_order ASC")
        .fetch_all(pool)
        .await
}
