use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GroupRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing)]
    pub invite_code: String,
    pub created_by: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GroupListRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub member_count: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GroupMemberRow {
    pub user_id: i64,
    pub display_name: String,
    pub joined_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GroupPostRow {
    pub id: i64,
    pub author_id: Option<i64>,
    pub author_name: Option<String>,
    pub content: String,
    pub created_at: String,
}
