use serde::Serialize;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub title: String,
    pub student_id: String,
    pub faculty: String,
    pub department: String,
    pub year: Option<i64>,
    pub created_at: String,
}

/// User fields that are safe to hand out.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub title: String,
    pub student_id: String,
    pub faculty: String,
    pub department: String,
    pub year: Option<i64>,
    pub created_at: String,
}

impl From<UserRow> for UserView {
    fn from(row: UserRow) -> Self {
        UserView {
            id: row.id,
            email: row.email,
            display_name: row.display_name,
            title: row.title,
            student_id: row.student_id,
            faculty: row.faculty,
            department: row.department,
            year: row.year,
            created_at: row.created_at,
        }
    }
}
