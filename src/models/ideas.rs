use serde::Serialize;

use super::Hours;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IdeaRow {
    pub id: i64,
    pub proposer_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub target_hours_tenths: i64,
    pub status: String,
    pub review_note: String,
    pub created_at: String,
    pub reviewed_at: Option<String>,
}

// Idea with its tally and the viewer's vote.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IdeaListRow {
    pub id: i64,
    pub proposer_name: Option<String>,
    pub title: String,
    pub description: String,
    pub target_hours_tenths: i64,
    pub status: String,
    pub created_at: String,
    pub vote_count: i64,
    pub voted_by_me: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct IdeaView {
    pub id: i64,
    pub proposer_name: Option<String>,
    pub title: String,
    pub description: String,
    pub target_hours: Hours,
    pub status: String,
    pub created_at: String,
    pub vote_count: i64,
    pub voted_by_me: bool,
}

impl From<IdeaListRow> for IdeaView {
    fn from(row: IdeaListRow) -> Self {
        IdeaView {
            id: row.id,
            proposer_name: row.proposer_name,
            title: row.title,
            description: row.description,
            target_hours: Hours::from_tenths(row.target_hours_tenths),
            status: row.status,
            created_at: row.created_at,
            vote_count: row.vote_count,
            voted_by_me: row.voted_by_me != 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdeaStatus {
    Pending,
    Approved,
    Rejected,
}

impl IdeaStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            IdeaStatus::Pending => "pending",
            IdeaStatus::Approved => "approved",
            IdeaStatus::Rejected => "rejected",
        }
    }
}
