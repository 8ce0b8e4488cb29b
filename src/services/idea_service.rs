use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::database::idea_repo;
use crate::error::AppError;
use crate::models::{Hours, IdeaStatus, IdeaView, NotificationCategory};
use crate::services::notification_service::{Notice, Notifier};

#[derive(Debug, Clone, Deserialize)]
pub struct IdeaForm {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub target_hours: String,
}

pub async fn list_ideas(
    pool: &SqlitePool,
    viewer_id: i64,
    status: Option<&str>,
) -> Result<Vec<IdeaView>, AppError> {
    let rows = idea_repo::list_ideas(pool, viewer_id, status).await?;
    Ok(rows.into_iter().map(IdeaView::from).collect())
}

pub async fn propose(pool: &SqlitePool, proposer_id: i64, form: &IdeaForm) -> Result<i64, AppError> {
    let title = form.title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("title is required".to_string()));
    }
    let target = match form.target_hours.trim() {
        "" => Hours::ZERO,
        raw => Hours::parse(raw).ok_or_else(|| {
            AppError::BadRequest("target_hours must be a number with one decimal".to_string())
        })?,
    };
    let id = idea_repo::insert_idea(
        pool,
        proposer_id,
        title,
        form.description.trim(),
        target.tenths(),
    )
    .await?;
    info!(idea_id = id, proposer_id, "idea proposed");
    Ok(id)
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub ok: bool,
    pub message: &'static str,
}

/// One vote per user per idea; a repeat vote is reported, not an error.
pub async fn vote(pool: &SqlitePool, idea_id: i64, user_id: i64) -> Result<VoteResponse, AppError> {
    let idea = idea_repo::load_idea(pool, idea_id)
        .await?
        .ok_or(AppError::NotFound("idea"))?;
    if idea.status != IdeaStatus::Pending.as_str() {
        return Err(AppError::Conflict("voting is closed for this idea".to_string()));
    }
    if idea_repo::insert_vote(pool, idea_id, user_id).await? == 0 {
        return Ok(VoteResponse {
            ok: false,
            message: "already voted",
        });
    }
    Ok(VoteResponse {
        ok: true,
        message: "vote recorded",
    })
}

/// Approves or rejects a pending idea and tells the proposer.
pub async fn review(
    pool: &SqlitePool,
    notifier: &dyn Notifier,
    idea_id: i64,
    decision: IdeaStatus,
    note: &str,
) -> Result<(), AppError> {
    if decision == IdeaStatus::Pending {
        return Err(AppError::BadRequest("a review must approve or reject".to_string()));
    }
    let idea = idea_repo::load_idea(pool, idea_id)
        .await?
        .ok_or(AppError::NotFound("idea"))?;
    let note = note.trim();
    if idea_repo::review_idea(pool, idea_id, decision.as_str(), note).await? == 0 {
        return Err(AppError::Conflict("this idea has already been reviewed".to_string()));
    }
    info!(idea_id, decision = decision.as_str(), "idea reviewed");

    if let Some(proposer) = idea.proposer_id {
        let mut message = format!("Your idea \"{}\" was {}.", idea.title, decision.as_str());
        if !note.is_empty() {
            message.push_str(&format!(" Note: {}", note));
        }
        notifier.notify(
            Notice::new(proposer, NotificationCategory::Idea, "Idea reviewed", message)
                .with_target("/api/ideas"),
        );
    }
    Ok(())
}
