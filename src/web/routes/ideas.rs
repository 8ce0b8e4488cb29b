use axum::{
    extract::{Path, Query, State},
    Extension, Form, Json,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::IdeaView;
use crate::services::idea_service::{self, IdeaForm, VoteResponse};
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedUser;

#[derive(Debug, Default, Deserialize)]
pub struct IdeaListQuery {
    pub status: Option<String>,
}

pub async fn list_ideas_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Query(query): Query<IdeaListQuery>,
) -> Result<Json<Vec<IdeaView>>, AppError> {
    let status = query.status.as_deref().filter(|s| !s.is_empty());
    Ok(Json(
        idea_service::list_ideas(&state.pool, auth_user.id, status).await?,
    ))
}

#[derive(Debug, Serialize)]
pub struct CreatedIdea {
    pub id: i64,
}

pub async fn propose_idea_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Form(form): Form<IdeaForm>,
) -> Result<Json<CreatedIdea>, AppError> {
    let id = idea_service::propose(&state.pool, auth_user.id, &form).await?;
    Ok(Json(CreatedIdea { id }))
}

pub async fn vote_idea_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Path(idea_id): Path<i64>,
) -> Result<Json<VoteResponse>, AppError> {
    Ok(Json(
        idea_service::vote(&state.pool, idea_id, auth_user.id).await?,
    ))
}
