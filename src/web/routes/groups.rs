use axum::{
    extract::{Path, Query, State},
    Extension, Form, Json,
};
use serde::{Deserialize, Serialize};

use crate::database::group_repo;
use crate::error::AppError;
use crate::models::GroupListRow;
use crate::services::group_service::{self, CreatedGroup, GroupDetail, GroupForm};
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedUser;

pub async fn list_groups_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<GroupListRow>>, AppError> {
    Ok(Json(group_repo::list_groups(&state.pool).await?))
}

pub async fn create_group_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Form(form): Form<GroupForm>,
) -> Result<Json<CreatedGroup>, AppError> {
    Ok(Json(
        group_service::create_group(&state.pool, auth_user.id, &form).await?,
    ))
}

pub async fn group_detail_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
) -> Result<Json<GroupDetail>, AppError> {
    Ok(Json(
        group_service::load_detail(&state.pool, group_id, auth_user.id).await?,
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct JoinQuery {
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

pub async fn join_group_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
    Query(query): Query<JoinQuery>,
) -> Result<Json<OkResponse>, AppError> {
    group_service::join(&state.pool, group_id, auth_user.id, &query.code).await?;
    Ok(Json(OkResponse { ok: true }))
}

#[derive(Debug, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedPost {
    pub id: i64,
}

pub async fn create_post_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
    Form(form): Form<PostForm>,
) -> Result<Json<CreatedPost>, AppError> {
    let id = group_service::post(&state.pool, group_id, auth_user.id, &form.content).await?;
    Ok(Json(CreatedPost { id }))
}
