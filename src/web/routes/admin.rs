//! Admin console. Every handler re-checks its own capability; the router
//! only guarantees console access.

use askama::Template;
use axum::{
    extract::{FromRequest, Path, Query, Request, State},
    response::{IntoResponse, Response},
    Extension, Form, Json,
};
use serde::{Deserialize, Serialize};

use crate::database::{signup_repo, user_repo};
use crate::error::AppError;
use crate::models::{ActivitySignupRow, IdeaStatus, IdeaView, UserView};
use crate::services::activities_service::{self, ActivityForm};
use crate::services::admin_service::{self, DashboardStats, UserHours};
use crate::services::attendance_service;
use crate::services::capability_service::Capability;
use crate::services::idea_service;
use crate::services::signup_service;
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::{render, request_audit};

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

fn ok() -> Json<OkResponse> {
    Json(OkResponse { ok: true })
}

#[derive(Template)]
#[template(path = "admin_dashboard.html")]
pub struct AdminDashboardTemplate {
    pub stats: DashboardStats,
    pub display_name: String,
    pub can_manage_users: bool,
    pub can_review_ideas: bool,
}

pub async fn dashboard_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let stats = admin_service::load_dashboard(&state.pool).await?;
    Ok(render(&AdminDashboardTemplate {
        stats,
        can_manage_users: auth_user.can(Capability::ManageUsers),
        can_review_ideas: auth_user.can(Capability::ReviewIdeas),
        display_name: auth_user.display_name,
    }))
}

// Activities

pub async fn edit_activity_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Path(activity_id): Path<i64>,
    Form(form): Form<ActivityForm>,
) -> Result<Json<OkResponse>, AppError> {
    auth_user.require(Capability::ManageActivities)?;
    activities_service::update_activity(&state.pool, activity_id, &form).await?;
    Ok(ok())
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub ok: bool,
    pub status: &'static str,
}

pub async fn activity_status_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Path(activity_id): Path<i64>,
    Form(form): Form<StatusForm>,
) -> Result<Json<StatusResponse>, AppError> {
    auth_user.require(Capability::ManageActivities)?;
    let status = activities_service::set_activity_status(&state.pool, activity_id, &form.status).await?;
    Ok(Json(StatusResponse {
        ok: true,
        status: status.as_str(),
    }))
}

pub async fn delete_activity_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Path(activity_id): Path<i64>,
) -> Result<Json<OkResponse>, AppError> {
    auth_user.require(Capability::ManageActivities)?;
    activities_service::delete_activity(&state.pool, activity_id).await?;
    Ok(ok())
}

// Signups

pub async fn activity_signups_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Path(activity_id): Path<i64>,
) -> Result<Json<Vec<ActivitySignupRow>>, AppError> {
    auth_user.require(Capability::ManageAttendance)?;
    Ok(Json(
        signup_repo::list_signups_for_activity(&state.pool, activity_id).await?,
    ))
}

pub async fn signup_status_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Path(signup_id): Path<i64>,
    Form(form): Form<StatusForm>,
) -> Result<Json<OkResponse>, AppError> {
    auth_user.require(Capability::ManageAttendance)?;
    let status = signup_service::parse_admin_status(&form.status)
        .ok_or_else(|| AppError::BadRequest(format!("unsupported status: {}", form.status)))?;
    signup_service::set_status(&state.pool, state.notifier.as_ref(), signup_id, status).await?;
    Ok(ok())
}

// Users

#[derive(Debug, Default, Deserialize)]
pub struct UserSearchQuery {
    pub q: Option<String>,
}

pub async fn list_users_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Query(query): Query<UserSearchQuery>,
) -> Result<Json<Vec<UserView>>, AppError> {
    auth_user.require(Capability::ManageUsers)?;
    let search = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let users = user_repo::list_users(&state.pool, search).await?;
    Ok(Json(users.into_iter().map(UserView::from).collect()))
}

pub async fn user_hours_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserHours>, AppError> {
    auth_user.require(Capability::ManageUsers)?;
    Ok(Json(admin_service::load_user_hours(&state.pool, user_id).await?))
}

pub async fn delete_user_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<OkResponse>, AppError> {
    auth_user.require(Capability::ManageUsers)?;
    admin_service::delete_user(&state.pool, auth_user.id, user_id).await?;
    Ok(ok())
}

/// `roles` is a comma-separated list of role codes.
#[derive(Debug, Default, Deserialize)]
pub struct RolesForm {
    #[serde(default)]
    pub roles: String,
}

#[derive(Debug, Serialize)]
pub struct RolesResponse {
    pub ok: bool,
    pub roles: Vec<String>,
}

pub async fn set_roles_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Form(form): Form<RolesForm>,
) -> Result<Json<RolesResponse>, AppError> {
    auth_user.require(Capability::ManageRoles)?;
    let requested: Vec<String> = form.roles.split(',').map(|s| s.trim().to_string()).collect();
    let roles = admin_service::set_roles(&state.pool, user_id, &requested).await?;
    Ok(Json(RolesResponse { ok: true, roles }))
}

// Attendance

#[derive(Debug, Deserialize)]
pub struct GrantForm {
    pub user_id: i64,
    pub activity_id: i64,
}

pub async fn grant_attendance_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, AppError> {
    auth_user.require(Capability::ManageAttendance)?;
    let audit = request_audit(&request);
    let Form(form) = Form::<GrantForm>::from_request(request, &state)
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?;

    let outcome = attendance_service::grant_staff_assisted(
        &state.pool,
        state.notifier.as_ref(),
        auth_user.id,
        form.activity_id,
        form.user_id,
        &audit,
    )
    .await;
    Ok((outcome.status(), Json(outcome.to_body())).into_response())
}

#[derive(Debug, Serialize)]
pub struct RevokedResponse {
    pub ok: bool,
    pub activity_id: i64,
    pub user_id: i64,
}

pub async fn delete_attendance_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Path(record_id): Path<i64>,
) -> Result<Json<RevokedResponse>, AppError> {
    auth_user.require(Capability::ManageAttendance)?;
    let (activity_id, user_id) = attendance_service::revoke_attendance(&state.pool, record_id).await?;
    Ok(Json(RevokedResponse {
        ok: true,
        activity_id,
        user_id,
    }))
}

// Ideas

#[derive(Debug, Default, Deserialize)]
pub struct IdeaFilterQuery {
    pub status: Option<String>,
}

pub async fn list_ideas_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Query(query): Query<IdeaFilterQuery>,
) -> Result<Json<Vec<IdeaView>>, AppError> {
    auth_user.require(Capability::ReviewIdeas)?;
    let status = query.status.as_deref().filter(|s| !s.is_empty());
    Ok(Json(
        idea_service::list_ideas(&state.pool, auth_user.id, status).await?,
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub note: String,
}

async fn review(
    auth_user: &AuthenticatedUser,
    state: &AppState,
    idea_id: i64,
    decision: IdeaStatus,
    note: &str,
) -> Result<Json<OkResponse>, AppError> {
    auth_user.require(Capability::ReviewIdeas)?;
    idea_service::review(&state.pool, state.notifier.as_ref(), idea_id, decision, note).await?;
    Ok(ok())
}

pub async fn approve_idea_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Path(idea_id): Path<i64>,
    Form(form): Form<ReviewForm>,
) -> Result<Json<OkResponse>, AppError> {
    review(&auth_user, &state, idea_id, IdeaStatus::Approved, &form.note).await
}

pub async fn reject_idea_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Path(idea_id): Path<i64>,
    Form(form): Form<ReviewForm>,
) -> Result<Json<OkResponse>, AppError> {
    review(&auth_user, &state, idea_id, IdeaStatus::Rejected, &form.note).await
}
