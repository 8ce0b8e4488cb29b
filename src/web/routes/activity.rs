use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form, Json,
};
use serde::{Deserialize, Serialize};

use crate::database::activity_repo;
use crate::error::AppError;
use crate::services::activities_service::{self, ActivityDetailView};
use crate::services::capability_service::Capability;
use crate::services::signup_service;
use crate::services::token_service::clamp_qr_ttl;
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::render;

#[derive(Template)]
#[template(path = "activity.html")]
pub struct ActivityDetailTemplate {
    pub detail: ActivityDetailView,
    pub notice: Option<&'static str>,
}

fn notice_text(code: &str) -> Option<&'static str> {
    let text = match code {
        "signup_ok" => "You are signed up.",
        "waitlisted" => "This activity is full. You are on the waitlist.",
        "already_signed_up" => "You are already signed up.",
        "activity_closed" => "This activity no longer takes signups.",
        "cancelled" => "Your signup was cancelled.",
        "created" => "Activity created.",
        _ => return None,
    };
    Some(text)
}

#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

pub async fn activity_detail_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(activity_id): Path<i64>,
    Query(query): Query<NoticeQuery>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let detail = activities_service::load_activity_detail(
        &state.pool,
        activity_id,
        auth_user.id,
        auth_user.can(Capability::ManageAttendance),
    )
    .await?;
    Ok(render(&ActivityDetailTemplate {
        detail,
        notice: query.notice.as_deref().and_then(notice_text),
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub note: String,
}

pub async fn activity_signup_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(activity_id): Path<i64>,
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    let outcome = signup_service::sign_up(
        &state.pool,
        state.notifier.as_ref(),
        activity_id,
        auth_user.id,
        &form.note,
    )
    .await?;
    Ok(Redirect::to(&format!(
        "/activities/{}?notice={}",
        activity_id,
        outcome.notice()
    ))
    .into_response())
}

pub async fn cancel_signup_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(activity_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    signup_service::cancel_signup(&state.pool, state.notifier.as_ref(), activity_id, auth_user.id)
        .await?;
    Ok(Redirect::to(&format!("/activities/{}?notice=cancelled", activity_id)).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct QrTokenQuery {
    pub expires_in: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct QrTokenResponse {
    pub token: String,
    pub confirm_url: String,
    pub expires_at: i64,
}

/// Issues a fresh attendance token for staff to display as a QR code.
pub async fn qr_token_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(activity_id): Path<i64>,
    Query(query): Query<QrTokenQuery>,
    State(state): State<AppState>,
) -> Result<Json<QrTokenResponse>, AppError> {
    auth_user.require(Capability::ManageAttendance)?;
    let activity = activity_repo::load_activity(&state.pool, activity_id)
        .await?
        .ok_or(AppError::NotFound("activity"))?;
    if activity.is_cancelled() {
        return Err(AppError::Conflict("activity is cancelled".to_string()));
    }

    let ttl = clamp_qr_ttl(query.expires_in, state.config.qr_token_ttl_secs);
    let token = state
        .qr_signer
        .issue_for_activity(Some(activity.id), ttl)
        .ok_or_else(|| AppError::Internal("token issuance".to_string()))?;
    let expires_at = state
        .qr_signer
        .expires_at(&token)
        .ok_or_else(|| AppError::Internal("token issuance".to_string()))?;

    Ok(Json(QrTokenResponse {
        confirm_url: format!("{}/qr/confirm/{}", state.config.public_base_url, token),
        token,
        expires_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_notices_have_text() {
        assert_eq!(
            notice_text("waitlisted"),
            Some("This activity is full. You are on the waitlist.")
        );
        assert!(notice_text("signup_ok").is_some());
        assert!(notice_text("<script>").is_none());
    }
}
