use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form, Json,
};

use crate::error::AppError;
use crate::services::capability_service::Capability;
use crate::services::user_service::{self, ProfileForm, ProfileView};
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::render;
use crate::web::routes::activity::NoticeQuery;

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub profile: ProfileView,
    pub notice: Option<String>,
    pub can_admin: bool,
}

pub async fn profile_page(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Query(query): Query<NoticeQuery>,
) -> Result<Response, AppError> {
    let profile = user_service::load_profile(&state.pool, auth_user.id).await?;
    Ok(render(&ProfileTemplate {
        profile,
        notice: query.notice,
        can_admin: auth_user.can(Capability::ViewAdminConsole),
    }))
}

pub async fn profile_api(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
) -> Result<Json<ProfileView>, AppError> {
    Ok(Json(user_service::load_profile(&state.pool, auth_user.id).await?))
}

pub async fn update_profile_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Form(form): Form<ProfileForm>,
) -> Result<Response, AppError> {
    user_service::update_profile(&state.pool, auth_user.id, &form).await?;
    Ok(Redirect::to("/profile?notice=saved").into_response())
}
