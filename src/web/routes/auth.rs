use askama::Template;
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tracing::{error, info};

use crate::error::AppError;
use crate::services::user_service::{self, RegistrationForm};
use crate::state::AppState;
use crate::web::middleware::auth::{cleared_session_cookie, session_cookie};
use crate::web::{render, sanitize_local_path};

const AFTER_LOGIN: &str = "/activities";

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub next: String,
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
    #[serde(default)]
    next: String,
}

fn redirect_target(next: Option<&str>) -> String {
    next.and_then(sanitize_local_path)
        .unwrap_or(AFTER_LOGIN)
        .to_string()
}

pub async fn login_page(Query(query): Query<LoginQuery>) -> Response {
    render(&LoginTemplate {
        next: redirect_target(query.next.as_deref()),
        error: None,
    })
}

fn signed_in_redirect(state: &AppState, user_id: i64, target: &str) -> Response {
    let ttl = state.config.session_ttl_secs;
    let token = state.session_signer.issue(user_id, ttl);
    let mut response = Redirect::to(target).into_response();
    match session_cookie(token, ttl).to_string().parse() {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
            response
        }
        Err(e) => {
            error!(error = %e, "session cookie is not a valid header");
            AppError::Internal("session cookie".to_string()).into_response()
        }
    }
}

pub async fn login_handler(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let target = redirect_target(Some(&form.next));
    let user_id = user_service::authenticate(
        &state.pool,
        &form.email,
        &form.password,
        state.config.allowed_email_domain.as_deref(),
    )
    .await?;

    let Some(user_id) = user_id else {
        return Ok(render(&LoginTemplate {
            next: target,
            error: Some("Incorrect email or password.".to_string()),
        }));
    };

    info!(user_id, "login");
    Ok(signed_in_redirect(&state, user_id, &target))
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
    pub allowed_domain: Option<String>,
}

pub async fn register_page(State(state): State<AppState>) -> Response {
    render(&RegisterTemplate {
        error: None,
        allowed_domain: state.config.allowed_email_domain.clone(),
    })
}

pub async fn register_handler(
    State(state): State<AppState>,
    Form(form): Form<RegistrationForm>,
) -> Result<Response, AppError> {
    let allowed_domain = state.config.allowed_email_domain.clone();
    match user_service::register(&state.pool, &form, allowed_domain.as_deref()).await {
        Ok(user_id) => Ok(signed_in_redirect(&state, user_id, "/profile")),
        Err(AppError::BadRequest(message) | AppError::Conflict(message)) => {
            Ok(render(&RegisterTemplate {
                error: Some(message),
                allowed_domain,
            }))
        }
        Err(e) => Err(e),
    }
}

pub async fn logout_handler() -> Response {
    let mut response = Redirect::to("/login").into_response();
    if let Ok(value) = cleared_session_cookie().to_string().parse() {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}
