use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use cookie::{Cookie, SameSite};
use tracing::debug;

use crate::database::user_repo;
use crate::error::AppError;
use crate::services::capability_service::{self, Capability, CapabilitySet};
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "access_token";

#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub display_name: String,
    pub capabilities: CapabilitySet,
}

impl AuthenticatedUser {
    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities.has(capability)
    }

    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|hv| hv.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

pub fn session_cookie(value: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::seconds(max_age_secs))
        .build()
}

pub fn cleared_session_cookie() -> Cookie<'static> {
    let mut c = Cookie::new(SESSION_COOKIE, "");
    c.set_path("/");
    c.set_http_only(true);
    c.set_same_site(SameSite::Lax);
    c.make_removal();
    c
}

/// Resolves the session cookie to a user and attaches `AuthenticatedUser`
/// with its capabilities.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let user_id = session_token(request.headers()).and_then(|t| state.session_signer.verify(&t));

    if let Some(user_id) = user_id {
        let user = match user_repo::load_user(&state.pool, user_id).await {
            Ok(u) => u,
            Err(e) => return AppError::from(e).into_response(),
        };
        if let Some(user) = user {
            let capabilities =
                match capability_service::load_capabilities(&state.pool, user.id).await {
                    Ok(c) => c,
                    Err(e) => return AppError::from(e).into_response(),
                };
            request.extensions_mut().insert(AuthenticatedUser {
                id: user.id,
                display_name: user.display_name,
                capabilities,
            });
            return next.run(request).await;
        }
        debug!(user_id, "session for a deleted user");
    }

    unauthenticated(&request)
}

/// Gate for the whole admin console.
pub async fn require_admin_console(request: Request, next: Next) -> Response {
    let allowed = request
        .extensions()
        .get::<AuthenticatedUser>()
        .is_some_and(|u| u.can(Capability::ViewAdminConsole));
    if !allowed {
        return AppError::Forbidden.into_response();
    }
    next.run(request).await
}

fn wants_json(request: &Request) -> bool {
    let path = request.uri().path();
    if path.starts_with("/api/") || (path == "/qr/verify" && request.method() == Method::POST) {
        return true;
    }
    let accept = request
        .headers()
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    !accept.contains("text/html")
}

fn unauthenticated(request: &Request) -> Response {
    if wants_json(request) {
        return AppError::Unauthorized.into_response();
    }
    let next = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    Redirect::to(&format!("/login?next={}", encode_query_value(next))).into_response()
}

fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}
