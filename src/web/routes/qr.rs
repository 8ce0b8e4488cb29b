use askama::Template;
use axum::{
    body::to_bytes,
    extract::{FromRequest, Path, Request, State},
    http::header,
    response::{IntoResponse, Response},
    Extension, Form, Json,
};
use serde::Deserialize;

use crate::services::attendance_service::{self, AttendanceOutcome};
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedUser;
use crate::web::{render, request_audit};

const MAX_TOKEN_BODY_BYTES: usize = 4 * 1024;

#[derive(Template)]
#[template(path = "qr_scan.html")]
pub struct QrScanTemplate {
    pub display_name: String,
}

pub async fn qr_scan_page(Extension(auth_user): Extension<AuthenticatedUser>) -> Response {
    render(&QrScanTemplate {
        display_name: auth_user.display_name,
    })
}

#[derive(Debug, Default, Deserialize)]
struct VerifyForm {
    token: Option<String>,
    qr_token: Option<String>,
}

impl VerifyForm {
    fn into_token(self) -> Option<String> {
        self.token
            .filter(|t| !t.trim().is_empty())
            .or(self.qr_token)
    }
}

/// Scanners may hand over the whole confirm URL; keep its last path segment.
fn normalise_token(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let raw = raw.split(['?', '#']).next().unwrap_or(raw);
    let token = raw.rsplit('/').find(|s| !s.is_empty()).unwrap_or("");
    (!token.is_empty()).then(|| token.to_string())
}

async fn submitted_token(request: Request, state: &AppState) -> Option<String> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    let raw = if content_type.starts_with("application/x-www-form-urlencoded") {
        Form::<VerifyForm>::from_request(request, state)
            .await
            .ok()
            .and_then(|Form(f)| f.into_token())
    } else if content_type.starts_with("application/json") {
        Json::<VerifyForm>::from_request(request, state)
            .await
            .ok()
            .and_then(|Json(f)| f.into_token())
    } else {
        let bytes = to_bytes(request.into_body(), MAX_TOKEN_BODY_BYTES).await.ok()?;
        String::from_utf8(bytes.to_vec()).ok()
    }?;
    normalise_token(&raw)
}

/// `POST /qr/verify`: JSON outcome of a scan.
pub async fn qr_verify_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    request: Request,
) -> Response {
    let audit = request_audit(&request);
    let outcome = match submitted_token(request, &state).await {
        Some(token) => {
            attendance_service::confirm_with_token(
                &state.pool,
                &state.qr_signer,
                state.notifier.as_ref(),
                auth_user.id,
                &token,
                &audit,
            )
            .await
        }
        None => AttendanceOutcome::InvalidToken,
    };
    (outcome.status(), Json(outcome.to_body())).into_response()
}

#[derive(Template)]
#[template(path = "qr_result.html")]
pub struct QrResultTemplate {
    pub ok: bool,
    pub code: &'static str,
    pub message: String,
    pub activity_id: Option<i64>,
    pub activity_title: Option<String>,
}

/// `GET /qr/confirm/:token`: the link encoded in the QR image.
pub async fn qr_confirm_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Path(token): Path<String>,
    request: Request,
) -> Response {
    let audit = request_audit(&request);
    let outcome = attendance_service::confirm_with_token(
        &state.pool,
        &state.qr_signer,
        state.notifier.as_ref(),
        auth_user.id,
        &token,
        &audit,
    )
    .await;

    let template = QrResultTemplate {
        ok: outcome.is_recorded(),
        code: outcome.code(),
        message: outcome.message(),
        activity_id: outcome.activity().map(|a| a.id),
        activity_title: outcome.activity().map(|a| a.title.clone()),
    };
    (outcome.status(), render(&template)).into_response()
}
