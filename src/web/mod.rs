use std::net::SocketAddr;

use askama::Template;
use axum::{
    extract::{ConnectInfo, Request},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use tracing::error;

use crate::services::attendance_service::AttendanceAudit;

pub mod middleware;
pub mod router;
pub mod routes;

/// Renders an askama template, turning render failures into a logged 500.
pub fn render<T: Template>(template: &T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "template render failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Accepts only same-site absolute paths for post-login redirects.
pub fn sanitize_local_path(value: &str) -> Option<&str> {
    let v = value.trim();
    if !v.starts_with('/') {
        return None;
    }
    if v.starts_with("//") || v.contains("://") || v.contains('\\') {
        return None;
    }
    Some(v)
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Audit fields for an attendance record, taken from the request.
pub fn request_audit(request: &Request) -> AttendanceAudit {
    let headers = request.headers();
    let forwarded = header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|s| s.trim().to_string()))
        .filter(|v| !v.is_empty());
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    AttendanceAudit {
        ip_address: forwarded.or(peer),
        user_agent: header_str(headers, header::USER_AGENT.as_str()).unwrap_or_default(),
        device_id: header_str(headers, "x-device-id"),
        latitude: header_str(headers, "x-geo-lat").and_then(|v| v.parse().ok()),
        longitude: header_str(headers, "x-geo-lng").and_then(|v| v.parse().ok()),
    }
}
