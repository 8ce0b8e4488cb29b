use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub build_id: &'static str,
    pub database: bool,
}

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<Health>) {
    let database = match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, "health check could not reach the database");
            false
        }
    };
    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(Health {
            status: if database { "ok" } else { "degraded" },
            build_id: env!("VOLUNTEER_PORTAL_BUILD_ID"),
            database,
        }),
    )
}
