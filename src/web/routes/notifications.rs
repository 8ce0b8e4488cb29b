use axum::{
    extract::{Path, State},
    Extension, Form, Json,
};
use serde::{Deserialize, Serialize};

use crate::database::notification_repo;
use crate::error::AppError;
use crate::models::NotificationPreferenceRow;
use crate::services::notification_service::{self, NotificationInbox};
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedUser;

pub async fn list_notifications_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
) -> Result<Json<NotificationInbox>, AppError> {
    Ok(Json(
        notification_service::load_inbox(&state.pool, auth_user.id).await?,
    ))
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

pub async fn mark_read_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Path(notification_id): Path<i64>,
) -> Result<Json<MarkedRead>, AppError> {
    let updated = notification_repo::mark_read(&state.pool, auth_user.id, notification_id).await?;
    Ok(Json(MarkedRead { updated }))
}

pub async fn mark_all_read_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
) -> Result<Json<MarkedRead>, AppError> {
    let updated = notification_repo::mark_all_read(&state.pool, auth_user.id).await?;
    Ok(Json(MarkedRead { updated }))
}

pub async fn preferences_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
) -> Result<Json<NotificationPreferenceRow>, AppError> {
    Ok(Json(
        notification_repo::load_preferences(&state.pool, auth_user.id).await?,
    ))
}

// HTML checkboxes are only sent when ticked.
#[derive(Debug, Default, Deserialize)]
pub struct PreferencesForm {
    pub in_app_enabled: Option<String>,
    pub email_enabled: Option<String>,
    pub idea_updates: Option<String>,
    pub activity_reminders: Option<String>,
    pub hours_updates: Option<String>,
}

fn checked(v: &Option<String>) -> bool {
    matches!(
        v.as_deref().map(str::trim),
        Some("on" | "true" | "1" | "yes")
    )
}

impl From<PreferencesForm> for NotificationPreferenceRow {
    fn from(form: PreferencesForm) -> Self {
        NotificationPreferenceRow {
            in_app_enabled: checked(&form.in_app_enabled),
            email_enabled: checked(&form.email_enabled),
            idea_updates: checked(&form.idea_updates),
            activity_reminders: checked(&form.activity_reminders),
            hours_updates: checked(&form.hours_updates),
        }
    }
}

pub async fn update_preferences_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Form(form): Form<PreferencesForm>,
) -> Result<Json<NotificationPreferenceRow>, AppError> {
    let prefs = NotificationPreferenceRow::from(form);
    notification_repo::upsert_preferences(&state.pool, auth_user.id, &prefs).await?;
    Ok(Json(prefs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unticked_boxes_are_false() {
        let prefs = NotificationPreferenceRow::from(PreferencesForm {
            in_app_enabled: Some("on".to_string()),
            hours_updates: Some("true".to_string()),
            ..PreferencesForm::default()
        });
        assert!(prefs.in_app_enabled);
        assert!(prefs.hours_updates);
        assert!(!prefs.email_enabled);
        assert!(!prefs.idea_updates);
        assert!(!prefs.activity_reminders);
    }
}
