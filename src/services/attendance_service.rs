//! QR attendance confirmation: one record per (activity, user), created at
//! most once no matter how many times or how concurrently a token is used.

use axum::http::StatusCode;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{error, info};

use crate::database::{activity_repo, attendance_repo, signup_repo};
use crate::error::AppError;
use crate::models::{ActivitySummary, Hours, NotificationCategory};
use crate::services::notification_service::{Notice, Notifier};
use crate::services::token_service::TokenSigner;

#[derive(Debug, Clone, PartialEq)]
pub enum AttendanceOutcome {
    Recorded {
        activity: ActivitySummary,
        hours: Hours,
    },
    AlreadyRecorded {
        activity: ActivitySummary,
    },
    NotSignedUp {
        activity: ActivitySummary,
    },
    ActivityCancelled {
        activity: ActivitySummary,
    },
    ActivityNotFound,
    InvalidToken,
    StorageError,
}

impl AttendanceOutcome {
    pub fn code(&self) -> &'static str {
        match self {
            AttendanceOutcome::Recorded { .. } => "recorded",
            AttendanceOutcome::AlreadyRecorded { .. } => "already_recorded",
            AttendanceOutcome::NotSignedUp { .. } => "not_signed_up",
            AttendanceOutcome::ActivityCancelled { .. } => "activity_cancelled",
            AttendanceOutcome::ActivityNotFound => "activity_not_found",
            AttendanceOutcome::InvalidToken => "invalid_token",
            AttendanceOutcome::StorageError => "storage_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AttendanceOutcome::Recorded { .. } => StatusCode::OK,
            AttendanceOutcome::AlreadyRecorded { .. } => StatusCode::CONFLICT,
            AttendanceOutcome::NotSignedUp { .. } => StatusCode::FORBIDDEN,
            AttendanceOutcome::ActivityCancelled { .. } => StatusCode::CONFLICT,
            AttendanceOutcome::ActivityNotFound => StatusCode::NOT_FOUND,
            AttendanceOutcome::InvalidToken => StatusCode::BAD_REQUEST,
            AttendanceOutcome::StorageError => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn is_recorded(&self) -> bool {
        matches!(self, AttendanceOutcome::Recorded { .. })
    }

    pub fn message(&self) -> String {
        match self {
            AttendanceOutcome::Recorded { activity, hours } => format!(
                "Attendance confirmed for \"{}\". You earned {} hours.",
                activity.title, hours
            ),
            AttendanceOutcome::AlreadyRecorded { activity } => format!(
                "Your attendance for \"{}\" was already recorded.",
                activity.title
            ),
            AttendanceOutcome::NotSignedUp { activity } => format!(
                "You are not signed up for \"{}\". Sign up first, or ask the staff on site.",
                activity.title
            ),
            AttendanceOutcome::ActivityCancelled { activity } => format!(
                "\"{}\" has been cancelled, so attendance cannot be recorded.",
                activity.title
            ),
            AttendanceOutcome::ActivityNotFound => {
                "This activity no longer exists.".to_string()
            }
            AttendanceOutcome::InvalidToken => {
                "The QR code is invalid or has expired. Ask the staff to show a fresh one."
                    .to_string()
            }
            AttendanceOutcome::StorageError => {
                "Attendance could not be saved right now. Please try again.".to_string()
            }
        }
    }

    pub fn activity(&self) -> Option<&ActivitySummary> {
        match self {
            AttendanceOutcome::Recorded { activity, .. }
            | AttendanceOutcome::AlreadyRecorded { activity }
            | AttendanceOutcome::NotSignedUp { activity }
            | AttendanceOutcome::ActivityCancelled { activity } => Some(activity),
            _ => None,
        }
    }

    pub fn hours_earned(&self) -> Option<Hours> {
        match self {
            AttendanceOutcome::Recorded { hours, .. } => Some(*hours),
            _ => None,
        }
    }

    pub fn to_body(&self) -> AttendanceResponse {
        AttendanceResponse {
            ok: self.is_recorded(),
            code: self.code(),
            message: self.message(),
            activity: self.activity().cloned(),
            hours_earned: self.hours_earned(),
        }
    }
}

/// JSON body of `POST /qr/verify`.
#[derive(Debug, Serialize)]
pub struct AttendanceResponse {
    pub ok: bool,
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<ActivitySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_earned: Option<Hours>,
}

/// Request metadata stored with each record.
#[derive(Debug, Clone, Default)]
pub struct AttendanceAudit {
    pub ip_address: Option<String>,
    pub user_agent: String,
    pub device_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Verifies `token` and records attendance for `user_id`.
pub async fn confirm_with_token(
    pool: &SqlitePool,
    signer: &TokenSigner,
    notifier: &dyn Notifier,
    user_id: i64,
    token: &str,
    audit: &AttendanceAudit,
) -> AttendanceOutcome {
    let Some(activity_id) = signer.verify(token) else {
        info!(user_id, outcome = "invalid_token", "attendance confirmation");
        return AttendanceOutcome::InvalidToken;
    };
    record_attendance(pool, notifier, activity_id, user_id, audit).await
}

pub async fn record_attendance(
    pool: &SqlitePool,
    notifier: &dyn Notifier,
    activity_id: i64,
    user_id: i64,
    audit: &AttendanceAudit,
) -> AttendanceOutcome {
    record(pool, notifier, activity_id, user_id, audit, None).await
}

/// Staff path: same preconditions as a scan, flagged staff-assisted.
pub async fn grant_staff_assisted(
    pool: &SqlitePool,
    notifier: &dyn Notifier,
    staff_id: i64,
    activity_id: i64,
    user_id: i64,
    audit: &AttendanceAudit,
) -> AttendanceOutcome {
    record(pool, notifier, activity_id, user_id, audit, Some(staff_id)).await
}

async fn record(
    pool: &SqlitePool,
    notifier: &dyn Notifier,
    activity_id: i64,
    user_id: i64,
    audit: &AttendanceAudit,
    granted_by: Option<i64>,
) -> AttendanceOutcome {
    let outcome = match try_record(pool, activity_id, user_id, audit, granted_by).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(activity_id, user_id, error = %e, "attendance storage failure");
            AttendanceOutcome::StorageError
        }
    };

    info!(
        activity_id,
        user_id,
        staff_assisted = granted_by.is_some(),
        outcome = outcome.code(),
        "attendance confirmation"
    );

    if let AttendanceOutcome::Recorded { activity, hours } = &outcome {
        notifier.notify(
            Notice::new(
                user_id,
                NotificationCategory::Hours,
                "Attendance confirmed",
                format!("You earned {} volunteer hours for \"{}\".", hours, activity.title),
            )
            .with_target("/profile"),
        );
    }

    outcome
}

async fn try_record(
    pool: &SqlitePool,
    activity_id: i64,
    user_id: i64,
    audit: &AttendanceAudit,
    granted_by: Option<i64>,
) -> sqlx::Result<AttendanceOutcome> {
    let Some(activity) = activity_repo::load_activity(pool, activity_id).await? else {
        return Ok(AttendanceOutcome::ActivityNotFound);
    };
    let summary = activity.summary();

    if activity.is_cancelled() {
        return Ok(AttendanceOutcome::ActivityCancelled { activity: summary });
    }
    if signup_repo::load_signup(pool, activity_id, user_id)
        .await?
        .is_none()
    {
        return Ok(AttendanceOutcome::NotSignedUp { activity: summary });
    }
    if attendance_repo::exists_for_pair(pool, activity_id, user_id).await? {
        return Ok(AttendanceOutcome::AlreadyRecorded { activity: summary });
    }

    // The INSERT opens the write transaction; concurrent writers wait on the
    // busy timeout and then see the unique conflict.
    let mut tx = pool.begin().await?;
    let inserted = attendance_repo::insert_if_absent(
        &mut *tx,
        attendance_repo::NewAttendanceRecord {
            activity_id,
            user_id,
            ip_address: audit.ip_address.as_deref(),
            user_agent: &audit.user_agent,
            device_id: audit.device_id.as_deref(),
            latitude: audit.latitude,
            longitude: audit.longitude,
            staff_assisted: granted_by.is_some(),
            granted_by,
        },
    )
    .await?;

    if inserted == 0 {
        tx.rollback().await?;
        return Ok(AttendanceOutcome::AlreadyRecorded { activity: summary });
    }

    if signup_repo::mark_attended(&mut *tx, activity_id, user_id).await? == 0 {
        // Signup removed since the precondition read.
        tx.rollback().await?;
        return Ok(AttendanceOutcome::NotSignedUp { activity: summary });
    }

    tx.commit().await?;

    Ok(AttendanceOutcome::Recorded {
        hours: activity.hours_reward(),
        activity: summary,
    })
}

/// Deletes an attendance record and rolls an `attended` signup back to
/// `confirmed`. Returns the (activity, user) pair.
pub async fn revoke_attendance(pool: &SqlitePool, record_id: i64) -> Result<(i64, i64), AppError> {
    let mut tx = pool.begin().await?;
    let Some((activity_id, user_id)) =
        attendance_repo::delete_returning_pair(&mut *tx, record_id).await?
    else {
        tx.rollback().await?;
        return Err(AppError::NotFound("attendance record"));
    };
    signup_repo::revert_attended(&mut *tx, activity_id, user_id).await?;
    tx.commit().await?;

    info!(record_id, activity_id, user_id, "attendance record revoked");
    Ok((activity_id, user_id))
}
