use sqlx::SqlitePool;
use tracing::info;

use crate::database::{activity_repo, signup_repo};
use crate::error::AppError;
use crate::models::{NotificationCategory, SignupStatus};
use crate::services::notification_service::{Notice, Notifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupOutcome {
    Confirmed,
    Waitlisted,
    AlreadySignedUp,
    ActivityClosed,
}

impl SignupOutcome {
    /// Short code used in `?notice=` redirects.
    pub fn notice(self) -> &'static str {
        match self {
            SignupOutcome::Confirmed => "signup_ok",
            SignupOutcome::Waitlisted => "waitlisted",
            SignupOutcome::AlreadySignedUp => "already_signed_up",
            SignupOutcome::ActivityClosed => "activity_closed",
        }
    }

    fn from_stored(status: &str) -> Self {
        if status == SignupStatus::Confirmed.as_str() {
            SignupOutcome::Confirmed
        } else {
            SignupOutcome::Waitlisted
        }
    }
}

/// Signs `user_id` up for an activity. Always accepted while the activity
/// is open: `confirmed` when a place is free, `waitlist` otherwise.
pub async fn sign_up(
    pool: &SqlitePool,
    notifier: &dyn Notifier,
    activity_id: i64,
    user_id: i64,
    note: &str,
) -> Result<SignupOutcome, AppError> {
    let activity = activity_repo::load_activity(pool, activity_id)
        .await?
        .ok_or(AppError::NotFound("activity"))?;
    if !activity.status().is_some_and(|s| s.accepts_signups()) {
        return Ok(SignupOutcome::ActivityClosed);
    }

    let note = note.trim();
    let stored = match signup_repo::load_signup(pool, activity_id, user_id).await? {
        Some(existing) if existing.status() != Some(SignupStatus::Cancelled) => {
            return Ok(SignupOutcome::AlreadySignedUp);
        }
        Some(_) => signup_repo::reactivate_signup(pool, activity_id, user_id, note).await?,
        None => signup_repo::insert_signup_with_capacity(pool, activity_id, user_id, note).await?,
    };

    // No row back means a concurrent request signed the user up first.
    let Some(stored) = stored else {
        return Ok(SignupOutcome::AlreadySignedUp);
    };
    let outcome = SignupOutcome::from_stored(&stored);
    info!(activity_id, user_id, status = %stored, "signup stored");

    let (title, message) = match outcome {
        SignupOutcome::Confirmed => (
            "Signup confirmed",
            format!("You are signed up for \"{}\".", activity.title),
        ),
        _ => (
            "Added to the waitlist",
            format!(
                "\"{}\" is full. You will be confirmed automatically if a place frees up.",
                activity.title
            ),
        ),
    };
    notifier.notify(
        Notice::new(user_id, NotificationCategory::Activity, title, message)
            .with_target(format!("/activities/{}", activity_id)),
    );

    Ok(outcome)
}

/// Cancels the user's own signup and promotes the head of the waitlist.
pub async fn cancel_signup(
    pool: &SqlitePool,
    notifier: &dyn Notifier,
    activity_id: i64,
    user_id: i64,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    if signup_repo::cancel_signup(&mut *tx, activity_id, user_id).await? == 0 {
        let existing = signup_repo::load_signup(&mut *tx, activity_id, user_id).await?;
        tx.rollback().await?;
        return match existing.and_then(|s| s.status()) {
            None => Err(AppError::NotFound("signup")),
            Some(SignupStatus::Attended) => Err(AppError::Conflict(
                "attendance is already recorded for this signup".to_string(),
            )),
            Some(_) => Ok(()),
        };
    }
    let promoted = signup_repo::promote_next_waitlisted(&mut *tx, activity_id).await?;
    tx.commit().await?;

    info!(activity_id, user_id, promoted = ?promoted, "signup cancelled");
    if let Some(promoted) = promoted {
        notify_promoted(pool, notifier, activity_id, promoted).await;
    }
    Ok(())
}

/// Parses the admin status form value. `attended` is only reachable through
/// attendance recording.
pub fn parse_admin_status(input: &str) -> Option<SignupStatus> {
    match input.trim() {
        "confirm" | "confirmed" => Some(SignupStatus::Confirmed),
        "waitlist" => Some(SignupStatus::Waitlist),
        "cancel" | "cancelled" => Some(SignupStatus::Cancelled),
        "requested" => Some(SignupStatus::Requested),
        _ => None,
    }
}

/// Staff status change. Cancelling a held place promotes the waitlist head.
pub async fn set_status(
    pool: &SqlitePool,
    notifier: &dyn Notifier,
    signup_id: i64,
    status: SignupStatus,
) -> Result<(), AppError> {
    let signup = signup_repo::load_signup_by_id(pool, signup_id)
        .await?
        .ok_or(AppError::NotFound("signup"))?;
    let current = signup.status();
    if current == Some(SignupStatus::Attended) {
        return Err(attended_conflict());
    }
    if current == Some(status) {
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    let changed =
        signup_repo::set_signup_status(&mut *tx, signup_id, &signup.status, status.as_str()).await?;
    if changed == 0 {
        tx.rollback().await?;
        // A scan or another staff change landed after the read above.
        let now_attended = signup_repo::load_signup_by_id(pool, signup_id)
            .await?
            .is_some_and(|s| s.status() == Some(SignupStatus::Attended));
        return Err(if now_attended {
            attended_conflict()
        } else {
            AppError::Conflict("the signup changed meanwhile, reload and retry".to_string())
        });
    }
    // Moving someone to the waitlist must not promote them straight back.
    let frees_spot =
        current.is_some_and(|s| s.holds_spot()) && status == SignupStatus::Cancelled;
    let promoted = if frees_spot {
        signup_repo::promote_next_waitlisted(&mut *tx, signup.activity_id).await?
    } else {
        None
    };
    tx.commit().await?;

    info!(
        signup_id,
        activity_id = signup.activity_id,
        status = status.as_str(),
        promoted = ?promoted,
        "signup status changed by staff"
    );

    notifier.notify(
        Notice::new(
            signup.user_id,
            NotificationCategory::Activity,
            "Signup updated",
            format!("Your signup status is now \"{}\".", status.as_str()),
        )
        .with_target(format!("/activities/{}", signup.activity_id)),
    );
    if let Some(promoted) = promoted {
        notify_promoted(pool, notifier, signup.activity_id, promoted).await;
    }
    Ok(())
}

fn attended_conflict() -> AppError {
    AppError::Conflict("remove the attendance record before changing this signup".to_string())
}

async fn notify_promoted(pool: &SqlitePool, notifier: &dyn Notifier, activity_id: i64, user_id: i64) {
    let title = match activity_repo::load_activity(pool, activity_id).await {
        Ok(Some(a)) => a.title,
        _ => "the activity".to_string(),
    };
    notifier.notify(
        Notice::new(
            user_id,
            NotificationCategory::Activity,
            "A place opened up",
            format!("You moved off the waitlist and are confirmed for \"{}\".", title),
        )
        .with_target(format!("/activities/{}", activity_id)),
    );
}
