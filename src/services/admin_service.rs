use std::collections::BTreeSet;

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::database::{activity_repo, attendance_repo, idea_repo, role_repo, signup_repo, user_repo};
use crate::error::AppError;
use crate::models::{AttendanceView, Hours, UserView};
use crate::services::capability_service::ROLE_USER;

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub users: i64,
    pub activities: i64,
    pub activities_by_status: Vec<StatusCount>,
    pub signups: i64,
    pub attendance_records: i64,
    pub pending_ideas: i64,
    pub hours_granted: Hours,
}

pub async fn load_dashboard(pool: &SqlitePool) -> Result<DashboardStats, AppError> {
    let activities_by_status = activity_repo::count_activities_by_status(pool)
        .await?
        .into_iter()
        .map(|(status, count)| StatusCount { status, count })
        .collect();
    Ok(DashboardStats {
        users: user_repo::count_users(pool).await?,
        activities: activity_repo::count_activities(pool).await?,
        activities_by_status,
        signups: signup_repo::count_all_signups(pool).await?,
        attendance_records: attendance_repo::count_records(pool).await?,
        pending_ideas: idea_repo::count_pending(pool).await?,
        hours_granted: Hours::from_tenths(attendance_repo::total_hours_tenths(pool).await?),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct UserHours {
    pub user: UserView,
    pub attendance: Vec<AttendanceView>,
    pub total_hours: Hours,
}

pub async fn load_user_hours(pool: &SqlitePool, user_id: i64) -> Result<UserHours, AppError> {
    let user = user_repo::load_user(pool, user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    let attendance: Vec<AttendanceView> = attendance_repo::list_for_user(pool, user_id)
        .await?
        .into_iter()
        .map(AttendanceView::from)
        .collect();
    let total_hours = attendance.iter().map(|a| a.hours).sum();
    Ok(UserHours {
        user: UserView::from(user),
        attendance,
        total_hours,
    })
}

pub async fn delete_user(pool: &SqlitePool, acting_user_id: i64, user_id: i64) -> Result<(), AppError> {
    if acting_user_id == user_id {
        return Err(AppError::Conflict("you cannot delete your own account".to_string()));
    }
    if user_repo::delete_user(pool, user_id).await? == 0 {
        return Err(AppError::NotFound("user"));
    }
    info!(user_id, deleted_by = acting_user_id, "user deleted");
    Ok(())
}

/// Replaces the user's roles. `user` is always kept; unknown codes are
/// rejected before anything changes.
pub async fn set_roles(
    pool: &SqlitePool,
    user_id: i64,
    requested: &[String],
) -> Result<Vec<String>, AppError> {
    if user_repo::load_user(pool, user_id).await?.is_none() {
        return Err(AppError::NotFound("user"));
    }
    let known: BTreeSet<String> = role_repo::list_known_role_codes(pool)
        .await?
        .into_iter()
        .collect();

    let mut wanted: BTreeSet<String> = BTreeSet::new();
    wanted.insert(ROLE_USER.to_string());
    for code in requested.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
        if !known.contains(code) {
            return Err(AppError::BadRequest(format!("unknown role: {}", code)));
        }
        wanted.insert(code.to_string());
    }

    let mut tx = pool.begin().await?;
    role_repo::clear_roles(&mut *tx, user_id).await?;
    for code in &wanted {
        role_repo::assign_role(&mut *tx, user_id, code).await?;
    }
    let roles = role_repo::list_role_codes(&mut *tx, user_id).await?;
    tx.commit().await?;

    info!(user_id, roles = ?roles, "roles updated");
    Ok(roles)
}
