//! Demo data for local development. Every step checks before it creates.

use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use tracing::info;

use crate::database::activity_repo::{self, NewActivity};
use crate::database::{group_repo, role_repo, user_repo};
use crate::error::AppError;
use crate::models::ActivityCategory;
use crate::services::activities_service::utc_minute;
use crate::services::capability_service::ROLE_ADMIN;
use crate::services::user_service::{self, RegistrationForm};

pub const DEMO_EMAIL: &str = "demo@ubu.ac.th";
pub const DEMO_PASSWORD: &str = "demo12345";
pub const ADMIN_EMAIL: &str = "admin@ubu.ac.th";
pub const ADMIN_PASSWORD: &str = "admin12345";
const SAMPLE_GROUP_CODE: &str = "invite123";
const SAMPLE_ACTIVITY_COUNT: i64 = 5;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub users_created: usize,
    pub activities_created: usize,
    pub groups_created: usize,
}

async fn ensure_user(
    pool: &SqlitePool,
    email: &str,
    password: &str,
    display_name: &str,
    student_id: &str,
) -> Result<(i64, bool), AppError> {
    if let Some(existing) = user_repo::load_user_by_email(pool, email).await? {
        return Ok((existing.id, false));
    }
    let form = RegistrationForm {
        email: email.to_string(),
        password: password.to_string(),
        password_confirm: password.to_string(),
        display_name: display_name.to_string(),
        title: String::new(),
        student_id: student_id.to_string(),
        faculty: "Management Science".to_string(),
        department: "Management".to_string(),
        year: Some("4".to_string()),
    };
    let id = user_service::register(pool, &form, None).await?;
    Ok((id, true))
}

pub async fn seed_demo_data(pool: &SqlitePool) -> Result<SeedReport, AppError> {
    let mut report = SeedReport::default();

    let (demo_id, created) = ensure_user(pool, DEMO_EMAIL, DEMO_PASSWORD, "Demo User", "6500001").await?;
    report.users_created += usize::from(created);

    let (admin_id, created) = ensure_user(pool, ADMIN_EMAIL, ADMIN_PASSWORD, "Portal Admin", "").await?;
    report.users_created += usize::from(created);
    role_repo::assign_role(pool, admin_id, ROLE_ADMIN).await?;

    if activity_repo::count_activities(pool).await? == 0 {
        let now = Utc::now();
        for i in 1..=SAMPLE_ACTIVITY_COUNT {
            let category = ActivityCategory::ALL[(i as usize - 1) % ActivityCategory::ALL.len()];
            let title = format!("Sample activity #{}", i);
            let location = format!("Venue {}", i);
            let scheduled_at = utc_minute(now + Duration::days(i));
            activity_repo::insert_activity(
                pool,
                NewActivity {
                    title: &title,
                    description: "Demonstration activity",
                    category: category.as_str(),
                    scheduled_at: &scheduled_at,
                    location: &location,
                    capacity: 10 + i,
                    hours_reward_tenths: 15,
                    created_by: Some(admin_id),
                },
            )
            .await?;
            report.activities_created += 1;
        }
    }

    if group_repo::list_groups(pool).await?.is_empty() {
        let group_id = group_repo::insert_group(
            pool,
            "Sample group",
            "A group for trying things out",
            SAMPLE_GROUP_CODE,
            demo_id,
        )
        .await?;
        group_repo::add_member(pool, group_id, demo_id).await?;
        report.groups_created += 1;
    }

    info!(
        users = report.users_created,
        activities = report.activities_created,
        groups = report.groups_created,
        "seeding done"
    );
    Ok(report)
}
