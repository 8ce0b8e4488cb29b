use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::database::activity_repo::{self, ActivityFilter, NewActivity};
use crate::database::signup_repo;
use crate::error::AppError;
use crate::models::{ActivityCategory, ActivityRow, ActivityStatus, Hours};

/// Raw `/activities` query string. Unusable values are dropped rather than
/// rejected so a stale bookmark still lists something.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ActivityQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub location: Option<String>,
    pub min_hours: Option<String>,
}

impl ActivityQuery {
    pub fn to_filter(&self) -> ActivityFilter {
        let text = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let date = |v: &Option<String>| text(v).filter(|d| is_iso_date(d));

        ActivityFilter {
            search: text(&self.q),
            category: text(&self.category)
                .filter(|c| ActivityCategory::parse(c).is_some()),
            date_from: date(&self.date_from),
            date_to: date(&self.date_to),
            location: text(&self.location),
            min_hours_tenths: text(&self.min_hours)
                .and_then(|h| Hours::parse(&h))
                .map(Hours::tenths),
        }
    }
}

/// Row shaped for the listing template.
#[derive(Debug, Clone)]
pub struct ActivityListItem {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub when: String,
    pub location: String,
    pub hours: String,
    pub capacity: i64,
    pub status: String,
}

impl From<ActivityRow> for ActivityListItem {
    fn from(row: ActivityRow) -> Self {
        ActivityListItem {
            id: row.id,
            when: display_datetime(&row.scheduled_at),
            hours: row.hours_reward().to_string(),
            title: row.title,
            category: row.category,
            location: row.location,
            capacity: row.capacity,
            status: row.status,
        }
    }
}

pub async fn list_activities(
    pool: &SqlitePool,
    query: &ActivityQuery,
) -> Result<Vec<ActivityListItem>, AppError> {
    let rows = activity_repo::list_activities(pool, &query.to_filter()).await?;
    Ok(rows.into_iter().map(ActivityListItem::from).collect())
}

#[derive(Debug, Clone)]
pub struct ActivityDetailView {
    pub activity: ActivityRow,
    pub when: String,
    pub hours: String,
    pub spots_taken: i64,
    pub waitlisted: i64,
    pub is_full: bool,
    pub accepts_signups: bool,
    pub my_status: Option<String>,
    pub can_show_qr: bool,
}

pub async fn load_activity_detail(
    pool: &SqlitePool,
    activity_id: i64,
    viewer_id: i64,
    can_manage_attendance: bool,
) -> Result<ActivityDetailView, AppError> {
    let activity = activity_repo::load_activity(pool, activity_id)
        .await?
        .ok_or(AppError::NotFound("activity"))?;
    let counts = signup_repo::count_signups(pool, activity_id).await?;
    let mine = signup_repo::load_signup(pool, activity_id, viewer_id).await?;

    Ok(ActivityDetailView {
        when: display_datetime(&activity.scheduled_at),
        hours: activity.hours_reward().to_string(),
        spots_taken: counts.held,
        waitlisted: counts.waitlisted,
        is_full: counts.held >= activity.capacity,
        accepts_signups: activity.status().is_some_and(|s| s.accepts_signups()),
        my_status: mine.map(|s| s.status),
        can_show_qr: can_manage_attendance && !activity.is_cancelled(),
        activity,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivityForm {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub scheduled_at: String,
    #[serde(default)]
    pub location: String,
    pub capacity: String,
    pub hours_reward: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidActivity {
    pub title: String,
    pub description: String,
    pub category: ActivityCategory,
    pub scheduled_at: String,
    pub location: String,
    pub capacity: i64,
    pub hours_reward: Hours,
}

impl ValidActivity {
    fn as_new(&self, created_by: Option<i64>) -> NewActivity<'_> {
        NewActivity {
            title: &self.title,
            description: &self.description,
            category: self.category.as_str(),
            scheduled_at: &self.scheduled_at,
            location: &self.location,
            capacity: self.capacity,
            hours_reward_tenths: self.hours_reward.tenths(),
            created_by,
        }
    }
}

impl ActivityForm {
    /// `now_minute` is the current UTC time as `YYYY-MM-DDTHH:MM`; pass
    /// `None` to skip the future-date check (edits of past activities).
    pub fn validate(&self, now_minute: Option<&str>) -> Result<ValidActivity, AppError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::BadRequest("title is required".to_string()));
        }

        let category = match self.category.trim() {
            "" => ActivityCategory::Other,
            c => ActivityCategory::parse(c)
                .ok_or_else(|| AppError::BadRequest(format!("unknown category: {}", c)))?,
        };

        let scheduled_at = self.scheduled_at.trim();
        let scheduled_at = scheduled_at.get(..16).unwrap_or(scheduled_at);
        if !is_iso_minute(scheduled_at) {
            return Err(AppError::BadRequest(
                "scheduled_at must look like YYYY-MM-DDTHH:MM".to_string(),
            ));
        }
        if let Some(now) = now_minute {
            if scheduled_at <= now {
                return Err(AppError::BadRequest(
                    "scheduled_at must be in the future".to_string(),
                ));
            }
        }

        let capacity: i64 = self
            .capacity
            .trim()
            .parse()
            .map_err(|_| AppError::BadRequest("capacity must be a whole number".to_string()))?;
        if capacity < 1 {
            return Err(AppError::BadRequest("capacity must be at least 1".to_string()));
        }

        let hours_reward = Hours::parse(&self.hours_reward).ok_or_else(|| {
                AppError::BadRequest(
                    "hours_reward must be between 0.0 and 999.9 with one decimal".to_string(),
                )
            })?;

        Ok(ValidActivity {
            title: title.to_string(),
            description: self.description.trim().to_string(),
            category,
            scheduled_at: scheduled_at.to_string(),
            location: self.location.trim().to_string(),
            capacity,
            hours_reward,
        })
    }
}

pub async fn create_activity(
    pool: &SqlitePool,
    form: &ActivityForm,
    created_by: i64,
) -> Result<i64, AppError> {
    let now = utc_minute(Utc::now());
    let valid = form.validate(Some(&now))?;
    let id = activity_repo::insert_activity(pool, valid.as_new(Some(created_by))).await?;
    info!(activity_id = id, created_by, "activity created");
    Ok(id)
}

pub async fn update_activity(
    pool: &SqlitePool,
    activity_id: i64,
    form: &ActivityForm,
) -> Result<(), AppError> {
    let valid = form.validate(None)?;
    if activity_repo::update_activity(pool, activity_id, valid.as_new(None)).await? == 0 {
        return Err(AppError::NotFound("activity"));
    }
    info!(activity_id, "activity updated");
    Ok(())
}

pub async fn set_activity_status(
    pool: &SqlitePool,
    activity_id: i64,
    status: &str,
) -> Result<ActivityStatus, AppError> {
    let status = ActivityStatus::parse(status.trim())
        .ok_or_else(|| AppError::BadRequest(format!("unknown status: {}", status)))?;
    if activity_repo::set_activity_status(pool, activity_id, status.as_str()).await? == 0 {
        return Err(AppError::NotFound("activity"));
    }
    info!(activity_id, status = status.as_str(), "activity status changed");
    Ok(status)
}

pub async fn delete_activity(pool: &SqlitePool, activity_id: i64) -> Result<(), AppError> {
    if activity_repo::delete_activity(pool, activity_id).await? == 0 {
        return Err(AppError::NotFound("activity"));
    }
    info!(activity_id, "activity deleted");
    Ok(())
}

// "2030-01-31T09:00" -> "2030-01-31 09:00"
fn display_datetime(raw: &str) -> String {
    raw.replacen('T', " ", 1).chars().take(16).collect()
}

const DATE_FORMAT: &str = "%Y-%m-%d";
const MINUTE_FORMAT: &str = "%Y-%m-%dT%H:%M";

// Round-tripping rejects unpadded fields chrono would otherwise accept.
fn is_iso_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, DATE_FORMAT).is_ok_and(|d| d.format(DATE_FORMAT).to_string() == s)
}

fn is_iso_minute(s: &str) -> bool {
    NaiveDateTime::parse_from_str(s, MINUTE_FORMAT)
        .is_ok_and(|dt| dt.format(MINUTE_FORMAT).to_string() == s)
}

/// `at` as `YYYY-MM-DDTHH:MM` in UTC, the form activity times are stored in.
pub fn utc_minute(at: DateTime<Utc>) -> String {
    at.format(MINUTE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ActivityForm {
        ActivityForm {
            title: "Tree planting".to_string(),
            description: String::new(),
            category: "environment".to_string(),
            scheduled_at: "2030-05-01T08:30".to_string(),
            location: "North field".to_string(),
            capacity: "20".to_string(),
            hours_reward: "2.5".to_string(),
        }
    }

    #[test]
    fn valid_form_passes() {
        let valid = form().validate(Some("2026-01-01T00:00")).unwrap();
        assert_eq!(valid.category, ActivityCategory::Environment);
        assert_eq!(valid.hours_reward, Hours::from_tenths(25));
        assert_eq!(valid.capacity, 20);
    }

    #[test]
    fn past_dates_are_rejected_on_create_only() {
        let f = form();
        assert!(f.validate(Some("2031-01-01T00:00")).is_err());
        assert!(f.validate(None).is_ok());
    }

    #[test]
    fn field_rules() {
        let mut f = form();
        f.title = "  ".to_string();
        assert!(f.validate(None).is_err());

        let mut f = form();
        f.capacity = "0".to_string();
        assert!(f.validate(None).is_err());

        let mut f = form();
        f.hours_reward = "1.25".to_string();
        assert!(f.validate(None).is_err());

        let mut f = form();
        f.hours_reward = "1000".to_string();
        assert!(f.validate(None).is_err());

        let mut f = form();
        f.scheduled_at = "2030-13-01T08:30".to_string();
        assert!(f.validate(None).is_err());

        let mut f = form();
        f.category = "party".to_string();
        assert!(f.validate(None).is_err());
    }

    #[test]
    fn seconds_are_trimmed_from_datetime() {
        let mut f = form();
        f.scheduled_at = "2030-05-01T08:30:00".to_string();
        assert_eq!(f.validate(None).unwrap().scheduled_at, "2030-05-01T08:30");
    }

    #[test]
    fn query_drops_unusable_values() {
        let q = ActivityQuery {
            q: Some("  ".to_string()),
            category: Some("party".to_string()),
            date_from: Some("2030-01-01".to_string()),
            date_to: Some("tomorrow".to_string()),
            location: Some("Hall".to_string()),
            min_hours: Some("1.5".to_string()),
        };
        let f = q.to_filter();
        assert!(f.search.is_none());
        assert!(f.category.is_none());
        assert_eq!(f.date_from.as_deref(), Some("2030-01-01"));
        assert!(f.date_to.is_none());
        assert_eq!(f.location.as_deref(), Some("Hall"));
        assert_eq!(f.min_hours_tenths, Some(15));
    }

    #[test]
    fn utc_minute_formats_known_instants() {
        let at = |ts| DateTime::from_timestamp(ts, 0).unwrap();
        assert_eq!(utc_minute(at(0)), "1970-01-01T00:00");
        assert_eq!(utc_minute(at(951_782_400)), "2000-02-29T00:00");
        assert_eq!(utc_minute(at(1_760_000_000)), "2025-10-09T08:53");
    }

    #[test]
    fn impossible_calendar_dates_are_rejected() {
        for bad in ["2030-02-31T09:00", "2031-02-29T09:00", "2030-04-31T09:00", "2030-05-01T24:00"] {
            let mut f = form();
            f.scheduled_at = bad.to_string();
            assert!(f.validate(None).is_err(), "{} accepted", bad);
        }
        let mut f = form();
        f.scheduled_at = "2032-02-29T09:00".to_string();
        assert!(f.validate(None).is_ok());

        assert!(!is_iso_date("2031-02-29"));
        assert!(!is_iso_date("2030-2-01"));
        assert!(is_iso_date("2032-02-29"));
        assert!(!is_iso_minute("2030-05-01T8:30"));
    }

    #[test]
    fn impossible_filter_dates_are_dropped() {
        let q = ActivityQuery {
            q: None,
            category: None,
            date_from: Some("2031-02-29".to_string()),
            date_to: Some("2030-02-31".to_string()),
            location: None,
            min_hours: None,
        };
        let f = q.to_filter();
        assert!(f.date_from.is_none());
        assert!(f.date_to.is_none());
    }

    #[test]
    fn display_datetime_uses_a_space() {
        assert_eq!(display_datetime("2030-01-31T09:00"), "2030-01-31 09:00");
    }
}
