use serde::Serialize;

use super::Hours;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub scheduled_at: String,
    pub location: String,
    pub capacity: i64,
    pub hours_reward_tenths: i64,
    pub status: String,
    pub created_by: Option<i64>,
    pub created_at: String,
}

impl ActivityRow {
    pub fn hours_reward(&self) -> Hours {
        Hours::from_tenths(self.hours_reward_tenths)
    }

    pub fn status(&self) -> Option<ActivityStatus> {
        ActivityStatus::parse(&self.status)
    }

    pub fn is_cancelled(&self) -> bool {
        self.status() == Some(ActivityStatus::Cancelled)
    }

    pub fn summary(&self) -> ActivitySummary {
        ActivitySummary {
            id: self.id,
            title: self.title.clone(),
            scheduled_at: self.scheduled_at.clone(),
            location: self.location.clone(),
            hours_reward: self.hours_reward(),
            status: self.status.clone(),
        }
    }
}

/// Compact activity description used in JSON responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySummary {
    pub id: i64,
    pub title: String,
    pub scheduled_at: String,
    pub location: String,
    pub hours_reward: Hours,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityStatus {
    Upcoming,
    Ongoing,
    Completed,
    Cancelled,
}

impl ActivityStatus {
    pub const ALL: [ActivityStatus; 4] = [
        ActivityStatus::Upcoming,
        ActivityStatus::Ongoing,
        ActivityStatus::Completed,
        ActivityStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityStatus::Upcoming => "upcoming",
            ActivityStatus::Ongoing => "ongoing",
            ActivityStatus::Completed => "completed",
            ActivityStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == input)
    }

    /// Signups are only taken while the activity has not finished.
    pub fn accepts_signups(self) -> bool {
        matches!(self, ActivityStatus::Upcoming | ActivityStatus::Ongoing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityCategory {
    Environment,
    Community,
    Education,
    Health,
    Other,
}

impl ActivityCategory {
    pub const ALL: [ActivityCategory; 5] = [
        ActivityCategory::Environment,
        ActivityCategory::Community,
        ActivityCategory::Education,
        ActivityCategory::Health,
        ActivityCategory::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityCategory::Environment => "environment",
            ActivityCategory::Community => "community",
            ActivityCategory::Education => "education",
            ActivityCategory::Health => "health",
            ActivityCategory::Other => "other",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == input)
    }
}
