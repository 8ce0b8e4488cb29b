use serde::Serialize;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SignupRow {
    pub id: i64,
    pub activity_id: i64,
    pub user_id: i64,
    pub status: String,
    pub note: String,
    pub joined_at: String,
    pub updated_at: String,
}

impl SignupRow {
    pub fn status(&self) -> Option<SignupStatus> {
        SignupStatus::parse(&self.status)
    }
}

// Signup joined with its activity, for profile pages.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserSignupRow {
    pub id: i64,
    pub activity_id: i64,
    pub activity_title: String,
    pub scheduled_at: String,
    pub status: String,
    pub joined_at: String,
}

// Signup joined with its user, for the staff roster.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ActivitySignupRow {
    pub id: i64,
    pub user_id: i64,
    pub display_name: String,
    pub email: String,
    pub status: String,
    pub note: String,
    pub joined_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupStatus {
    Requested,
    Confirmed,
    Attended,
    Waitlist,
    Cancelled,
}

impl SignupStatus {
    pub const ALL: [SignupStatus; 5] = [
        SignupStatus::Requested,
        SignupStatus::Confirmed,
        SignupStatus::Attended,
        SignupStatus::Waitlist,
        SignupStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SignupStatus::Requested => "requested",
            SignupStatus::Confirmed => "confirmed",
            SignupStatus::Attended => "attended",
            SignupStatus::Waitlist => "waitlist",
            SignupStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == input)
    }

    /// Whether the signup occupies one of the activity's places.
    pub fn holds_spot(self) -> bool {
        matches!(
            self,
            SignupStatus::Requested | SignupStatus::Confirmed | SignupStatus::Attended
        )
    }
}
