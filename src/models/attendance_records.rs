use serde::Serialize;

use super::Hours;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttendanceRecordRow {
    pub id: i64,
    pub activity_id: i64,
    pub user_id: i64,
    pub scanned_at: String,
    pub ip_address: Option<String>,
    pub user_agent: String,
    pub device_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub staff_assisted: i64,
    pub granted_by: Option<i64>,
}

// Attendance joined with the activity it proves, for hour totals.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserAttendanceRow {
    pub id: i64,
    pub activity_id: i64,
    pub activity_title: String,
    pub hours_reward_tenths: i64,
    pub scanned_at: String,
    pub staff_assisted: i64,
}

impl UserAttendanceRow {
    pub fn hours(&self) -> Hours {
        Hours::from_tenths(self.hours_reward_tenths)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceView {
    pub id: i64,
    pub activity_id: i64,
    pub activity_title: String,
    pub hours: Hours,
    pub scanned_at: String,
    pub staff_assisted: bool,
}

impl From<UserAttendanceRow> for AttendanceView {
    fn from(row: UserAttendanceRow) -> Self {
        AttendanceView {
            id: row.id,
            activity_id: row.activity_id,
            hours: row.hours(),
            activity_title: row.activity_title,
            scanned_at: row.scanned_at,
            staff_assisted: row.staff_assisted != 0,
        }
    }
}
