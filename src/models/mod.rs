pub mod activities;
pub mod attendance_records;
pub mod groups;
pub mod hours;
pub mod ideas;
pub mod notifications;
pub mod signups;
pub mod users;

pub use activities::{ActivityCategory, ActivityRow, ActivityStatus, ActivitySummary};
pub use attendance_records::{AttendanceRecordRow, AttendanceView, UserAttendanceRow};
pub use groups::{GroupListRow, GroupMemberRow, GroupPostRow, GroupRow};
pub use hours::Hours;
pub use ideas::{IdeaListRow, IdeaRow, IdeaStatus, IdeaView};
pub use notifications::{
    NotificationCategory, NotificationChannel, NotificationPreferenceRow, NotificationRow,
};
pub use signups::{ActivitySignupRow, SignupRow, SignupStatus, UserSignupRow};
pub use users::{UserRow, UserView};
