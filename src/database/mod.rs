pub mod activity_repo;
pub mod attendance_repo;
pub mod group_repo;
pub mod idea_repo;
pub mod notification_repo;
pub mod role_repo;
pub mod signup_repo;
pub mod user_repo;
