pub mod activities_service;
pub mod admin_service;
pub mod attendance_service;
pub mod capability_service;
pub mod chatbot_service;
pub mod email_service;
pub mod group_service;
pub mod idea_service;
pub mod notification_service;
pub mod seed_service;
pub mod signup_service;
pub mod token_service;
pub mod user_service;
