use axum::{
    middleware,
    response::Redirect,
    routing::{get, get_service, post},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::web::middleware::auth as auth_middleware;
use crate::web::routes::{
    activities, activity, admin, auth, chatbot, groups, health, ideas, notifications, profile, qr,
};

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin::dashboard_handler))
        .route(
            "/admin/activities/:activity_id/edit",
            post(admin::edit_activity_handler),
        )
        .route(
            "/admin/activities/:activity_id/status",
            post(admin::activity_status_handler),
        )
        .route(
            "/admin/activities/:activity_id/delete",
            post(admin::delete_activity_handler),
        )
        .route(
            "/admin/activities/:activity_id/signups",
            get(admin::activity_signups_handler),
        )
        .route(
            "/admin/signups/:signup_id/status",
            post(admin::signup_status_handler),
        )
        .route("/admin/users", get(admin::list_users_handler))
        .route("/admin/users/:user_id/hours", get(admin::user_hours_handler))
        .route(
            "/admin/users/:user_id/delete",
            post(admin::delete_user_handler),
        )
        .route("/admin/users/:user_id/roles", post(admin::set_roles_handler))
        .route(
            "/admin/attendance/grant",
            post(admin::grant_attendance_handler),
        )
        .route(
            "/admin/attendance/:record_id/delete",
            post(admin::delete_attendance_handler),
        )
        .route("/admin/ideas", get(admin::list_ideas_handler))
        .route(
            "/admin/ideas/:idea_id/approve",
            post(admin::approve_idea_handler),
        )
        .route(
            "/admin/ideas/:idea_id/reject",
            post(admin::reject_idea_handler),
        )
        .layer(middleware::from_fn(auth_middleware::require_admin_console))
}

fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/activities",
            get(activities::activities_handler).post(activities::create_activity_handler),
        )
        .route(
            "/activities/:activity_id",
            get(activity::activity_detail_handler),
        )
        .route(
            "/activities/:activity_id/signup",
            post(activity::activity_signup_handler),
        )
        .route(
            "/activities/:activity_id/cancel-signup",
            post(activity::cancel_signup_handler),
        )
        .route(
            "/activities/:activity_id/qr-token",
            get(activity::qr_token_handler),
        )
        .route("/qr/scan", get(qr::qr_scan_page))
        .route("/qr/verify", post(qr::qr_verify_handler))
        .route("/qr/confirm/:token", get(qr::qr_confirm_handler))
        .route(
            "/profile",
            get(profile::profile_page).post(profile::update_profile_handler),
        )
        .route("/api/profile", get(profile::profile_api))
        .route(
            "/api/ideas",
            get(ideas::list_ideas_handler).post(ideas::propose_idea_handler),
        )
        .route("/api/ideas/:idea_id/vote", post(ideas::vote_idea_handler))
        .route(
            "/api/groups",
            get(groups::list_groups_handler).post(groups::create_group_handler),
        )
        .route("/api/groups/:group_id", get(groups::group_detail_handler))
        .route(
            "/api/groups/:group_id/join",
            post(groups::join_group_handler),
        )
        .route(
            "/api/groups/:group_id/posts",
            post(groups::create_post_handler),
        )
        .route(
            "/api/notifications",
            get(notifications::list_notifications_handler),
        )
        .route(
            "/api/notifications/read-all",
            post(notifications::mark_all_read_handler),
        )
        .route(
            "/api/notifications/preferences",
            get(notifications::preferences_handler)
                .post(notifications::update_preferences_handler),
        )
        .route(
            "/api/notifications/:notification_id/read",
            post(notifications::mark_read_handler),
        )
        .route("/logout", post(auth::logout_handler))
        .merge(admin_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::require_auth,
        ))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Public routes
        .route("/", get(|| async { Redirect::to("/activities") }))
        .route("/login", get(auth::login_page).post(auth::login_handler))
        .route(
            "/register",
            get(auth::register_page).post(auth::register_handler),
        )
        .route("/chatbot", post(chatbot::chatbot_handler))
        .route("/health", get(health::health_handler))
        // Protected routes
        .merge(protected_routes(&state))
        // Static files
        .nest_service(
            "/assets",
            get_service(ServeDir::new("assets")).layer(SetResponseHeaderLayer::if_not_present(
                CACHE_CONTROL,
                HeaderValue::from_static("no-store"),
            )),
        )
        // Layers
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(state)
}
