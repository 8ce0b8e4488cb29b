mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use common::*;
use volunteer_portal::services::seed_service::{self, DEMO_EMAIL, DEMO_PASSWORD};
use volunteer_portal::state::AppState;
use volunteer_portal::web::router::build_router;

struct Harness {
    state: AppState,
    app: Router,
    notifier: Arc<RecordingNotifier>,
}

impl Harness {
    async fn new() -> Self {
        let pool = memory_pool().await;
        let notifier = Arc::new(RecordingNotifier::default());
        let state = test_state(pool, notifier.clone());
        let app = build_router(state.clone());
        Harness { state, app, notifier }
    }

    fn cookie_for(&self, user_id: i64) -> String {
        format!("access_token={}", self.state.session_signer.issue(user_id, 3600))
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
        (status, headers, body)
    }
}

fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

fn verify_request(cookie: Option<&str>, content_type: &str, body: String) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/qr/verify")
        .header(header::CONTENT_TYPE, content_type);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

#[tokio::test]
async fn verify_without_session_is_unauthorized() {
    let h = Harness::new().await;
    let (status, _, body) = h
        .send(verify_request(
            None,
            "application/x-www-form-urlencoded",
            "token=abc".to_string(),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json(&body)["error"], "unauthorized");
}

#[tokio::test]
async fn browser_pages_redirect_to_login() {
    let h = Harness::new().await;
    let request = Request::builder()
        .uri("/activities?q=tree")
        .header(header::ACCEPT, "text/html,application/xhtml+xml")
        .body(Body::empty())
        .unwrap();
    let (status, headers, _) = h.send(request).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(
        headers.get(header::LOCATION).unwrap(),
        "/login?next=/activities%3Fq%3Dtree"
    );
}

#[tokio::test]
async fn scan_records_once_then_reports_duplicate() {
    let h = Harness::new().await;
    let user = create_user(&h.state.pool, "scan@ubu.ac.th").await;
    create_activity(&h.state.pool, 42, "Tree planting", 20, 30, "upcoming").await;
    add_signup(&h.state.pool, 42, user, "confirmed").await;
    let cookie = h.cookie_for(user);
    let token = h.state.qr_signer.issue(42, 900);

    let (status, _, body) = h
        .send(verify_request(
            Some(&cookie),
            "application/x-www-form-urlencoded",
            format!("token={}", token),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["ok"], true);
    assert_eq!(body["code"], "recorded");
    assert_eq!(body["hours_earned"], 2.0);
    assert_eq!(body["activity"]["id"], 42);

    // A scanner that submits the whole confirm URL as the raw body.
    let (status, _, body) = h
        .send(verify_request(
            Some(&cookie),
            "text/plain",
            format!("http://portal.test/qr/confirm/{}", token),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json(&body)["code"], "already_recorded");

    assert_eq!(attendance_count(&h.state.pool, 42, user).await, 1);
    assert_eq!(h.notifier.for_user(user).len(), 1);
}

#[tokio::test]
async fn forged_token_is_a_bad_request() {
    let h = Harness::new().await;
    let user = create_user(&h.state.pool, "forger@ubu.ac.th").await;
    let (status, _, body) = h
        .send(verify_request(
            Some(&h.cookie_for(user)),
            "application/json",
            r#"{"qr_token":"NDI6OTk5OTk5OTk5OTpkZWFkYmVlZg"}"#.to_string(),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["code"], "invalid_token");
}

#[tokio::test]
async fn qr_token_issuance_needs_attendance_capability() {
    let h = Harness::new().await;
    let volunteer = create_user(&h.state.pool, "vol@ubu.ac.th").await;
    let leader = create_user(&h.state.pool, "lead@ubu.ac.th").await;
    grant_role(&h.state.pool, leader, "leader").await;
    create_activity(&h.state.pool, 42, "Tree planting", 20, 30, "upcoming").await;

    let request = |cookie: String| {
        Request::builder()
            .uri("/activities/42/qr-token?expires_in=5")
            .header(header::ACCEPT, "application/json")
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap()
    };

    let (status, _, _) = h.send(request(h.cookie_for(volunteer))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, body) = h.send(request(h.cookie_for(leader))).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    let token = body["token"].as_str().unwrap();
    assert_eq!(h.state.qr_signer.verify(token), Some(42));
    assert_eq!(
        body["confirm_url"].as_str().unwrap(),
        format!("http://portal.test/qr/confirm/{}", token)
    );
    let ttl = body["expires_at"].as_i64().unwrap() - volunteer_portal::db::unix_timestamp();
    assert!((55..=60).contains(&ttl), "clamped ttl was {}", ttl);
}

#[tokio::test]
async fn admin_console_requires_a_role() {
    let h = Harness::new().await;
    let user = create_user(&h.state.pool, "plain@ubu.ac.th").await;
    let request = Request::builder()
        .uri("/admin")
        .header(header::COOKIE, h.cookie_for(user))
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = h.send(request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn activities_page_renders_for_signed_in_user() {
    let h = Harness::new().await;
    let user = create_user(&h.state.pool, "reader@ubu.ac.th").await;
    create_activity(&h.state.pool, 42, "Tree planting", 20, 30, "upcoming").await;
    let request = Request::builder()
        .uri("/activities")
        .header(header::ACCEPT, "text/html")
        .header(header::COOKIE, h.cookie_for(user))
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = h.send(request).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("Tree planting"));
    assert!(!html.contains("New activity"));
}

#[tokio::test]
async fn activity_form_states_times_are_utc() {
    let h = Harness::new().await;
    let staff = create_user(&h.state.pool, "planner@ubu.ac.th").await;
    grant_role(&h.state.pool, staff, "staff").await;
    let request = Request::builder()
        .uri("/activities")
        .header(header::ACCEPT, "text/html")
        .header(header::COOKIE, h.cookie_for(staff))
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = h.send(request).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("New activity"));
    assert!(html.contains("Date and time (UTC)"));
}

#[tokio::test]
async fn login_sets_session_cookie() {
    let h = Harness::new().await;
    seed_service::seed_demo_data(&h.state.pool).await.unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "email={}&password={}&next=%2Fprofile",
            DEMO_EMAIL.replace('@', "%40"),
            DEMO_PASSWORD
        )))
        .unwrap();
    let (status, headers, _) = h.send(request).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers.get(header::LOCATION).unwrap(), "/profile");
    let cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("access_token="));
    assert!(cookie.contains("HttpOnly"));

    let bad = Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("email=demo%40ubu.ac.th&password=wrong-password"))
        .unwrap();
    let (status, headers, body) = h.send(bad).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers.get(header::SET_COOKIE).is_none());
    assert!(String::from_utf8(body).unwrap().contains("Incorrect email or password."));
}

#[tokio::test]
async fn chatbot_and_health_are_public() {
    let h = Harness::new().await;
    let request = Request::builder()
        .method("POST")
        .uri("/chatbot")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("q=How+do+I+sign+up%3F"))
        .unwrap();
    let (status, _, body) = h.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json(&body)["reply"].as_str().unwrap().contains("Sign up"));

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, _, body) = h.send(request).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], true);
}

#[tokio::test]
async fn confirm_link_renders_result_page() {
    let h = Harness::new().await;
    let user = create_user(&h.state.pool, "link@ubu.ac.th").await;
    create_activity(&h.state.pool, 7, "Blood drive", 10, 20, "cancelled").await;
    let token = h.state.qr_signer.issue(7, 900);

    let request = Request::builder()
        .uri(format!("/qr/confirm/{}", token))
        .header(header::ACCEPT, "text/html")
        .header(header::COOKIE, h.cookie_for(user))
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = h.send(request).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("data-code=\"activity_cancelled\""));
    assert!(html.contains("/activities/7"));
}

#[tokio::test]
async fn qr_token_is_not_a_session_cookie_under_a_shared_secret() {
    let pool = memory_pool().await;
    let config = volunteer_portal::config::AppConfig::from_lookup(|key| match key {
        "QR_SECRET" | "SESSION_SECRET" => Some("one-secret-for-both".to_string()),
        _ => None,
    })
    .unwrap();
    let state = AppState::with_notifier(pool, config, Arc::new(RecordingNotifier::default()))
        .unwrap();
    let app = build_router(state.clone());

    let admin = create_user(&state.pool, "root@ubu.ac.th").await;
    grant_role(&state.pool, admin, "admin").await;
    create_activity(&state.pool, admin, "Projected activity", 10, 10, "upcoming").await;

    let request = |token: String| {
        Request::builder()
            .uri("/admin/users")
            .header(header::ACCEPT, "application/json")
            .header(header::COOKIE, format!("access_token={}", token))
            .body(Body::empty())
            .unwrap()
    };

    let qr_token = state.qr_signer.issue(admin, 900);
    let response = app.clone().oneshot(request(qr_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let session_token = state.session_signer.issue(admin, 900);
    let response = app.oneshot(request(session_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn qr_token_is_not_a_session_cookie_with_derived_secret() {
    let pool = memory_pool().await;
    let config = volunteer_portal::config::AppConfig::from_lookup(|key| match key {
        "QR_SECRET" => Some("only-the-qr-secret".to_string()),
        _ => None,
    })
    .unwrap();
    let state = AppState::with_notifier(pool, config, Arc::new(RecordingNotifier::default()))
        .unwrap();
    let app = build_router(state.clone());

    let admin = create_user(&state.pool, "root@ubu.ac.th").await;
    grant_role(&state.pool, admin, "admin").await;
    let request = Request::builder()
        .uri("/admin/users")
        .header(header::ACCEPT, "application/json")
        .header(
            header::COOKIE,
            format!("access_token={}", state.qr_signer.issue(admin, 900)),
        )
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

fn grant_request(cookie: &str, activity_id: i64, user_id: i64) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/admin/attendance/grant")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(header::COOKIE, cookie)
        .body(Body::from(format!(
            "activity_id={}&user_id={}",
            activity_id, user_id
        )))
        .unwrap()
}

fn delete_record_request(cookie: &str, record_id: i64) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/admin/attendance/{}/delete", record_id))
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn staff_grant_over_http_is_gated_and_reports_the_outcome() {
    let h = Harness::new().await;
    let pool = &h.state.pool;
    let staff = create_user(pool, "staff@ubu.ac.th").await;
    grant_role(pool, staff, "staff").await;
    let reviewer = create_user(pool, "reviewer@ubu.ac.th").await;
    grant_role(pool, reviewer, "reviewer").await;
    let volunteer = create_user(pool, "helper@ubu.ac.th").await;
    create_activity(pool, 42, "Tree planting", 20, 30, "upcoming").await;
    add_signup(pool, 42, volunteer, "confirmed").await;

    let (status, _, body) = h.send(grant_request(&h.cookie_for(volunteer), 42, volunteer)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json(&body)["error"], "forbidden");

    // Console access without the attendance capability.
    let (status, _, body) = h.send(grant_request(&h.cookie_for(reviewer), 42, volunteer)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json(&body)["error"], "forbidden");
    assert_eq!(attendance_count(pool, 42, volunteer).await, 0);

    let (status, _, body) = h.send(grant_request(&h.cookie_for(staff), 42, volunteer)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["ok"], true);
    assert_eq!(body["code"], "recorded");
    assert_eq!(body["hours_earned"], 2.0);
    assert_eq!(body["activity"]["id"], 42);

    let (assisted, granted_by): (i64, Option<i64>) = sqlx::query_as(
        "SELECT staff_assisted, granted_by FROM attendance_records WHERE activity_id = 42 AND user_id = ?",
    )
    .bind(volunteer)
    .fetch_one(pool)
    .await
    .unwrap();
    assert_eq!(assisted, 1);
    assert_eq!(granted_by, Some(staff));

    let (status, _, body) = h.send(grant_request(&h.cookie_for(staff), 42, volunteer)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let body = json(&body);
    assert_eq!(body["ok"], false);
    assert_eq!(body["code"], "already_recorded");
    assert_eq!(attendance_count(pool, 42, volunteer).await, 1);
}

#[tokio::test]
async fn deleting_a_record_over_http_is_gated_and_returns_the_pair() {
    let h = Harness::new().await;
    let pool = &h.state.pool;
    let leader = create_user(pool, "leader@ubu.ac.th").await;
    grant_role(pool, leader, "leader").await;
    let volunteer = create_user(pool, "helper@ubu.ac.th").await;
    create_activity(pool, 42, "Tree planting", 20, 30, "upcoming").await;
    add_signup(pool, 42, volunteer, "confirmed").await;

    let (status, _, _) = h.send(grant_request(&h.cookie_for(leader), 42, volunteer)).await;
    assert_eq!(status, StatusCode::OK);
    let record_id: i64 = sqlx::query_scalar(
        "SELECT id FROM attendance_records WHERE activity_id = 42 AND user_id = ?",
    )
    .bind(volunteer)
    .fetch_one(pool)
    .await
    .unwrap();

    let (status, _, body) = h.send(delete_record_request(&h.cookie_for(volunteer), record_id)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json(&body)["error"], "forbidden");
    assert_eq!(attendance_count(pool, 42, volunteer).await, 1);

    let (status, _, body) = h.send(delete_record_request(&h.cookie_for(leader), record_id)).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["ok"], true);
    assert_eq!(body["activity_id"], 42);
    assert_eq!(body["user_id"], volunteer);
    assert_eq!(attendance_count(pool, 42, volunteer).await, 0);
    assert_eq!(signup_status(pool, 42, volunteer).await.as_deref(), Some("confirmed"));

    let (status, _, body) = h.send(delete_record_request(&h.cookie_for(leader), record_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"], "not_found");
}
