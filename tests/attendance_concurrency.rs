mod common;

use std::sync::Arc;

use common::*;
use volunteer_portal::db;
use volunteer_portal::services::attendance_service::{confirm_with_token, AttendanceAudit};

const CONTENDERS: usize = 8;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_scans_record_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("attendance.db").display());
    let pool = db::open_pool(&url, CONTENDERS as u32).await.unwrap();

    let user = create_user(&pool, "race@ubu.ac.th").await;
    create_activity(&pool, 42, "Tree planting", 20, 30, "upcoming").await;
    add_signup(&pool, 42, user, "confirmed").await;

    let signer = qr_signer();
    let token = signer.issue(42, 900);
    let notifier = Arc::new(RecordingNotifier::default());
    let start = Arc::new(tokio::sync::Barrier::new(CONTENDERS));

    let mut handles = Vec::new();
    for _ in 0..CONTENDERS {
        let pool = pool.clone();
        let signer = signer.clone();
        let token = token.clone();
        let notifier = notifier.clone();
        let start = start.clone();
        handles.push(tokio::spawn(async move {
            start.wait().await;
            confirm_with_token(
                &pool,
                &signer,
                notifier.as_ref(),
                user,
                &token,
                &AttendanceAudit::default(),
            )
            .await
        }));
    }

    let mut codes = Vec::new();
    for handle in handles {
        codes.push(handle.await.unwrap().code());
    }

    assert_eq!(codes.iter().filter(|c| **c == "recorded").count(), 1, "{:?}", codes);
    assert_eq!(
        codes.iter().filter(|c| **c == "already_recorded").count(),
        CONTENDERS - 1,
        "{:?}",
        codes
    );
    assert_eq!(attendance_count(&pool, 42, user).await, 1);
    assert_eq!(signup_status(&pool, 42, user).await.as_deref(), Some("attended"));
    assert_eq!(notifier.for_user(user).len(), 1);
}
