mod common;

use common::*;
use volunteer_portal::database::signup_repo;
use volunteer_portal::error::AppError;
use volunteer_portal::models::{NotificationCategory, SignupStatus};
use volunteer_portal::services::signup_service::{cancel_signup, set_status, sign_up, SignupOutcome};

#[tokio::test]
async fn full_activity_waitlists_and_promotes_oldest() {
    let pool = memory_pool().await;
    let notifier = RecordingNotifier::default();
    create_activity(&pool, 1, "Library shelving", 10, 2, "upcoming").await;
    let first = create_user(&pool, "first@ubu.ac.th").await;
    let second = create_user(&pool, "second@ubu.ac.th").await;
    let third = create_user(&pool, "third@ubu.ac.th").await;
    let fourth = create_user(&pool, "fourth@ubu.ac.th").await;

    assert_eq!(sign_up(&pool, &notifier, 1, first, "").await.unwrap(), SignupOutcome::Confirmed);
    assert_eq!(sign_up(&pool, &notifier, 1, second, "").await.unwrap(), SignupOutcome::Confirmed);
    assert_eq!(sign_up(&pool, &notifier, 1, third, "").await.unwrap(), SignupOutcome::Waitlisted);
    assert_eq!(sign_up(&pool, &notifier, 1, fourth, "").await.unwrap(), SignupOutcome::Waitlisted);
    assert_eq!(
        sign_up(&pool, &notifier, 1, first, "again").await.unwrap(),
        SignupOutcome::AlreadySignedUp
    );

    cancel_signup(&pool, &notifier, 1, first).await.unwrap();
    assert_eq!(signup_status(&pool, 1, first).await.as_deref(), Some("cancelled"));
    assert_eq!(signup_status(&pool, 1, third).await.as_deref(), Some("confirmed"));
    assert_eq!(signup_status(&pool, 1, fourth).await.as_deref(), Some("waitlist"));

    let promoted = notifier.for_user(third);
    assert_eq!(promoted.last().map(|n| n.title.as_str()), Some("A place opened up"));
    assert!(promoted.iter().all(|n| n.category == NotificationCategory::Activity));

    assert_eq!(sign_up(&pool, &notifier, 1, first, "").await.unwrap(), SignupOutcome::Waitlisted);
}

#[tokio::test]
async fn closed_activities_take_no_signups() {
    let pool = memory_pool().await;
    let notifier = RecordingNotifier::default();
    create_activity(&pool, 7, "Blood drive", 10, 20, "cancelled").await;
    create_activity(&pool, 8, "Old fair", 10, 20, "completed").await;
    let user = create_user(&pool, "late@ubu.ac.th").await;

    for id in [7, 8] {
        assert_eq!(
            sign_up(&pool, &notifier, id, user, "").await.unwrap(),
            SignupOutcome::ActivityClosed
        );
        assert_eq!(signup_status(&pool, id, user).await, None);
    }
    assert!(matches!(
        sign_up(&pool, &notifier, 404, user, "").await,
        Err(AppError::NotFound("activity"))
    ));
}

#[tokio::test]
async fn attended_signup_cannot_be_cancelled() {
    let pool = memory_pool().await;
    let notifier = RecordingNotifier::default();
    create_activity(&pool, 3, "Food bank", 20, 5, "ongoing").await;
    let user = create_user(&pool, "done@ubu.ac.th").await;
    add_signup(&pool, 3, user, "attended").await;

    assert!(matches!(
        cancel_signup(&pool, &notifier, 3, user).await,
        Err(AppError::Conflict(_))
    ));
    assert_eq!(signup_status(&pool, 3, user).await.as_deref(), Some("attended"));

    let missing = create_user(&pool, "nobody@ubu.ac.th").await;
    assert!(matches!(
        cancel_signup(&pool, &notifier, 3, missing).await,
        Err(AppError::NotFound("signup"))
    ));
}

#[tokio::test]
async fn staff_cancellation_promotes_waitlist() {
    let pool = memory_pool().await;
    let notifier = RecordingNotifier::default();
    create_activity(&pool, 5, "Park clean-up", 10, 1, "upcoming").await;
    let holder = create_user(&pool, "holder@ubu.ac.th").await;
    let waiting = create_user(&pool, "waiting@ubu.ac.th").await;
    sign_up(&pool, &notifier, 5, holder, "").await.unwrap();
    sign_up(&pool, &notifier, 5, waiting, "").await.unwrap();

    let signup_id: i64 =
        sqlx::query_scalar("SELECT id FROM signups WHERE activity_id = 5 AND user_id = ?")
            .bind(holder)
            .fetch_one(&pool)
            .await
            .unwrap();
    set_status(&pool, &notifier, signup_id, SignupStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(signup_status(&pool, 5, holder).await.as_deref(), Some("cancelled"));
    assert_eq!(signup_status(&pool, 5, waiting).await.as_deref(), Some("confirmed"));
}

#[tokio::test]
async fn staff_status_change_never_overwrites_attended() {
    let pool = memory_pool().await;
    let notifier = RecordingNotifier::default();
    create_activity(&pool, 6, "Blood drive", 10, 5, "ongoing").await;
    let user = create_user(&pool, "scanned@ubu.ac.th").await;
    add_signup(&pool, 6, user, "confirmed").await;
    let signup_id: i64 =
        sqlx::query_scalar("SELECT id FROM signups WHERE activity_id = 6 AND user_id = ?")
            .bind(user)
            .fetch_one(&pool)
            .await
            .unwrap();

    // A staff form still showing `confirmed` after the scan committed.
    sqlx::query("UPDATE signups SET status = 'attended' WHERE id = ?")
        .bind(signup_id)
        .execute(&pool)
        .await
        .unwrap();
    let changed = signup_repo::set_signup_status(&pool, signup_id, "confirmed", "cancelled")
        .await
        .unwrap();
    assert_eq!(changed, 0);
    let changed = signup_repo::set_signup_status(&pool, signup_id, "attended", "waitlist")
        .await
        .unwrap();
    assert_eq!(changed, 0);
    assert_eq!(signup_status(&pool, 6, user).await.as_deref(), Some("attended"));

    assert!(matches!(
        set_status(&pool, &notifier, signup_id, SignupStatus::Cancelled).await,
        Err(AppError::Conflict(_))
    ));
    assert_eq!(signup_status(&pool, 6, user).await.as_deref(), Some("attended"));
    assert!(notifier.notices().is_empty());
}

#[tokio::test]
async fn staff_status_change_applies_from_the_current_status() {
    let pool = memory_pool().await;
    let notifier = RecordingNotifier::default();
    create_activity(&pool, 8, "Tutoring", 10, 5, "upcoming").await;
    let user = create_user(&pool, "tutor@ubu.ac.th").await;
    add_signup(&pool, 8, user, "requested").await;
    let signup_id: i64 =
        sqlx::query_scalar("SELECT id FROM signups WHERE activity_id = 8 AND user_id = ?")
            .bind(user)
            .fetch_one(&pool)
            .await
            .unwrap();

    set_status(&pool, &notifier, signup_id, SignupStatus::Waitlist)
        .await
        .unwrap();
    assert_eq!(signup_status(&pool, 8, user).await.as_deref(), Some("waitlist"));
    assert_eq!(notifier.for_user(user).len(), 1);
}
