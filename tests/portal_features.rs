mod common;

use common::*;
use volunteer_portal::error::AppError;
use volunteer_portal::models::{Hours, IdeaStatus, NotificationCategory};
use volunteer_portal::services::attendance_service::{record_attendance, AttendanceAudit};
use volunteer_portal::services::capability_service::{load_capabilities, Capability};
use volunteer_portal::services::group_service::{self, GroupForm};
use volunteer_portal::services::idea_service::{self, IdeaForm};
use volunteer_portal::services::seed_service::{self, SeedReport};
use volunteer_portal::services::{admin_service, user_service};

#[tokio::test]
async fn profile_totals_hours_exactly() {
    let pool = memory_pool().await;
    let notifier = RecordingNotifier::default();
    let user = create_user(&pool, "hours@ubu.ac.th").await;
    // 0.1 + 0.2 must come out as 0.3, not 0.30000000000000004.
    create_activity(&pool, 1, "Short shift", 1, 10, "ongoing").await;
    create_activity(&pool, 2, "Another shift", 2, 10, "ongoing").await;
    create_activity(&pool, 3, "Skipped shift", 50, 10, "ongoing").await;
    for id in [1, 2, 3] {
        add_signup(&pool, id, user, "confirmed").await;
    }
    for id in [1, 2] {
        assert!(record_attendance(&pool, &notifier, id, user, &AttendanceAudit::default())
            .await
            .is_recorded());
    }

    let profile = user_service::load_profile(&pool, user).await.unwrap();
    assert_eq!(profile.total_hours, Hours::from_tenths(3));
    assert_eq!(profile.total_hours.to_string(), "0.3");
    assert_eq!(profile.attendance.len(), 2);
    assert_eq!(profile.signups.len(), 3);
    assert_eq!(
        profile.signups.iter().filter(|s| s.status == "attended").count(),
        2
    );
}

#[tokio::test]
async fn ideas_take_one_vote_per_user_until_reviewed() {
    let pool = memory_pool().await;
    let notifier = RecordingNotifier::default();
    let proposer = create_user(&pool, "idea@ubu.ac.th").await;
    let voter = create_user(&pool, "voter@ubu.ac.th").await;

    let form = IdeaForm {
        title: "Campus garden".to_string(),
        description: "Grow vegetables behind the library".to_string(),
        target_hours: "3.5".to_string(),
    };
    let idea = idea_service::propose(&pool, proposer, &form).await.unwrap();

    assert!(idea_service::vote(&pool, idea, voter).await.unwrap().ok);
    let again = idea_service::vote(&pool, idea, voter).await.unwrap();
    assert!(!again.ok);
    assert_eq!(again.message, "already voted");

    let listed = idea_service::list_ideas(&pool, voter, None).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].vote_count, 1);
    assert!(listed[0].voted_by_me);
    assert_eq!(listed[0].target_hours, Hours::from_tenths(35));

    idea_service::review(&pool, &notifier, idea, IdeaStatus::Approved, "Looks good")
        .await
        .unwrap();
    let notices = notifier.for_user(proposer);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].category, NotificationCategory::Idea);
    assert!(notices[0].message.contains("Looks good"));

    assert!(matches!(
        idea_service::review(&pool, &notifier, idea, IdeaStatus::Rejected, "").await,
        Err(AppError::Conflict(_))
    ));
    assert!(matches!(
        idea_service::vote(&pool, idea, proposer).await,
        Err(AppError::Conflict(_))
    ));
}

#[tokio::test]
async fn groups_need_the_invite_code() {
    let pool = memory_pool().await;
    let owner = create_user(&pool, "owner@ubu.ac.th").await;
    let friend = create_user(&pool, "friend@ubu.ac.th").await;

    let created = group_service::create_group(
        &pool,
        owner,
        &GroupForm {
            name: "Weekend crew".to_string(),
            description: String::new(),
        },
    )
    .await
    .unwrap();
    assert_eq!(created.invite_code.len(), 10);

    assert!(matches!(
        group_service::post(&pool, created.id, friend, "hello").await,
        Err(AppError::Forbidden)
    ));
    assert!(matches!(
        group_service::join(&pool, created.id, friend, "wrong-code").await,
        Err(AppError::BadRequest(_))
    ));
    group_service::join(&pool, created.id, friend, &created.invite_code)
        .await
        .unwrap();
    group_service::join(&pool, created.id, friend, &created.invite_code)
        .await
        .unwrap();
    group_service::post(&pool, created.id, friend, "See you Saturday")
        .await
        .unwrap();

    let detail = group_service::load_detail(&pool, created.id, friend).await.unwrap();
    assert!(detail.is_member);
    assert_eq!(detail.members.len(), 2);
    assert_eq!(detail.posts.len(), 1);
    assert_eq!(detail.invite_code.as_deref(), Some(created.invite_code.as_str()));

    let outsider = create_user(&pool, "outsider@ubu.ac.th").await;
    let hidden = group_service::load_detail(&pool, created.id, outsider).await.unwrap();
    assert!(hidden.invite_code.is_none());
}

#[tokio::test]
async fn roles_always_keep_user_and_drive_capabilities() {
    let pool = memory_pool().await;
    let user = create_user(&pool, "promote@ubu.ac.th").await;

    let roles = admin_service::set_roles(&pool, user, &["reviewer".to_string()])
        .await
        .unwrap();
    assert_eq!(roles, vec!["reviewer".to_string(), "user".to_string()]);
    let caps = load_capabilities(&pool, user).await.unwrap();
    assert!(caps.has(Capability::ReviewIdeas));
    assert!(caps.has(Capability::ViewAdminConsole));
    assert!(!caps.has(Capability::ManageAttendance));

    assert!(matches!(
        admin_service::set_roles(&pool, user, &["superuser".to_string()]).await,
        Err(AppError::BadRequest(_))
    ));
    let caps = load_capabilities(&pool, user).await.unwrap();
    assert!(caps.has(Capability::ReviewIdeas));

    assert!(matches!(
        admin_service::delete_user(&pool, user, user).await,
        Err(AppError::Conflict(_))
    ));
}

#[tokio::test]
async fn seeding_twice_creates_nothing_new() {
    let pool = memory_pool().await;
    let first = seed_service::seed_demo_data(&pool).await.unwrap();
    assert_eq!(
        first,
        SeedReport {
            users_created: 2,
            activities_created: 5,
            groups_created: 1,
        }
    );
    let second = seed_service::seed_demo_data(&pool).await.unwrap();
    assert_eq!(second, SeedReport::default());

    let admin = user_service::authenticate(
        &pool,
        seed_service::ADMIN_EMAIL,
        seed_service::ADMIN_PASSWORD,
        None,
    )
    .await
    .unwrap()
    .unwrap();
    let caps = load_capabilities(&pool, admin).await.unwrap();
    assert!(caps.has(Capability::ManageRoles));
}
