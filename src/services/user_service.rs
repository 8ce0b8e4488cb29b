use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::database::{attendance_repo, notification_repo, role_repo, signup_repo, user_repo};
use crate::error::AppError;
use crate::models::{AttendanceView, Hours, NotificationPreferenceRow, UserView};
use crate::services::capability_service::ROLE_USER;

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub display_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub faculty: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub year: Option<String>,
}

fn normalise_email(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

fn parse_year(raw: Option<&str>) -> Result<Option<i64>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(y) => match y.parse::<i64>() {
            Ok(v) if (1..=10).contains(&v) => Ok(Some(v)),
            _ => Err(AppError::BadRequest("year must be between 1 and 10".to_string())),
        },
    }
}

impl RegistrationForm {
    /// Field checks that need no database.
    pub fn validate(&self, allowed_domain: Option<&str>) -> Result<(), AppError> {
        let email = normalise_email(&self.email);
        let Some((local, domain)) = email.split_once('@') else {
            return Err(AppError::BadRequest("a valid email is required".to_string()));
        };
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(AppError::BadRequest("a valid email is required".to_string()));
        }
        if let Some(allowed) = allowed_domain {
            if domain != allowed {
                return Err(AppError::BadRequest(format!(
                    "registration is limited to @{} addresses",
                    allowed
                )));
            }
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::BadRequest(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if self.password != self.password_confirm {
            return Err(AppError::BadRequest("passwords do not match".to_string()));
        }
        if self.display_name.trim().is_empty() {
            return Err(AppError::BadRequest("display name is required".to_string()));
        }
        parse_year(self.year.as_deref())?;
        Ok(())
    }
}

/// Creates the account with the `user` role and default notification
/// preferences. Returns the new user id.
pub async fn register(
    pool: &SqlitePool,
    form: &RegistrationForm,
    allowed_domain: Option<&str>,
) -> Result<i64, AppError> {
    form.validate(allowed_domain)?;
    let email = normalise_email(&form.email);
    let year = parse_year(form.year.as_deref())?;
    let password_hash =
        hash_password(&form.password).map_err(|e| AppError::Internal(e.to_string()))?;

    let mut tx = pool.begin().await?;
    let Some(user_id) = user_repo::insert_user(
        &mut *tx,
        user_repo::NewUser {
            email: &email,
            password_hash: &password_hash,
            display_name: form.display_name.trim(),
            title: form.title.trim(),
            student_id: form.student_id.trim(),
            faculty: form.faculty.trim(),
            department: form.department.trim(),
            year,
        },
    )
    .await?
    else {
        tx.rollback().await?;
        return Err(AppError::Conflict("this email is already registered".to_string()));
    };
    role_repo::assign_role(&mut *tx, user_id, ROLE_USER).await?;
    tx.commit().await?;

    notification_repo::upsert_preferences(pool, user_id, &NotificationPreferenceRow::default())
        .await?;

    info!(user_id, "user registered");
    Ok(user_id)
}

/// Resolves login input to an account. A bare name without `@` is tried
/// against the configured email domain.
pub async fn authenticate(
    pool: &SqlitePool,
    login: &str,
    password: &str,
    default_domain: Option<&str>,
) -> Result<Option<i64>, AppError> {
    let mut email = normalise_email(login);
    if !email.contains('@') {
        match default_domain {
            Some(domain) => email = format!("{}@{}", email, domain),
            None => return Ok(None),
        }
    }

    let Some(user) = user_repo::load_user_by_email(pool, &email).await? else {
        warn!(email = %email, "login for unknown account");
        return Ok(None);
    };
    match verify_password(password, &user.password_hash) {
        Ok(true) => Ok(Some(user.id)),
        Ok(false) => {
            warn!(user_id = user.id, "login with wrong password");
            Ok(None)
        }
        Err(e) => {
            warn!(user_id = user.id, error = %e, "stored password hash is unreadable");
            Ok(None)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupView {
    pub id: i64,
    pub activity_id: i64,
    pub activity_title: String,
    pub scheduled_at: String,
    pub status: String,
    pub joined_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub user: UserView,
    pub roles: Vec<String>,
    pub signups: Vec<SignupView>,
    pub attendance: Vec<AttendanceView>,
    pub total_hours: Hours,
}

pub async fn load_profile(pool: &SqlitePool, user_id: i64) -> Result<ProfileView, AppError> {
    let user = user_repo::load_user(pool, user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    let roles = role_repo::list_role_codes(pool, user_id).await?;
    let signups = signup_repo::list_signups_for_user(pool, user_id)
        .await?
        .into_iter()
        .map(|s| SignupView {
            id: s.id,
            activity_id: s.activity_id,
            activity_title: s.activity_title,
            scheduled_at: s.scheduled_at,
            status: s.status,
            joined_at: s.joined_at,
        })
        .collect();
    let attendance: Vec<AttendanceView> = attendance_repo::list_for_user(pool, user_id)
        .await?
        .into_iter()
        .map(AttendanceView::from)
        .collect();
    let total_hours = attendance.iter().map(|a| a.hours).sum();

    Ok(ProfileView {
        user: UserView::from(user),
        roles,
        signups,
        attendance,
        total_hours,
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileForm {
    pub display_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub faculty: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub year: Option<String>,
}

pub async fn update_profile(
    pool: &SqlitePool,
    user_id: i64,
    form: &ProfileForm,
) -> Result<(), AppError> {
    let display_name = form.display_name.trim();
    if display_name.is_empty() {
        return Err(AppError::BadRequest("display name is required".to_string()));
    }
    let year = parse_year(form.year.as_deref())?;
    let updated = user_repo::update_profile(
        pool,
        user_id,
        user_repo::ProfileUpdate {
            display_name,
            title: form.title.trim(),
            student_id: form.student_id.trim(),
            faculty: form.faculty.trim(),
            department: form.department.trim(),
            year,
        },
    )
    .await?;
    if updated == 0 {
        return Err(AppError::NotFound("user"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> RegistrationForm {
        RegistrationForm {
            email: " Somchai@UBU.ac.th ".to_string(),
            password: "longenough".to_string(),
            password_confirm: "longenough".to_string(),
            display_name: "Somchai".to_string(),
            ..RegistrationForm::default()
        }
    }

    #[test]
    fn hash_and_verify() {
        let hash = hash_password("mysecret").unwrap();
        assert!(verify_password("mysecret", &hash).unwrap());
        assert!(!verify_password("wrongpassword", &hash).unwrap());
    }

    #[test]
    fn registration_rules() {
        assert!(form().validate(Some("ubu.ac.th")).is_ok());
        assert!(form().validate(Some("example.org")).is_err());

        let mut f = form();
        f.password_confirm = "different1".to_string();
        assert!(f.validate(None).is_err());

        let mut f = form();
        f.password = "short".to_string();
        f.password_confirm = "short".to_string();
        assert!(f.validate(None).is_err());

        let mut f = form();
        f.email = "no-at-sign".to_string();
        assert!(f.validate(None).is_err());

        let mut f = form();
        f.year = Some("99".to_string());
        assert!(f.validate(None).is_err());
    }

    #[test]
    fn blank_year_is_none() {
        assert_eq!(parse_year(Some(" ")).unwrap(), None);
        assert_eq!(parse_year(Some("3")).unwrap(), Some(3));
    }
}
