use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::database::group_repo;
use crate::error::AppError;
use crate::models::{GroupMemberRow, GroupPostRow, GroupRow};

const INVITE_CODE_LEN: usize = 10;

pub fn generate_invite_code() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..INVITE_CODE_LEN].to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedGroup {
    pub id: i64,
    pub invite_code: String,
}

/// Creates the group and makes the creator its first member.
pub async fn create_group(
    pool: &SqlitePool,
    creator_id: i64,
    form: &GroupForm,
) -> Result<CreatedGroup, AppError> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("group name is required".to_string()));
    }
    let invite_code = generate_invite_code();

    let mut tx = pool.begin().await?;
    let id = group_repo::insert_group(
        &mut *tx,
        name,
        form.description.trim(),
        &invite_code,
        creator_id,
    )
    .await?;
    group_repo::add_member(&mut *tx, id, creator_id).await?;
    tx.commit().await?;

    info!(group_id = id, creator_id, "group created");
    Ok(CreatedGroup { id, invite_code })
}

#[derive(Debug, Serialize)]
pub struct GroupDetail {
    pub group: GroupRow,
    pub is_member: bool,
    /// Shown to members only so they can invite others.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_code: Option<String>,
    pub members: Vec<GroupMemberRow>,
    pub posts: Vec<GroupPostRow>,
}

pub async fn load_detail(
    pool: &SqlitePool,
    group_id: i64,
    viewer_id: i64,
) -> Result<GroupDetail, AppError> {
    let group = group_repo::load_group(pool, group_id)
        .await?
        .ok_or(AppError::NotFound("group"))?;
    let is_member = group_repo::is_member(pool, group_id, viewer_id).await?;
    let members = group_repo::list_members(pool, group_id).await?;
    let posts = group_repo::list_posts(pool, group_id).await?;
    Ok(GroupDetail {
        invite_code: is_member.then(|| group.invite_code.clone()),
        group,
        is_member,
        members,
        posts,
    })
}

/// Joining twice is a no-op.
pub async fn join(pool: &SqlitePool, group_id: i64, user_id: i64, code: &str) -> Result<(), AppError> {
    let group = group_repo::load_group(pool, group_id)
        .await?
        .ok_or(AppError::NotFound("group"))?;
    if code.trim() != group.invite_code {
        return Err(AppError::BadRequest("invalid invite code".to_string()));
    }
    if group_repo::add_member(pool, group_id, user_id).await? > 0 {
        info!(group_id, user_id, "group joined");
    }
    Ok(())
}

pub async fn post(
    pool: &SqlitePool,
    group_id: i64,
    author_id: i64,
    content: &str,
) -> Result<i64, AppError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest("post content is required".to_string()));
    }
    if group_repo::load_group(pool, group_id).await?.is_none() {
        return Err(AppError::NotFound("group"));
    }
    if !group_repo::is_member(pool, group_id, author_id).await? {
        return Err(AppError::Forbidden);
    }
    Ok(group_repo::insert_post(pool, group_id, author_id, content).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_codes_are_ten_hex_chars() {
        let code = generate_invite_code();
        assert_eq!(code.len(), INVITE_CODE_LEN);
        assert!(code.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_ne!(code, generate_invite_code());
    }
}
