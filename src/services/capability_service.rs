//! Role codes map to one derived capability set, computed once per request.

use std::collections::BTreeSet;

use serde::Serialize;
use sqlx::SqlitePool;

use crate::database::role_repo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewAdminConsole,
    ManageActivities,
    ManageAttendance,
    ManageUsers,
    ManageRoles,
    ReviewIdeas,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::ViewAdminConsole,
        Capability::ManageActivities,
        Capability::ManageAttendance,
        Capability::ManageUsers,
        Capability::ManageRoles,
        Capability::ReviewIdeas,
    ];
}

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_STAFF: &str = "staff";
pub const ROLE_LEADER: &str = "leader";
pub const ROLE_REVIEWER: &str = "reviewer";
pub const ROLE_USER: &str = "user";

fn capabilities_of_role(code: &str) -> &'static [Capability] {
    use Capability::*;
    match code {
        ROLE_ADMIN => &Capability::ALL,
        ROLE_STAFF => &[
            ViewAdminConsole,
            ManageActivities,
            ManageAttendance,
            ManageUsers,
            ReviewIdeas,
        ],
        ROLE_LEADER => &[ViewAdminConsole, ManageAttendance],
        ROLE_REVIEWER => &[ViewAdminConsole, ReviewIdeas],
        _ => &[],
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    pub fn from_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for role in roles {
            set.extend(capabilities_of_role(role.as_ref()).iter().copied());
        }
        CapabilitySet(set)
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }
}

pub async fn load_capabilities(pool: &SqlitePool, user_id: i64) -> sqlx::Result<CapabilitySet> {
    let roles = role_repo::list_role_codes(pool, user_id).await?;
    Ok(CapabilitySet::from_roles(roles))
}
