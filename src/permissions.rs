use crate::help::PermissionLevel;
use serde::Deserialize;
use serenity::model::prelude::*;

/// User and role ids per permission level.
///
/// Each list may mix user ids and role ids.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PermissionsConfig {
    #[serde(default)]
    pub owners: Vec<u64>,

    #[serde(default)]
    pub administrators: Vec<u64>,

    #[serde(default)]
    pub moderators: Vec<u64>,

    #[serde(default)]
    pub supporters: Vec<u64>,
}

impl PermissionsConfig {
    /// Get the highest level granted to a user with the given roles.
    pub fn level_for(&self, user_id: UserId, roles: &[RoleId]) -> PermissionLevel {
        let matches = |ids: &[u64]| {
            ids.contains(&user_id.get()) || roles.iter().any(|role| ids.contains(&role.get()))
        };

        if self.owners.contains(&user_id.get()) {
            PermissionLevel::Owner
        } else if matches(&self.administrators) {
            PermissionLevel::Administrator
        } else if matches(&self.moderators) {
            PermissionLevel::Moderator
        } else if matches(&self.supporters) {
            PermissionLevel::Supporter
        } else {
            PermissionLevel::Regular
        }
    }

    /// Whether anyone below owner can use supporter commands
    pub fn has_supporters(&self) -> bool {
        !(self.administrators.is_empty() && self.moderators.is_empty() && self.supporters.is_empty())
    }
}
