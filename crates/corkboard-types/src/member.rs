//! Membership: roles, invites, profiles, and caller-supplied capabilities.
//!
//! Authorization is decided elsewhere (session + backend rules). This crate
//! only models the *result* of that decision: a [`Role`] on the roster and a
//! readonly [`MemberCapabilities`] snapshot handed to the interaction layer.

use serde::{Deserialize, Serialize};

use crate::ids::{BoardId, InviteId, UserId};

/// Membership level on a board.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    /// Full control, including roster and board deletion.
    Owner,
    /// May create, move, edit, and delete cards/columns.
    Editor,
    /// Read-only access.
    Viewer,
}

impl Role {
    /// Whether this role may mutate board content.
    pub fn can_edit(&self) -> bool {
        matches!(self, Role::Owner | Role::Editor)
    }
}

/// A pending membership grant, addressed by email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    pub id: InviteId,
    pub board_id: BoardId,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invited_by: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

/// Display data for a roster entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
    pub id: UserId,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// Capability flags for the current viewer, supplied by the caller.
///
/// The interaction layer treats these as readonly input and never computes
/// authorization itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemberCapabilities {
    pub can_edit: bool,
    pub is_owner: bool,
}

impl MemberCapabilities {
    /// Read-write access without ownership.
    pub fn editor() -> Self {
        Self { can_edit: true, is_owner: false }
    }

    /// Full access.
    pub fn owner() -> Self {
        Self { can_edit: true, is_owner: true }
    }

    /// Read-only access.
    pub fn viewer() -> Self {
        Self::default()
    }
}

impl From<Role> for MemberCapabilities {
    fn from(role: Role) -> Self {
        Self {
            can_edit: role.can_edit(),
            is_owner: matches!(role, Role::Owner),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn role_edit_rights() {
        assert!(Role::Owner.can_edit());
        assert!(Role::Editor.can_edit());
        assert!(!Role::Viewer.can_edit());
    }

    #[test]
    fn role_string_round_trip() {
        for role in [Role::Owner, Role::Editor, Role::Viewer] {
            let s = role.to_string();
            assert_eq!(Role::from_str(&s).unwrap(), role);
        }
        assert_eq!(serde_json::to_string(&Role::Viewer).unwrap(), "\"viewer\"");
    }

    #[test]
    fn capabilities_follow_role() {
        let caps = MemberCapabilities::from(Role::Editor);
        assert!(caps.can_edit);
        assert!(!caps.is_owner);
        assert_eq!(MemberCapabilities::from(Role::Owner), MemberCapabilities::owner());
        assert_eq!(MemberCapabilities::from(Role::Viewer), MemberCapabilities::viewer());
    }
}
