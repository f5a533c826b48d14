//! Board domain model — the top-level container with a member roster.

use serde::{Deserialize, Serialize};

use crate::ids::{BoardId, UserId};

/// A top-level container of columns/cards with an owner and member roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: BoardId,
    pub title: String,
    pub owner_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_ids: Option<Vec<UserId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl Board {
    /// Whether the given user appears in the roster (owner counts).
    pub fn has_member(&self, user: &UserId) -> bool {
        if self.owner_id == *user {
            return true;
        }
        self.member_ids
            .as_deref()
            .is_some_and(|m| m.contains(user))
    }
}
