//! Card domain model.
//!
//! A card is the unit of work on a board. It belongs to exactly one column
//! (possibly the unassigned sentinel) and carries a floating-point `order`
//! used as its fractional sort key within that column.
//!
//! Invariant: within one column no two visible cards should compare equal
//! under `order` in steady state; transient ties are tolerated and resolved
//! by stable sort until the next reorder separates them.

use serde::{Deserialize, Serialize};

use crate::ids::{BoardId, CardId, ColumnId, UserId};
use crate::now_millis;

/// The unit of work tracked on a board.
///
/// Optional fields are genuinely optional on the wire: `None` is serialized
/// as an absent field, matching the persisted document shape. "Empty but
/// present" collections are collapsed to absent by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub board_id: BoardId,
    /// Owning column. May be the unassigned sentinel (empty id).
    pub column_id: ColumnId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Fractional sort key within the owning column.
    pub order: f64,
    pub created_by: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_ids: Option<Vec<UserId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    /// Unix epoch milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
}

impl Card {
    /// Create a new card with a generated id and a wall-clock-seeded order.
    ///
    /// The time-derived initial order keeps "append to end" monotone without
    /// consulting siblings; see the order calculator in the cache crate.
    pub fn new(
        board_id: BoardId,
        column_id: ColumnId,
        title: impl Into<String>,
        created_by: UserId,
    ) -> Self {
        Self::with_id(CardId::generate(), board_id, column_id, title, created_by)
    }

    /// Create a card with a caller-provided id.
    ///
    /// Used by the optimistic create path, which mints the id before the
    /// remote write so the UI can reference the card immediately.
    pub fn with_id(
        id: CardId,
        board_id: BoardId,
        column_id: ColumnId,
        title: impl Into<String>,
        created_by: UserId,
    ) -> Self {
        Self {
            id,
            board_id,
            column_id,
            title: title.into(),
            description: None,
            order: now_millis() as f64,
            created_by,
            assignee_ids: None,
            labels: None,
            due_at: None,
            created_at: None,
            updated_at: None,
            archived: None,
        }
    }

    /// Whether this card should be shown on the board.
    pub fn is_visible(&self) -> bool {
        !self.archived.unwrap_or(false)
    }
}
