//! Column domain model — an ordered lane within a board.

use serde::{Deserialize, Serialize};

use crate::ids::{BoardId, ColumnId};
use crate::now_millis;

/// An ordered lane within a board holding cards.
///
/// Columns use the same fractional ordering scheme as cards, scoped to the
/// board. A new column's order is seeded from the wall clock so that columns
/// created in sequence land at the end without consulting siblings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    pub board_id: BoardId,
    pub title: String,
    /// Fractional sort key within the board.
    pub order: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

impl Column {
    /// Create a new column with a generated id and wall-clock order.
    pub fn new(board_id: BoardId, title: impl Into<String>) -> Self {
        Self {
            id: ColumnId::generate(),
            board_id,
            title: title.into(),
            order: now_millis() as f64,
            created_at: None,
            updated_at: None,
        }
    }
}
