//! Drag interaction state machine.
//!
//! Driven synchronously by gesture callbacks (start / over / end / cancel)
//! from whatever drag library the UI uses. The controller tracks which card
//! is active, which column is hovered, and which sibling sits under the
//! pointer; on drop it reads the destination list from the cache, computes a
//! fractional order for the insertion slot, and hands back a [`MoveCard`]
//! plan for the mutation coordinator.
//!
//! No step here blocks: the plan's remote write is awaited by the caller,
//! and a second drag may start before the first write resolves — each
//! mutation carries its own undo, so interleaving is tolerated.

use corkboard_cache::{next_order, sort_cards_by_order, CacheStore, ViewKey};
use corkboard_types::{BoardId, Card, CardId, ColumnId, MemberCapabilities};
use tracing::{debug, trace};

use crate::mutate::MoveCard;

/// Marker distinguishing column-level drop-zone ids from raw card ids in
/// the gesture library's flat id namespace.
const COLUMN_TARGET_PREFIX: &str = "column:";

/// What the pointer is over, as classified from a drop-target id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// A column-level drop zone — "append to the end of this column".
    Column(ColumnId),
    /// A specific sibling card — "insert at this card's slot".
    Card(CardId),
}

impl DropTarget {
    /// Encode into the gesture library's flat id namespace.
    pub fn encode(&self) -> String {
        match self {
            Self::Column(id) => format!("{COLUMN_TARGET_PREFIX}{id}"),
            Self::Card(id) => id.to_string(),
        }
    }

    /// Classify a raw drop-target id. Reversible with [`encode`](Self::encode).
    pub fn decode(raw: &str) -> Self {
        match raw.strip_prefix(COLUMN_TARGET_PREFIX) {
            Some(column) => Self::Column(ColumnId::from(column)),
            None => Self::Card(CardId::from(raw)),
        }
    }
}

/// Drag payload metadata supplied by the gesture layer at drag start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragPayload {
    pub card_id: CardId,
    /// Source column, when the draggable carried it. Otherwise the
    /// controller looks the card up in the cache.
    pub source_column: Option<ColumnId>,
}

/// Tracks one in-flight drag gesture on a board.
///
/// All four state fields are nullable and always reset together at the end
/// of a gesture, whatever its outcome.
pub struct DragController {
    board_id: BoardId,
    store: CacheStore,
    active_card: Option<CardId>,
    active_column: Option<ColumnId>,
    hovered_column: Option<ColumnId>,
    over_card: Option<CardId>,
}

impl DragController {
    pub fn new(board_id: BoardId, store: CacheStore) -> Self {
        Self {
            board_id,
            store,
            active_card: None,
            active_column: None,
            hovered_column: None,
            over_card: None,
        }
    }

    /// The card currently being dragged, if any.
    pub fn active_card(&self) -> Option<&CardId> {
        self.active_card.as_ref()
    }

    /// The column currently hovered, if any.
    pub fn hovered_column(&self) -> Option<&ColumnId> {
        self.hovered_column.as_ref()
    }

    /// The sibling card under the pointer, if any.
    pub fn over_card(&self) -> Option<&CardId> {
        self.over_card.as_ref()
    }

    /// Begin a drag. Ignored entirely for read-only viewers.
    pub fn drag_start(&mut self, payload: &DragPayload, caps: &MemberCapabilities) {
        if !caps.can_edit {
            trace!(card = %payload.card_id, "drag ignored: viewer cannot edit");
            return;
        }
        let source = payload
            .source_column
            .clone()
            .or_else(|| self.column_of(&payload.card_id));
        self.active_card = Some(payload.card_id.clone());
        self.active_column = source;
    }

    /// Update hover state while dragging.
    pub fn drag_over(&mut self, target: Option<&DropTarget>) {
        match target {
            Some(DropTarget::Column(column)) => {
                self.hovered_column = Some(column.clone());
                self.over_card = None;
            }
            Some(DropTarget::Card(sibling)) => {
                self.hovered_column = self.column_of(sibling);
                self.over_card = Some(sibling.clone());
            }
            None => {
                self.hovered_column = None;
                self.over_card = None;
            }
        }
    }

    /// Finish the drag and, when the drop resolves, plan the move.
    ///
    /// Returns `None` when either side of the move is unresolved — the
    /// source column (card unknown to the cache, no payload metadata) or
    /// the destination column — and for dropping a card on itself within
    /// its own column. Drag state is cleared regardless of outcome; the
    /// caller forwards a returned plan to `MutationCoordinator::move_card`.
    pub fn drag_end(&mut self, target: Option<&DropTarget>) -> Option<MoveCard> {
        let plan = self.resolve_drop(target);
        self.clear();
        plan
    }

    /// Abort the drag without any mutation.
    pub fn drag_cancel(&mut self) {
        self.clear();
    }

    fn resolve_drop(&self, target: Option<&DropTarget>) -> Option<MoveCard> {
        let active_card = self.active_card.clone()?;
        // Both columns must resolve, or the gesture aborts as a no-op.
        let from_column = self.active_column.clone()?;
        let (over_column, over_card) = match target? {
            DropTarget::Column(column) => (Some(column.clone()), None),
            DropTarget::Card(sibling) => (self.column_of(sibling), Some(sibling.clone())),
        };
        let to_column = over_column?;

        // Dropping a card onto itself in its own column is a no-op gesture.
        if let Some(sibling) = &over_card
            && *sibling == active_card
            && from_column == to_column
        {
            return None;
        }

        // Destination list without the dragged card, so neighbor indices
        // refer to the post-removal layout.
        let mut siblings = self.column_cards(&to_column);
        siblings.retain(|c| c.id != active_card);

        // Sibling absent or column-level drop both mean "end of list".
        let slot = over_card
            .as_ref()
            .and_then(|id| siblings.iter().position(|c| c.id == *id))
            .unwrap_or(siblings.len());

        let before = slot.checked_sub(1).map(|i| siblings[i].order);
        let after = siblings.get(slot).map(|c| c.order);
        let order = next_order(before, after);

        debug!(
            card = %active_card,
            to = %to_column,
            slot,
            order,
            "drop resolved to move plan"
        );
        Some(MoveCard {
            board_id: self.board_id.clone(),
            card_id: active_card,
            from_column: Some(from_column),
            to_column,
            order,
        })
    }

    /// Destination card list: the column's own view when cached, otherwise
    /// the board-wide view filtered down.
    fn column_cards(&self, column: &ColumnId) -> Vec<Card> {
        if let Some(cards) = self
            .store
            .get(&ViewKey::column(self.board_id.clone(), column.clone()))
        {
            return cards;
        }
        let mut cards: Vec<_> = self
            .store
            .get(&ViewKey::board(self.board_id.clone()))
            .unwrap_or_default()
            .into_iter()
            .filter(|c| c.column_id == *column)
            .collect();
        sort_cards_by_order(&mut cards);
        cards
    }

    /// Card → column lookup from the current cache.
    fn column_of(&self, card_id: &CardId) -> Option<ColumnId> {
        self.store
            .find_card(&self.board_id, card_id)
            .map(|c| c.column_id)
    }

    fn clear(&mut self) {
        self.active_card = None;
        self.active_column = None;
        self.hovered_column = None;
        self.over_card = None;
    }
}
