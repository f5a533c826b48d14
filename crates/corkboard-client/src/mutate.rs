//! The optimistic mutation coordinator.
//!
//! Every mutation walks the same state machine:
//!
//! ```text
//! Idle ──patch views──► Patched ──remote ok───► Confirmed (feed supersedes)
//!                          │
//!                          └──remote err──► RolledBack (undo + surface error)
//! ```
//!
//! The coordinator patches every cache view the card could plausibly belong
//! to — the board-wide view, the source column, the destination column, and
//! any other column view currently cached — before awaiting the remote
//! write. Success needs no follow-up: the live feed's next snapshot replaces
//! the optimistic values with ground truth. Failure reverts exactly the
//! views that were patched, then re-raises the error to the caller.
//!
//! A view the card is missing from (stale cache) is skipped, not an error;
//! the remote write still proceeds and the next resync corrects divergence.

use std::sync::Arc;

use corkboard_cache::{next_order, sort_cards_by_order, CacheStore, Undo, ViewKey};
use corkboard_types::{BoardId, Card, CardId, ColumnId, UserId};
use thiserror::Error;
use tracing::{debug, warn};

use crate::persist::{
    CreateCardInput, DeleteCardInput, PersistError, RemotePersistence, UpdateCardInput,
};

/// A mutation that failed remotely, after its optimistic patch was undone.
#[derive(Error, Debug)]
pub enum MutationError {
    #[error("remote {op} failed (local changes rolled back): {source}")]
    Remote {
        op: &'static str,
        #[source]
        source: PersistError,
    },
}

/// Caller-supplied fields for a new card.
#[derive(Debug, Clone, Default)]
pub struct CardDraft {
    pub title: String,
    pub description: Option<String>,
    /// Explicit sort key; defaults to the wall-clock append key.
    pub order: Option<f64>,
    pub due_at: Option<i64>,
    pub labels: Option<Vec<String>>,
    pub assignee_ids: Option<Vec<UserId>>,
}

/// A planned move: re-parent and/or reorder one card.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveCard {
    pub board_id: BoardId,
    pub card_id: CardId,
    /// Source column when the gesture layer knows it.
    pub from_column: Option<ColumnId>,
    pub to_column: ColumnId,
    pub order: f64,
}

/// What a move request actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Views patched and remote write confirmed.
    Applied,
    /// Destination equals the card's current position: nothing patched,
    /// nothing written.
    Noop,
}

/// Wraps remote writes with optimistic multi-view cache patches and
/// rollback.
#[derive(Clone)]
pub struct MutationCoordinator {
    store: CacheStore,
    remote: Arc<dyn RemotePersistence>,
}

impl MutationCoordinator {
    pub fn new(store: CacheStore, remote: Arc<dyn RemotePersistence>) -> Self {
        Self { store, remote }
    }

    /// The cache store this coordinator patches.
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Create a card optimistically.
    ///
    /// The id is minted locally so the returned [`Card`] is referenceable
    /// before the server responds. The card is pushed into the board-wide
    /// view and inserted-then-sorted into its destination column's view.
    pub async fn create_card(
        &self,
        board_id: BoardId,
        column_id: ColumnId,
        author: &UserId,
        draft: CardDraft,
    ) -> Result<Card, MutationError> {
        let mut card = Card::new(
            board_id.clone(),
            column_id.clone(),
            draft.title,
            author.clone(),
        );
        card.description = draft.description;
        card.due_at = draft.due_at;
        card.labels = draft.labels;
        card.assignee_ids = draft.assignee_ids;
        card.order = draft.order.unwrap_or_else(|| next_order(None, None));

        let mut undo = self.store.patch(&ViewKey::board(board_id.clone()), {
            let card = card.clone();
            move |cards| cards.push(card)
        });
        if !column_id.is_unassigned() {
            undo.merge(self.store.patch(&ViewKey::column(board_id, column_id), {
                let card = card.clone();
                move |cards| {
                    cards.push(card);
                    sort_cards_by_order(cards);
                }
            }));
        }
        debug!(card = %card.id, views = undo.len(), "optimistic create");

        match self.remote.create_card(&CreateCardInput { card: card.clone() }).await {
            Ok(()) => Ok(card),
            Err(source) => {
                warn!(card = %card.id, error = %source, "create failed; rolling back");
                undo.revert();
                Err(MutationError::Remote { op: "create", source })
            }
        }
    }

    /// Move a card to `(to_column, order)`, optimistically.
    ///
    /// Short-circuits to [`MoveOutcome::Noop`] — zero patches, zero remote
    /// writes — when the destination exactly equals the card's current
    /// cached position.
    pub async fn move_card(&self, plan: MoveCard) -> Result<MoveOutcome, MutationError> {
        let MoveCard { board_id, card_id, from_column, to_column, order } = plan;
        let current = self.store.find_card(&board_id, &card_id);

        if let Some(cur) = &current
            && cur.column_id == to_column
            && cur.order == order
        {
            debug!(card = %card_id, "move is a no-op; skipping patch and write");
            return Ok(MoveOutcome::Noop);
        }

        let mut undo = Undo::empty();

        // Board-wide view: update in place (skip when the card isn't there).
        let board_key = ViewKey::board(board_id.clone());
        if self.card_in_view(&board_key, &card_id) {
            undo.merge(self.store.patch(&board_key, {
                let card_id = card_id.clone();
                let to = to_column.clone();
                move |cards| {
                    if let Some(c) = cards.iter_mut().find(|c| c.id == card_id) {
                        c.column_id = to;
                        c.order = order;
                    }
                }
            }));
        }

        // Candidate column views: everything cached for this board, plus the
        // declared source and destination.
        let mut candidates = self.store.active_columns(&board_id);
        for extra in from_column.iter().chain(std::iter::once(&to_column)) {
            if !candidates.contains(extra) {
                candidates.push(extra.clone());
            }
        }

        for column in candidates {
            if column.is_unassigned() {
                continue;
            }
            let key = ViewKey::column(board_id.clone(), column.clone());
            let Some(list) = self.store.get(&key) else {
                // Not cached — nothing to patch, resync will cover it.
                continue;
            };
            let present = list.iter().any(|c| c.id == card_id);

            if column == to_column {
                // Destination: update in place or insert the cached entity,
                // then resort. Entity unknown and absent → skip.
                if !present && current.is_none() {
                    continue;
                }
                let card_id = card_id.clone();
                let to = to_column.clone();
                let fallback = current.clone();
                undo.merge(self.store.patch(&key, move |cards| {
                    if let Some(c) = cards.iter_mut().find(|c| c.id == card_id) {
                        c.column_id = to;
                        c.order = order;
                    } else if let Some(mut c) = fallback {
                        c.column_id = to;
                        c.order = order;
                        cards.push(c);
                    }
                    sort_cards_by_order(cards);
                }));
            } else if present {
                // Any other column (including the source): remove.
                let card_id = card_id.clone();
                undo.merge(
                    self.store.patch(&key, move |cards| cards.retain(|c| c.id != card_id)),
                );
            }
        }
        debug!(card = %card_id, views = undo.len(), "optimistic move");

        let input = UpdateCardInput {
            board_id,
            card_id: card_id.clone(),
            column_id: Some(to_column),
            order: Some(order),
            title: None,
            description: None,
            archived: None,
        };
        match self.remote.update_card(&input).await {
            Ok(()) => Ok(MoveOutcome::Applied),
            Err(source) => {
                warn!(card = %card_id, error = %source, "move failed; rolling back");
                undo.revert();
                Err(MutationError::Remote { op: "move", source })
            }
        }
    }

    /// Delete a card optimistically from every view it appears in.
    pub async fn delete_card(
        &self,
        board_id: BoardId,
        card_id: &CardId,
    ) -> Result<(), MutationError> {
        let mut undo = Undo::empty();

        let board_key = ViewKey::board(board_id.clone());
        if self.card_in_view(&board_key, card_id) {
            let id = card_id.clone();
            undo.merge(self.store.patch(&board_key, move |cards| cards.retain(|c| c.id != id)));
        }
        for column in self.store.active_columns(&board_id) {
            let key = ViewKey::column(board_id.clone(), column);
            if self.card_in_view(&key, card_id) {
                let id = card_id.clone();
                undo.merge(self.store.patch(&key, move |cards| cards.retain(|c| c.id != id)));
            }
        }
        debug!(card = %card_id, views = undo.len(), "optimistic delete");

        let input = DeleteCardInput { board_id, card_id: card_id.clone() };
        match self.remote.delete_card(&input).await {
            Ok(()) => Ok(()),
            Err(source) => {
                warn!(card = %card_id, error = %source, "delete failed; rolling back");
                undo.revert();
                Err(MutationError::Remote { op: "delete", source })
            }
        }
    }

    fn card_in_view(&self, key: &ViewKey, card_id: &CardId) -> bool {
        self.store
            .get(key)
            .is_some_and(|list| list.iter().any(|c| c.id == *card_id))
    }
}
