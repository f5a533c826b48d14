//! Remote persistence boundary.
//!
//! The hosted document store is an external collaborator: each write is an
//! async call that succeeds or fails as a unit. This module defines the
//! trait the coordinator writes through and the error taxonomy it maps
//! failures into. Implementations live with the backend adapter, mocks live
//! with the tests.

use async_trait::async_trait;
use corkboard_types::{BoardId, Card, CardId, ColumnId};
use thiserror::Error;

/// A failed remote write, as classified by the backend adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistError {
    /// The caller lacks rights for this write (backend security rules).
    #[error("permission denied")]
    PermissionDenied,

    /// The backend could not be reached or timed out.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected the write as invalid.
    #[error("write rejected: {0}")]
    Rejected(String),
}

/// Payload for a remote card creation. Carries the full synthesized entity
/// so the pre-generated id is the one that lands in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateCardInput {
    pub card: Card,
}

/// Payload for a partial remote card update. `None` fields are untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCardInput {
    pub board_id: BoardId,
    pub card_id: CardId,
    pub column_id: Option<ColumnId>,
    pub order: Option<f64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub archived: Option<bool>,
}

/// Payload for a remote card deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteCardInput {
    pub board_id: BoardId,
    pub card_id: CardId,
}

/// Async writes against the hosted document store.
///
/// Column/board writes follow the same shape; only the card surface is
/// needed by the ordering/cache core.
#[async_trait]
pub trait RemotePersistence: Send + Sync {
    async fn create_card(&self, input: &CreateCardInput) -> Result<(), PersistError>;
    async fn update_card(&self, input: &UpdateCardInput) -> Result<(), PersistError>;
    async fn delete_card(&self, input: &DeleteCardInput) -> Result<(), PersistError>;
}
