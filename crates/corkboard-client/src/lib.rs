//! Optimistic mutations and drag interaction for Corkboard clients.
//!
//! Sits between the UI gesture layer and the remote document store:
//!
//! ```text
//! gesture events ──► DragController ──► MoveCard plan
//!                                          │
//!                                          ▼
//!                    MutationCoordinator ──► patch CacheStore (optimistic)
//!                                          └─► remote write ── ok: feed supersedes
//!                                                            └─ err: undo + surface
//! ```
//!
//! The cache is always ahead of server truth while a write is in flight;
//! convergence comes from the live feed's wholesale resync on success and
//! from the version-guarded undo on failure.

pub mod drag;
pub mod mutate;
pub mod persist;

pub use drag::{DragController, DragPayload, DropTarget};
pub use mutate::{CardDraft, MoveCard, MoveOutcome, MutationCoordinator, MutationError};
pub use persist::{
    CreateCardInput, DeleteCardInput, PersistError, RemotePersistence, UpdateCardInput,
};
