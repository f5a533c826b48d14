//! Shared identity and board/card types for Corkboard.
//!
//! This crate is the relational foundation: typed IDs, boards, columns,
//! cards, membership, and the raw-record types that sit at the persistence
//! boundary. It has **no internal corkboard dependencies** — a pure leaf
//! crate that other crates build on.
//!
//! # Entity-Relationship Overview
//!
//! ```text
//! Board (BoardId)
//!     └── owned by a member (UserId, Role::Owner)
//!     └── contains Column (ColumnId, fractional order)
//!     └── extends membership via Invite (InviteId → Role)
//!
//! Column (ColumnId)
//!     └── ordered lane within a board
//!     └── holds Card (CardId, fractional order)
//!
//! Card (CardId)
//!     └── belongs to exactly one column (possibly unassigned)
//!     └── authored by a member (UserId)
//! ```
//!
//! # Key Types
//!
//! |----------------------|---------------------------------------------|
//! | Type                 | Purpose                                     |
//! |----------------------|---------------------------------------------|
//! | [`Card`]             | Unit of work on a board                     |
//! | [`Column`]           | Ordered lane holding cards                  |
//! | [`Board`]            | Top-level container with a member roster    |
//! | [`Role`]             | Owner / Editor / Viewer membership level    |
//! | [`Invite`]           | Pending membership grant                    |
//! | [`MemberProfile`]    | Display data for a roster entry             |
//! | [`RawDocument`]      | Untyped persisted record (normalizer input) |
//! | [`RawTimestamp`]     | Provider timestamp adapter                  |
//! |----------------------|---------------------------------------------|

pub mod board;
pub mod card;
pub mod column;
pub mod ids;
pub mod member;
pub mod raw;

// Re-export primary types at crate root for convenience.
pub use board::Board;
pub use card::Card;
pub use column::Column;
pub use ids::{BoardId, CardId, ColumnId, InviteId, UserId};
pub use member::{Invite, MemberCapabilities, MemberProfile, Role};
pub use raw::{RawDocument, RawTimestamp};

/// Current time as Unix milliseconds. Used by constructors throughout the crate.
pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
