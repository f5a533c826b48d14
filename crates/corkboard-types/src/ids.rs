//! Typed identifiers for boards, columns, cards, users, and invites.
//!
//! All ID types wrap an opaque string. Locally generated ids use UUIDv7 hex
//! (time-ordered), but ids minted elsewhere — the hosted document store, an
//! import path, a test fixture — pass through untouched. Keeping the inner
//! representation a string means a client can reference a freshly created
//! entity before the remote write confirms.
//!
//! `ColumnId` additionally admits the empty string, meaning "unassigned":
//! a card that exists on a board but has not been placed into a lane yet.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A board identifier.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardId(String);

/// A column identifier. May be empty ("unassigned").
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnId(String);

/// A card identifier.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

/// A user (member) identifier.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

/// An invite identifier.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InviteId(String);

// ── Shared behavior ─────────────────────────────────────────────────────────

macro_rules! impl_typed_id {
    ($T:ident, $name:literal) => {
        impl $T {
            /// Mint a new time-ordered id (UUIDv7, simple hex form).
            pub fn generate() -> Self {
                Self(uuid::Uuid::now_v7().as_simple().to_string())
            }

            /// The raw string form.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Leading display prefix (8 bytes, backed off to a char
            /// boundary for foreign non-ASCII ids) — for humans, not lookup.
            pub fn short(&self) -> &str {
                let mut end = self.0.len().min(8);
                while !self.0.is_char_boundary(end) {
                    end -= 1;
                }
                &self.0[..end]
            }

            /// Whether the id is the empty string.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl From<String> for $T {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $T {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl fmt::Display for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl fmt::Debug for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($name, "({})"), self.0)
            }
        }
    };
}

impl_typed_id!(BoardId, "BoardId");
impl_typed_id!(ColumnId, "ColumnId");
impl_typed_id!(CardId, "CardId");
impl_typed_id!(UserId, "UserId");
impl_typed_id!(InviteId, "InviteId");

impl ColumnId {
    /// The "no column yet" sentinel.
    pub fn unassigned() -> Self {
        Self(String::new())
    }

    /// Whether this card slot is unassigned (empty id).
    pub fn is_unassigned(&self) -> bool {
        self.0.is_empty()
    }
}
