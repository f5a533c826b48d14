//! Optimistic client cache and fractional-ordering engine for Corkboard.
//!
//! This crate is the structural core behind drag-and-drop: a pure fractional
//! order calculator, a tolerant normalizer from raw persisted documents to
//! domain entities, and an in-memory, subscription-based [`CacheStore`]
//! holding overlapping query views with value-captured, version-guarded undo.
//!
//! # Data flow
//!
//! ```text
//! live feed snapshot ──► normalize ──► CacheStore (authoritative replace)
//!                                          ▲  │
//!                optimistic patch + undo ──┘  └──► broadcast to subscribers
//! ```
//!
//! The store never merges: a feed snapshot replaces a view wholesale, which
//! is what ultimately reconciles optimistic patches with ground truth.

pub mod dates;
pub mod normalize;
pub mod ordering;
pub mod views;

pub use dates::{date_to_millis, format_date_input, parse_date_input};
pub use normalize::{
    normalize_board, normalize_card, normalize_column, normalize_invite,
    normalize_member_profile,
};
pub use ordering::{next_order, next_order_at, ORDER_GAP};
pub use views::{
    sort_cards_by_order, CacheStore, FeedHandle, FeedSink, LiveFeed, Undo, ViewKey,
    ViewSubscription,
};
