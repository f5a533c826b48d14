//! Entity normalization — raw persisted documents to plain domain values.
//!
//! The document store returns loosely shaped records: legacy field names,
//! missing fields, provider timestamp objects, arrays with stray non-string
//! members. Normalization absorbs all of that into the typed entities from
//! `corkboard-types` and **never fails**: malformed input degrades to an
//! omitted optional field or a zero default, not an error.
//!
//! Outputs are plain values with no provider references — safe to clone,
//! compare, and serialize.

use corkboard_types::{
    Board, BoardId, Card, Column, Invite, InviteId, MemberProfile, RawDocument,
    RawTimestamp, Role, UserId,
};
use serde_json::Value;

/// Normalize a raw card document into a [`Card`].
pub fn normalize_card(board_id: &BoardId, id: &str, raw: &RawDocument) -> Card {
    Card {
        id: id.into(),
        board_id: board_id.clone(),
        column_id: str_field(raw, "columnId").unwrap_or_default().into(),
        title: str_field(raw, "title").unwrap_or_default(),
        description: str_field(raw, "description"),
        order: float_field(raw, "order").unwrap_or(0.0),
        // Legacy records carried `createdBy` before the Id suffix rename.
        created_by: str_field(raw, "createdById")
            .or_else(|| str_field(raw, "createdBy"))
            .unwrap_or_default()
            .into(),
        assignee_ids: string_array(raw, "assigneeIds")
            .map(|v| v.into_iter().map(UserId::from).collect()),
        labels: string_array(raw, "labels"),
        due_at: millis_field(raw, "dueAt"),
        created_at: millis_field(raw, "createdAt"),
        updated_at: millis_field(raw, "updatedAt"),
        archived: raw.get("archived").and_then(Value::as_bool),
    }
}

/// Normalize a raw column document into a [`Column`].
pub fn normalize_column(board_id: &BoardId, id: &str, raw: &RawDocument) -> Column {
    Column {
        id: id.into(),
        board_id: board_id.clone(),
        title: str_field(raw, "title").unwrap_or_default(),
        order: float_field(raw, "order").unwrap_or(0.0),
        created_at: millis_field(raw, "createdAt"),
        updated_at: millis_field(raw, "updatedAt"),
    }
}

/// Normalize a raw board document into a [`Board`].
pub fn normalize_board(id: &str, raw: &RawDocument) -> Board {
    Board {
        id: id.into(),
        title: str_field(raw, "title").unwrap_or_default(),
        owner_id: str_field(raw, "ownerId")
            .or_else(|| str_field(raw, "owner"))
            .unwrap_or_default()
            .into(),
        member_ids: string_array(raw, "memberIds")
            .map(|v| v.into_iter().map(UserId::from).collect()),
        created_at: millis_field(raw, "createdAt"),
        updated_at: millis_field(raw, "updatedAt"),
    }
}

/// Normalize a raw invite document into an [`Invite`].
///
/// An unparseable role degrades to [`Role::Viewer`] — the least-privileged
/// reading of an unknown grant.
pub fn normalize_invite(board_id: &BoardId, id: &str, raw: &RawDocument) -> Invite {
    let role = str_field(raw, "role")
        .and_then(|s| s.parse::<Role>().ok())
        .unwrap_or(Role::Viewer);
    Invite {
        id: InviteId::from(id),
        board_id: board_id.clone(),
        email: str_field(raw, "email").unwrap_or_default(),
        role,
        invited_by: str_field(raw, "invitedBy").map(UserId::from),
        created_at: millis_field(raw, "createdAt"),
    }
}

/// Normalize a raw profile document into a [`MemberProfile`].
pub fn normalize_member_profile(id: &str, raw: &RawDocument) -> MemberProfile {
    MemberProfile {
        id: UserId::from(id),
        display_name: str_field(raw, "displayName")
            .or_else(|| str_field(raw, "name"))
            .unwrap_or_default(),
        email: str_field(raw, "email"),
        photo_url: str_field(raw, "photoUrl"),
    }
}

// ── Field extraction helpers ────────────────────────────────────────────────

fn str_field(raw: &RawDocument, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(str::to_string)
}

fn float_field(raw: &RawDocument, key: &str) -> Option<f64> {
    raw.get(key).and_then(Value::as_f64).filter(|f| f.is_finite())
}

fn millis_field(raw: &RawDocument, key: &str) -> Option<i64> {
    raw.get(key)
        .and_then(RawTimestamp::from_value)
        .map(|ts| ts.to_millis())
}

/// Keep only string members of an array field; empty-after-filter collapses
/// to `None` ("no data" and "empty but present" are deliberately not
/// distinguished downstream).
fn string_array(raw: &RawDocument, key: &str) -> Option<Vec<String>> {
    let items = raw.get(key)?.as_array()?;
    let strings: Vec<String> = items
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();
    if strings.is_empty() { None } else { Some(strings) }
}
