//! Raw persisted records and the provider timestamp adapter.
//!
//! The hosted document store hands back loosely shaped JSON objects whose
//! timestamp fields are provider-specific structures, not plain integers.
//! [`RawTimestamp`] is the explicit adapter for those shapes: detection is a
//! tagged match at this boundary, so the normalizer depends on one "extract
//! millis" operation instead of sniffing shapes inline.

use serde_json::Value;

/// An untyped persisted record, as delivered by the live feed.
pub type RawDocument = serde_json::Map<String, Value>;

/// A provider timestamp in one of the shapes seen on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTimestamp {
    /// Already a plain epoch-milliseconds integer.
    Millis(i64),
    /// Seconds + nanoseconds pair (document-store server timestamps).
    Epoch { seconds: i64, nanos: u32 },
}

impl RawTimestamp {
    /// Detect a timestamp in a raw JSON value.
    ///
    /// Accepts a plain integer (millis), or an object carrying
    /// `seconds`/`nanoseconds` (with or without a leading underscore, which
    /// some SDK serializations add). Anything else is `None` — callers omit
    /// the field rather than erroring.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Millis),
            Value::Object(obj) => {
                let seconds = int_field(obj, "seconds").or_else(|| int_field(obj, "_seconds"))?;
                let nanos = int_field(obj, "nanoseconds")
                    .or_else(|| int_field(obj, "_nanoseconds"))
                    .unwrap_or(0);
                Some(Self::Epoch {
                    seconds,
                    nanos: nanos.clamp(0, 999_999_999) as u32,
                })
            }
            _ => None,
        }
    }

    /// The timestamp as plain epoch milliseconds.
    pub fn to_millis(&self) -> i64 {
        match *self {
            Self::Millis(ms) => ms,
            Self::Epoch { seconds, nanos } => seconds * 1000 + i64::from(nanos) / 1_000_000,
        }
    }
}

fn int_field(obj: &RawDocument, key: &str) -> Option<i64> {
    obj.get(key)?.as_i64()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn plain_integer_is_millis() {
        let ts = RawTimestamp::from_value(&json!(1_700_000_000_123i64)).unwrap();
        assert_eq!(ts.to_millis(), 1_700_000_000_123);
    }

    #[test]
    fn seconds_nanos_object_converts() {
        let ts =
            RawTimestamp::from_value(&json!({"seconds": 1_700_000_000, "nanoseconds": 500_000_000}))
                .unwrap();
        assert_eq!(ts.to_millis(), 1_700_000_000_500);
    }

    #[test]
    fn underscored_sdk_shape_converts() {
        let ts = RawTimestamp::from_value(&json!({"_seconds": 10, "_nanoseconds": 2_000_000}))
            .unwrap();
        assert_eq!(ts.to_millis(), 10_002);
    }

    #[test]
    fn missing_nanos_defaults_to_zero() {
        let ts = RawTimestamp::from_value(&json!({"seconds": 42})).unwrap();
        assert_eq!(ts.to_millis(), 42_000);
    }

    #[test]
    fn foreign_shapes_are_rejected_not_errors() {
        assert_eq!(RawTimestamp::from_value(&json!("2024-01-01")), None);
        assert_eq!(RawTimestamp::from_value(&json!({"iso": "2024-01-01"})), None);
        assert_eq!(RawTimestamp::from_value(&json!(null)), None);
        assert_eq!(RawTimestamp::from_value(&json!([1, 2])), None);
        assert_eq!(RawTimestamp::from_value(&json!(1.5)), None);
    }
}
