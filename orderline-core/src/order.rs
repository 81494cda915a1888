//! The order record moved through every layer.
//!
//! An [`Order`] is deserialized from the streaming source, validated, written
//! to durable storage and cached. Only `order_uid` and `data` are required;
//! the payload itself is opaque and never inspected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Opaque order payload.
pub type OrderData = Map<String, Value>;

/// An order record.
///
/// Field names match the JSON wire form produced by upstream publishers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order identifier (the cache and storage key).
    #[serde(default)]
    pub order_uid: String,

    /// Optional display label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_number: Option<String>,

    /// Creation time. Filled in with the validation time when absent.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Order payload. `None` covers both a missing and a `null` field.
    #[serde(default)]
    pub data: Option<OrderData>,
}

impl Order {
    /// Create a new order with the given id and payload.
    pub fn new(order_uid: impl Into<String>, data: OrderData) -> Self {
        Self {
            order_uid: order_uid.into(),
            track_number: None,
            created_at: None,
            data: Some(data),
        }
    }

    /// Set the track number.
    pub fn with_track_number(mut self, track_number: impl Into<String>) -> Self {
        self.track_number = Some(track_number.into());
        self
    }

    /// Set the creation time.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Decode an order from its serialized wire form.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Check the record invariant and normalise the creation time.
    ///
    /// A record is valid when `order_uid` is non-empty and `data` is present.
    /// A missing creation time, or one at or before the Unix epoch (the zero
    /// value some producers emit), is replaced with the current UTC time.
    /// Calling this more than once is harmless.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        self.check()?;
        if self.created_at.map_or(true, |ts| ts.timestamp() <= 0) {
            self.created_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Check the record invariant without modifying the order.
    pub fn check(&self) -> Result<(), ValidationError> {
        if self.order_uid.is_empty() {
            return Err(ValidationError::missing("order_uid"));
        }
        if self.data.is_none() {
            return Err(ValidationError::missing("data"));
        }
        Ok(())
    }

    /// Whether the record invariant holds.
    pub fn is_valid(&self) -> bool {
        self.check().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn payload() -> OrderData {
        let mut data = OrderData::new();
        data.insert("x".to_string(), json!(1));
        data
    }

    #[test]
    fn test_empty_order_is_invalid() {
        let mut order = Order {
            order_uid: String::new(),
            track_number: None,
            created_at: None,
            data: None,
        };
        assert_eq!(
            order.validate(),
            Err(ValidationError::missing("order_uid"))
        );
    }

    #[test]
    fn test_missing_data_is_invalid() {
        let mut order = Order {
            order_uid: "u".to_string(),
            track_number: None,
            created_at: None,
            data: None,
        };
        assert_eq!(order.validate(), Err(ValidationError::missing("data")));
    }

    #[test]
    fn test_valid_order_gets_created_at() {
        let mut order = Order::new("u", payload());
        assert!(order.validate().is_ok());
        assert!(order.created_at.is_some());
    }

    #[test]
    fn test_explicit_created_at_is_kept() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut order = Order::new("u", payload()).with_created_at(ts);
        order.validate().unwrap();
        assert_eq!(order.created_at, Some(ts));
    }

    #[test]
    fn test_zero_created_at_is_replaced() {
        let mut order: Order = serde_json::from_value(json!({
            "order_uid": "u",
            "created_at": "0001-01-01T00:00:00Z",
            "data": {"a": 1}
        }))
        .unwrap();
        order.validate().unwrap();
        assert!(order.created_at.unwrap().timestamp() > 0);
    }

    #[test]
    fn test_decode_null_data() {
        let order = Order::from_slice(br#"{"order_uid":"u","data":null}"#).unwrap();
        assert!(order.data.is_none());
        assert!(!order.is_valid());
    }

    #[test]
    fn test_decode_missing_uid() {
        let order = Order::from_slice(br#"{"data":{"a":1}}"#).unwrap();
        assert!(order.order_uid.is_empty());
        assert!(!order.is_valid());
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(Order::from_slice(b"not json").is_err());
    }

    #[test]
    fn test_track_number_omitted_when_absent() {
        let order = Order::new("u", payload());
        let json = serde_json::to_string(&order).unwrap();
        assert!(!json.contains("track_number"));

        let json = serde_json::to_string(&order.with_track_number("WBILM")).unwrap();
        assert!(json.contains("\"track_number\":\"WBILM\""));
    }
}
