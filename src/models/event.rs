//! Inbound event shapes.
//!
//! Storage notifications arrive either flat (`{"bucket", "name"}`) or as an
//! S3 notification with a `Records` array. Control messages arrive in a
//! Pub/Sub style envelope whose `message.data` is base64-encoded JSON.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};

/// Event name sent when the daily announcement has finished.
pub const ANNOUNCEMENT_COMPLETE: &str = "announcement_complete";

/// Literal the publisher uses when no old categories are given.
const NOT_SPECIFIED: &str = "Not specified";

/// A storage object was created, replaced or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageChangeEvent {
    pub bucket: String,
    pub name: String,
}

impl StorageChangeEvent {
    pub fn new(bucket: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            name: name.into(),
        }
    }

    /// Extract the changed objects from a notification payload.
    pub fn from_value(value: &Value) -> Result<Vec<Self>> {
        if let Some(records) = value.get("Records").and_then(Value::as_array) {
            return records.iter().map(Self::from_s3_record).collect();
        }

        let bucket = value.get("bucket").and_then(Value::as_str);
        let name = value.get("name").and_then(Value::as_str);
        match (bucket, name) {
            (Some(bucket), Some(name)) => Ok(vec![Self::new(bucket, name)]),
            _ => Err(AppError::envelope(format!(
                "bad message data format. bucket: {bucket:?}, name: {name:?}, message data: {value}"
            ))),
        }
    }

    fn from_s3_record(record: &Value) -> Result<Self> {
        let bucket = record.pointer("/s3/bucket/name").and_then(Value::as_str);
        let key = record.pointer("/s3/object/key").and_then(Value::as_str);
        match (bucket, key) {
            (Some(bucket), Some(key)) => Ok(Self::new(bucket, key)),
            _ => Err(AppError::envelope(format!(
                "S3 record missing bucket or key: {record}"
            ))),
        }
    }
}

/// Envelope wrapping a base64 JSON payload.
#[derive(Debug, Clone, Deserialize)]
pub struct PubSubEnvelope {
    pub message: PubSubMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PubSubMessage {
    pub data: String,
}

impl PubSubEnvelope {
    /// Decode the payload as JSON.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let bytes = STANDARD.decode(self.message.data.trim())?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Build an envelope around a JSON payload.
    pub fn encode<T: Serialize>(payload: &T) -> Result<Self> {
        let json = serde_json::to_vec(payload)?;
        Ok(Self {
            message: PubSubMessage {
                data: STANDARD.encode(json),
            },
        })
    }
}

/// Request to purge everything related to one paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperPurgeRequest {
    pub paper_id: String,

    /// Categories the paper had before a reclassification
    #[serde(default)]
    pub old_categories: Option<String>,
}

impl PaperPurgeRequest {
    /// Old categories, if the publisher actually specified any.
    pub fn old_categories(&self) -> Option<&str> {
        self.old_categories
            .as_deref()
            .map(str::trim)
            .filter(|cats| !cats.is_empty() && *cats != NOT_SPECIFIED)
    }
}

/// Decoded control message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ControlMessage {
    PaperPurge(PaperPurgeRequest),
    Event {
        event: String,
        /// Mailing date the event refers to
        #[serde(default)]
        date: Option<NaiveDate>,
    },
}

/// What an inbound payload asks the purger to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Storage objects changed
    Objects(Vec<StorageChangeEvent>),
    /// A control message arrived
    Control(ControlMessage),
}

impl Invocation {
    /// Route a raw payload.
    ///
    /// Enveloped payloads are unwrapped first; the decoded body may itself
    /// be a storage notification.
    pub fn from_value(value: &Value) -> Result<Self> {
        if value.get("message").is_some() {
            let envelope: PubSubEnvelope = serde_json::from_value(value.clone())
                .map_err(|e| AppError::envelope(format!("bad envelope: {e}")))?;
            let body: Value = envelope.decode()?;
            return Self::from_body(&body);
        }
        Self::from_body(value)
    }

    fn from_body(body: &Value) -> Result<Self> {
        if body.get("Records").is_some() || body.get("bucket").is_some() {
            return Ok(Self::Objects(StorageChangeEvent::from_value(body)?));
        }
        serde_json::from_value(body.clone())
            .map(Self::Control)
            .map_err(|_| AppError::envelope(format!("unrecognized message: {body}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_notification() {
        let events =
            StorageChangeEvent::from_value(&json!({"bucket": "b", "name": "x/y.pdf"})).unwrap();
        assert_eq!(events, vec![StorageChangeEvent::new("b", "x/y.pdf")]);
    }

    #[test]
    fn test_s3_notification() {
        let value = json!({"Records": [
            {"s3": {"bucket": {"name": "data"}, "object": {"key": "ps_cache/cs/pdf/0005/0005003v1.pdf"}}}
        ]});
        let events = StorageChangeEvent::from_value(&value).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].bucket, "data");
        assert_eq!(events[0].name, "ps_cache/cs/pdf/0005/0005003v1.pdf");
    }

    #[test]
    fn test_missing_name_is_envelope_error() {
        let err = StorageChangeEvent::from_value(&json!({"bucket": "b"})).unwrap_err();
        assert!(matches!(err, AppError::Envelope(_)));
    }

    #[test]
    fn test_envelope_round_trip_control_messages() {
        let envelope = PubSubEnvelope::encode(&json!({"event": "announcement_complete"})).unwrap();
        let message: ControlMessage = envelope.decode().unwrap();
        assert_eq!(
            message,
            ControlMessage::Event {
                event: ANNOUNCEMENT_COMPLETE.to_string(),
                date: None,
            }
        );

        let envelope = PubSubEnvelope::encode(
            &json!({"event": "announcement_complete", "date": "2024-05-13"}),
        )
        .unwrap();
        let message: ControlMessage = envelope.decode().unwrap();
        assert_eq!(
            message,
            ControlMessage::Event {
                event: ANNOUNCEMENT_COMPLETE.to_string(),
                date: NaiveDate::from_ymd_opt(2024, 5, 13),
            }
        );

        let envelope = PubSubEnvelope::encode(
            &json!({"paper_id": "1205.1234", "old_categories": "hep-lat cs.NA"}),
        )
        .unwrap();
        let message: ControlMessage = envelope.decode().unwrap();
        let ControlMessage::PaperPurge(request) = message else {
            panic!("expected a paper purge request");
        };
        assert_eq!(request.old_categories(), Some("hep-lat cs.NA"));
    }

    #[test]
    fn test_not_specified_old_categories() {
        let request = PaperPurgeRequest {
            paper_id: "1205.1234".to_string(),
            old_categories: Some("Not specified".to_string()),
        };
        assert_eq!(request.old_categories(), None);
    }

    #[test]
    fn test_route_enveloped_storage_notification() {
        let envelope = PubSubEnvelope::encode(&json!({"bucket": "b", "name": "x.pdf"})).unwrap();
        let value = json!({"message": {"data": envelope.message.data}});
        assert_eq!(
            Invocation::from_value(&value).unwrap(),
            Invocation::Objects(vec![StorageChangeEvent::new("b", "x.pdf")])
        );
    }

    #[test]
    fn test_route_control_message() {
        let envelope = PubSubEnvelope::encode(&json!({"paper_id": "1205.1234"})).unwrap();
        let value = json!({"message": {"data": envelope.message.data}});
        let Invocation::Control(ControlMessage::PaperPurge(request)) =
            Invocation::from_value(&value).unwrap()
        else {
            panic!("expected a paper purge request");
        };
        assert_eq!(request.paper_id, "1205.1234");
        assert_eq!(request.old_categories(), None);
    }

    #[test]
    fn test_route_unrecognized() {
        assert!(matches!(
            Invocation::from_value(&json!({"hello": "world"})),
            Err(AppError::Envelope(_))
        ));
        assert!(matches!(
            Invocation::from_value(&json!({"message": {}})),
            Err(AppError::Envelope(_))
        ));
    }

    #[test]
    fn test_bad_base64() {
        let envelope: PubSubEnvelope =
            serde_json::from_value(json!({"message": {"data": "%%%"}})).unwrap();
        assert!(matches!(
            envelope.decode::<ControlMessage>(),
            Err(AppError::Base64(_))
        ));
    }
}
