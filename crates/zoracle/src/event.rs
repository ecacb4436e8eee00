use alloy_primitives::Bytes;
use serde::{Deserialize, Serialize};

use crate::{RequestId, ResolveStatus};

/// Event type emitted for every resolved request.
pub const EVENT_TYPE_REQUEST_EXECUTE: &str = "request_execute";
/// Attribute carrying the request id.
pub const ATTRIBUTE_KEY_REQUEST_ID: &str = "request_id";
/// Attribute carrying the numeric resolve status.
pub const ATTRIBUTE_KEY_RESOLVE_STATUS: &str = "resolve_status";
/// Attribute carrying the hex encoded result. Present on success only.
pub const ATTRIBUTE_KEY_RESULT: &str = "result";

/// Notification of a request's terminal transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveEvent {
    /// The resolved request.
    pub request_id: RequestId,
    /// The terminal status the request moved to.
    pub resolve_status: ResolveStatus,
    /// The stored result, present iff the status is `Success`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Bytes>,
}

impl ResolveEvent {
    /// A request resolved with a result.
    pub fn success(request_id: RequestId, result: Bytes) -> Self {
        Self { request_id, resolve_status: ResolveStatus::Success, result: Some(result) }
    }

    /// A request resolved without a result.
    pub fn failure(request_id: RequestId) -> Self {
        Self { request_id, resolve_status: ResolveStatus::Failure, result: None }
    }

    /// The event type.
    pub const fn kind(&self) -> &'static str {
        EVENT_TYPE_REQUEST_EXECUTE
    }

    /// Flattens the event into string attributes, in a fixed order.
    pub fn attributes(&self) -> Vec<EventAttribute> {
        let mut attributes = vec![
            EventAttribute::new(ATTRIBUTE_KEY_REQUEST_ID, self.request_id.to_string()),
            EventAttribute::new(
                ATTRIBUTE_KEY_RESOLVE_STATUS,
                self.resolve_status.code().to_string(),
            ),
        ];
        if let Some(result) = &self.result {
            attributes.push(EventAttribute::new(ATTRIBUTE_KEY_RESULT, result.to_string()));
        }
        attributes
    }
}

/// A key/value pair of an emitted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventAttribute {
    /// Attribute key.
    pub key: &'static str,
    /// Attribute value.
    pub value: String,
}

impl EventAttribute {
    fn new(key: &'static str, value: String) -> Self {
        Self { key, value }
    }
}
