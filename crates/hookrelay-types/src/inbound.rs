//! The inbound webhook event as seen by the dispatcher.

use std::collections::BTreeMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Body `type` that short-circuits dispatch with a challenge echo.
pub const URL_VERIFICATION: &str = "url_verification";

/// An HTTP-style request received on an event path.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    /// Path as received (normalized later by the resolver).
    pub path: String,
    /// Header names are stored lower-cased.
    headers: BTreeMap<String, String>,
    /// Exact bytes received; signatures are computed over these.
    pub raw_body: Bytes,
    /// Parsed JSON body, `Value::Null` when the body is not JSON.
    pub body: Value,
    pub received_at: DateTime<Utc>,
}

impl InboundEvent {
    pub fn new(path: impl Into<String>, raw_body: impl Into<Bytes>) -> Self {
        let raw_body = raw_body.into();
        let body = serde_json::from_slice(&raw_body).unwrap_or(Value::Null);
        Self {
            path: path.into(),
            headers: BTreeMap::new(),
            raw_body,
            body,
            received_at: Utc::now(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_headers<'a>(mut self, headers: impl IntoIterator<Item = (&'a str, String)>) -> Self {
        for (name, value) in headers {
            self.headers.insert(name.to_ascii_lowercase(), value);
        }
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// The body's top-level `type`.
    pub fn event_type(&self) -> Option<&str> {
        self.body.get("type").and_then(Value::as_str)
    }

    /// The sub-type that trigger nodes subscribe to (`event.type`).
    pub fn sub_type(&self) -> Option<&str> {
        self.body
            .get("event")
            .and_then(|e| e.get("type"))
            .and_then(Value::as_str)
    }

    /// The challenge token of a `url_verification` request.
    pub fn challenge(&self) -> Option<&Value> {
        self.body.get("challenge")
    }

    pub fn is_url_verification(&self) -> bool {
        self.event_type() == Some(URL_VERIFICATION)
    }
}
