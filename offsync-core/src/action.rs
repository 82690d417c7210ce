//! Mutating requests recorded while offline.

use std::fmt;

use chrono::{DateTime, Utc};
use http::Method;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// HTTP methods an offline action may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionMethod {
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl ActionMethod {
    /// The matching [`http::Method`].
    pub fn as_method(self) -> Method {
        match self {
            ActionMethod::Post => Method::POST,
            ActionMethod::Put => Method::PUT,
            ActionMethod::Delete => Method::DELETE,
        }
    }
}

impl fmt::Display for ActionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_method().as_str())
    }
}

/// The method is not one an offline action may carry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("method {0} cannot be queued offline")]
pub struct UnsupportedMethod(pub Method);

impl TryFrom<&Method> for ActionMethod {
    type Error = UnsupportedMethod;

    fn try_from(method: &Method) -> Result<Self, Self::Error> {
        match *method {
            Method::POST => Ok(ActionMethod::Post),
            Method::PUT => Ok(ActionMethod::Put),
            Method::DELETE => Ok(ActionMethod::Delete),
            _ => Err(UnsupportedMethod(method.clone())),
        }
    }
}

/// Caller-supplied part of an action, before it gets an id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAction {
    /// Method to replay with.
    pub method: ActionMethod,
    /// Target URL, as the application would have requested it.
    pub url: String,
    /// Optional JSON body.
    pub payload: Option<serde_json::Value>,
}

impl NewAction {
    /// Creates an action description.
    pub fn new(
        method: ActionMethod,
        url: impl Into<String>,
        payload: Option<serde_json::Value>,
    ) -> Self {
        Self {
            method,
            url: url.into(),
            payload,
        }
    }

    /// `POST url` with a JSON body.
    pub fn post(url: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::new(ActionMethod::Post, url, Some(payload))
    }

    /// `PUT url` with a JSON body.
    pub fn put(url: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::new(ActionMethod::Put, url, Some(payload))
    }

    /// `DELETE url` without a body.
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(ActionMethod::Delete, url, None)
    }
}

/// Unique identifier of a queued action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl ActionId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// A mutating request awaiting replay.
///
/// Actions are immutable once enqueued; they leave the queue only by a
/// successful replay or an explicit clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineAction {
    /// Identifier assigned at enqueue.
    pub id: ActionId,
    /// Replay method.
    pub method: ActionMethod,
    /// Replay URL.
    pub url: String,
    /// JSON body, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// When the action was enqueued.
    pub enqueued_at: DateTime<Utc>,
}

impl OfflineAction {
    /// Stamps a new action with a fresh id and the current time.
    pub fn new(action: NewAction) -> Self {
        Self {
            id: ActionId::generate(),
            method: action.method,
            url: action.url,
            payload: action.payload,
            enqueued_at: Utc::now(),
        }
    }
}
