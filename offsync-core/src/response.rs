//! Stored HTTP responses.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode};
use serde::{Deserialize, Serialize};

/// A fully buffered response as kept in a cache bucket.
///
/// Serialized through a flat representation (status as `u16`, headers as
/// name/value pairs, body as raw bytes) so both JSON and binary formats can
/// carry it. Repeated header names are preserved in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawResponse", into = "RawResponse")]
pub struct CachedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    stored_at: DateTime<Utc>,
}

impl CachedResponse {
    /// Creates a stored response timestamped now.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
            stored_at: Utc::now(),
        }
    }

    /// Copies status, headers and body out of a buffered response.
    pub fn from_response(response: &Response<Bytes>) -> Self {
        Self::new(
            response.status(),
            response.headers().clone(),
            response.body().clone(),
        )
    }

    /// Rebuilds a response from the stored parts.
    pub fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }

    /// Rebuilds a response without consuming the entry.
    pub fn to_response(&self) -> Response<Bytes> {
        self.clone().into_response()
    }

    /// Response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Response body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// When the entry was written.
    pub fn stored_at(&self) -> DateTime<Utc> {
        self.stored_at
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

#[derive(Serialize, Deserialize)]
struct RawResponse {
    status: u16,
    headers: Vec<(String, serde_bytes::ByteBuf)>,
    #[serde(with = "serde_bytes")]
    body: Vec<u8>,
    stored_at: DateTime<Utc>,
}

impl From<CachedResponse> for RawResponse {
    fn from(response: CachedResponse) -> Self {
        let headers = response
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_owned(),
                    serde_bytes::ByteBuf::from(value.as_bytes().to_vec()),
                )
            })
            .collect();
        RawResponse {
            status: response.status.as_u16(),
            headers,
            body: response.body.to_vec(),
            stored_at: response.stored_at,
        }
    }
}

impl TryFrom<RawResponse> for CachedResponse {
    type Error = String;

    fn try_from(raw: RawResponse) -> Result<Self, Self::Error> {
        let status = StatusCode::from_u16(raw.status)
            .map_err(|e| format!("invalid status code {}: {e}", raw.status))?;
        let mut headers = HeaderMap::with_capacity(raw.headers.len());
        for (name, value) in raw.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| format!("invalid header name {name:?}: {e}"))?;
            let value = HeaderValue::from_bytes(&value)
                .map_err(|e| format!("invalid value for header {name}: {e}"))?;
            headers.append(name, value);
        }
        Ok(CachedResponse {
            status,
            headers,
            body: Bytes::from(raw.body),
            stored_at: raw.stored_at,
        })
    }
}
