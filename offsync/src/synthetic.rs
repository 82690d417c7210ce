//! Locally built responses for when neither network nor cache can answer.

use bytes::Bytes;
use http::{HeaderValue, Response, StatusCode, header::CONTENT_TYPE};
use serde_json::json;

const NOT_FOUND_BODY: &str = "resource not found";

fn text(status: StatusCode, content_type: &'static str, body: impl Into<Bytes>) -> Response<Bytes> {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// `404` with a plain-text body.
pub fn not_found() -> Response<Bytes> {
    text(StatusCode::NOT_FOUND, "text/plain; charset=utf-8", NOT_FOUND_BODY)
}

/// `503` with `{"error": message, "offline": true}`.
pub fn offline_api(message: &str) -> Response<Bytes> {
    let body = json!({ "error": message, "offline": true });
    text(StatusCode::SERVICE_UNAVAILABLE, "application/json", body.to_string())
}

/// `503` with the message as plain text, for pages with no cached shell.
pub fn offline_page(message: &str) -> Response<Bytes> {
    text(
        StatusCode::SERVICE_UNAVAILABLE,
        "text/plain; charset=utf-8",
        message.to_owned(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_api_shape() {
        let response = offline_api("network unavailable");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body, json!({"error": "network unavailable", "offline": true}));
    }

    #[test]
    fn not_found_shape() {
        let response = not_found();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.body().as_ref(), NOT_FOUND_BODY.as_bytes());
    }
}
