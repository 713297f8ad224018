//! HTTP response module
//!
//! [`Response`] is the per-request scratch state a handler writes into.
//! [`Response::finalize`] turns it into an immutable [`WireResponse`], which the
//! transport converts into a hyper response.

use http_body_util::Full;
use hyper::body::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::borrow::Cow;

/// Body of the default response for paths with no registered route
pub const NOT_FOUND_BODY: &str = "Not found. :(";

pub const CONTENT_TYPE_TEXT: &str = "text/plain";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_HTML: &str = "text/html";

/// The declared output of a handler. One slot: setting a kind replaces the
/// previous one, so the last assignment wins.
#[derive(Debug, Clone, PartialEq)]
enum Payload {
    Text(String),
    Json(Value),
    Html(String),
    Raw(Bytes),
}

/// Mutable response state, created fresh for every request
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    payload: Option<Payload>,
    content_type: Option<String>,
    headers: Vec<(String, String)>,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            payload: None,
            content_type: None,
            headers: Vec::new(),
        }
    }
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Plain text body, served as `text/plain`
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.payload = Some(Payload::Text(text.into()));
    }

    /// JSON body, served as `application/json`
    pub fn set_json(&mut self, value: impl Into<Value>) {
        self.payload = Some(Payload::Json(value.into()));
    }

    /// HTML body, served as `text/html`
    pub fn set_html(&mut self, html: impl Into<String>) {
        self.payload = Some(Payload::Html(html.into()));
    }

    /// Raw body; the content type must be set separately
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.payload = Some(Payload::Raw(body.into()));
    }

    /// Content type for a raw body. Ignored for text, json and html bodies.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = Some(content_type.into());
    }

    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            Some(Payload::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn json(&self) -> Option<&Value> {
        match &self.payload {
            Some(Payload::Json(v)) => Some(v),
            _ => None,
        }
    }

    pub fn html(&self) -> Option<&str> {
        match &self.payload {
            Some(Payload::Html(s)) => Some(s),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&Bytes> {
        match &self.payload {
            Some(Payload::Raw(b)) => Some(b),
            _ => None,
        }
    }

    /// Default terminal response when no route matches
    pub fn not_found(&mut self) {
        self.status = 404;
        self.set_text(NOT_FOUND_BODY);
    }

    /// Resolve the declared payload into content type and body bytes
    pub fn finalize(self) -> WireResponse {
        let (content_type, body) = match self.payload {
            Some(Payload::Json(value)) => (
                CONTENT_TYPE_JSON.to_string(),
                Bytes::from(value.to_string()),
            ),
            Some(Payload::Text(text)) => (CONTENT_TYPE_TEXT.to_string(), Bytes::from(text)),
            Some(Payload::Html(html)) => (CONTENT_TYPE_HTML.to_string(), Bytes::from(html)),
            Some(Payload::Raw(body)) => (self.content_type.unwrap_or_default(), body),
            None => (self.content_type.unwrap_or_default(), Bytes::new()),
        };

        WireResponse {
            status: self.status,
            content_type,
            body,
            headers: self.headers,
        }
    }
}

/// Finalized response: what goes back across the transport boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
    pub status: u16,
    /// Empty when a raw body was set without a content type
    pub content_type: String,
    pub body: Bytes,
    pub headers: Vec<(String, String)>,
}

impl WireResponse {
    pub fn new(status: u16, content_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body: body.into(),
            headers: Vec::new(),
        }
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }

    /// First extra header with the given name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }
}

/// Build the hyper response for a finalized response
pub fn build_response(wire: WireResponse, server_name: &str) -> hyper::Response<Full<Bytes>> {
    let mut builder = hyper::Response::builder()
        .status(wire.status)
        .header("Server", server_name)
        .header("Content-Length", wire.body.len());

    if wire.content_type.is_empty() {
        if !wire.body.is_empty() {
            crate::logger::log_warning(&format!(
                "Response with status {} has a body but no content type",
                wire.status
            ));
        }
    } else {
        builder = builder.header("Content-Type", wire.content_type.as_str());
    }

    for (name, value) in &wire.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let status = wire.status;
    builder.body(Full::new(wire.body)).unwrap_or_else(|e| {
        log_build_error(&status.to_string(), &e);
        build_500_response(server_name)
    })
}

/// Build a bare 500 response for failures nothing else handled
pub fn build_500_response(server_name: &str) -> hyper::Response<Full<Bytes>> {
    empty_response(500, server_name)
}

/// Build 400 Bad Request response
pub fn build_400_response(server_name: &str) -> hyper::Response<Full<Bytes>> {
    empty_response(400, server_name)
}

/// Build 413 Payload Too Large response
pub fn build_413_response(server_name: &str) -> hyper::Response<Full<Bytes>> {
    empty_response(413, server_name)
}

fn empty_response(status: u16, server_name: &str) -> hyper::Response<Full<Bytes>> {
    hyper::Response::builder()
        .status(status)
        .header("Server", server_name)
        .header("Content-Length", 0)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error(&status.to_string(), &e);
            hyper::Response::new(Full::new(Bytes::new()))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_is_empty_200() {
        let wire = Response::new().finalize();
        assert_eq!(wire.status, 200);
        assert!(wire.body.is_empty());
        assert_eq!(wire.content_type, "");
    }

    #[test]
    fn test_text_kind() {
        let mut resp = Response::new();
        resp.set_text("Lights are on!");
        let wire = resp.finalize();
        assert_eq!(wire.content_type, "text/plain");
        assert_eq!(wire.text(), "Lights are on!");
    }

    #[test]
    fn test_json_kind() {
        let mut resp = Response::new();
        resp.set_json(json!({"name": "LumosData", "type": "JSON"}));
        let wire = resp.finalize();
        assert_eq!(wire.content_type, "application/json");
        let body: Value = wire.json().unwrap();
        assert_eq!(body, json!({"name": "LumosData", "type": "JSON"}));
    }

    #[test]
    fn test_html_kind() {
        let mut resp = Response::new();
        resp.set_html("<h1>Lumos</h1>");
        let wire = resp.finalize();
        assert_eq!(wire.content_type, "text/html");
        assert_eq!(wire.text(), "<h1>Lumos</h1>");
    }

    #[test]
    fn test_raw_body_with_content_type() {
        let mut resp = Response::new();
        resp.set_body(&b"Byte body"[..]);
        resp.set_content_type("text/plain");
        let wire = resp.finalize();
        assert_eq!(wire.content_type, "text/plain");
        assert_eq!(wire.body.as_ref(), b"Byte body");
    }

    #[test]
    fn test_raw_body_without_content_type_stays_empty() {
        let mut resp = Response::new();
        resp.set_body(vec![0_u8, 1, 2]);
        let wire = resp.finalize();
        assert_eq!(wire.content_type, "");
        assert_eq!(wire.body.len(), 3);
    }

    #[test]
    fn test_last_assignment_wins() {
        let mut resp = Response::new();
        resp.set_html("<p>first</p>");
        resp.set_json(json!([1, 2]));
        resp.set_text("last");
        assert_eq!(resp.html(), None);
        assert_eq!(resp.json(), None);
        let wire = resp.finalize();
        assert_eq!(wire.content_type, "text/plain");
        assert_eq!(wire.text(), "last");

        let mut resp = Response::new();
        resp.set_text("first");
        resp.set_html("<p>last</p>");
        assert_eq!(resp.finalize().content_type, "text/html");
    }

    #[test]
    fn test_content_type_ignored_for_typed_kinds() {
        let mut resp = Response::new();
        resp.set_content_type("application/xml");
        resp.set_text("hi");
        assert_eq!(resp.finalize().content_type, "text/plain");
    }

    #[test]
    fn test_not_found() {
        let mut resp = Response::new();
        resp.not_found();
        let wire = resp.finalize();
        assert_eq!(wire.status, 404);
        assert_eq!(wire.text(), NOT_FOUND_BODY);
    }

    #[test]
    fn test_build_response_headers() {
        let mut wire = WireResponse::new(201, "text/plain", "made");
        wire.add_header("X-Request-Id", "abc");
        let resp = build_response(wire, "Lumos/test");
        assert_eq!(resp.status(), 201);
        assert_eq!(resp.headers()["content-type"], "text/plain");
        assert_eq!(resp.headers()["content-length"], "4");
        assert_eq!(resp.headers()["server"], "Lumos/test");
        assert_eq!(resp.headers()["x-request-id"], "abc");
    }

    #[test]
    fn test_build_response_invalid_status_falls_back_to_500() {
        let resp = build_response(WireResponse::new(42, "text/plain", "x"), "Lumos/test");
        assert_eq!(resp.status(), 500);
    }
}
