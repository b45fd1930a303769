use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::Value;

use super::negotiate::MediaType;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const TEXT_HTML: &str = "text/html; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

/// RawResponse
///
/// A transport-level response assembled by hand: status, headers and a body.
/// Unlike `axum::response::Response` it is `Clone`, so it can live in a static
/// dispatch map and be served to every request.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

impl IntoResponse for RawResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Representation
///
/// Whatever a resource hook hands back, classified once:
///
/// - `Raw`: a hand-built transport response, served as-is.
/// - `AlreadyRendered`: a finished framework response that must not be re-rendered.
/// - `Domain`: data that still needs a body for the negotiated media type.
#[derive(Debug)]
pub enum Representation {
    Raw(RawResponse),
    AlreadyRendered(Response),
    Domain(Value),
}

impl Representation {
    /// normalize
    ///
    /// Resolves any representation into the pass-through form. `Domain` values are
    /// rendered for `media` with the outcome's `status`; raw and rendered responses keep
    /// their own status.
    pub fn normalize(self, media: Option<&MediaType>, status: StatusCode) -> Representation {
        match self {
            Representation::AlreadyRendered(response) => Representation::AlreadyRendered(response),
            Representation::Raw(raw) => Representation::AlreadyRendered(raw.into_response()),
            Representation::Domain(value) => {
                Representation::AlreadyRendered(render(&value, media, status))
            }
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, Representation::AlreadyRendered(_))
    }
}

impl From<&str> for Representation {
    fn from(value: &str) -> Self {
        Representation::Domain(Value::String(value.to_string()))
    }
}

impl From<Value> for Representation {
    fn from(value: Value) -> Self {
        Representation::Domain(value)
    }
}

impl From<RawResponse> for Representation {
    fn from(raw: RawResponse) -> Self {
        Representation::Raw(raw)
    }
}

impl IntoResponse for Representation {
    fn into_response(self) -> Response {
        match self {
            Representation::AlreadyRendered(response) => response,
            Representation::Raw(raw) => raw.into_response(),
            Representation::Domain(value) => render(&value, None, StatusCode::OK),
        }
    }
}

/// render
///
/// Gives a domain value a body for `media`. Strings are bodies already and pass through
/// unchanged under every media type. Structured values are encoded as JSON for JSON types,
/// as an HTML table for `text/html`, and as `key=value` lines otherwise. Types without a
/// renderer of their own, wildcards included, are served as `text/plain`.
pub fn render(value: &Value, media: Option<&MediaType>, status: StatusCode) -> Response {
    let (content_type, body) = match media {
        Some(media) if is_json(media) => (APPLICATION_JSON, render_json(value)),
        Some(media) if *media == MediaType::html() => (TEXT_HTML, render_html(value)),
        _ => (TEXT_PLAIN, render_plain(value)),
    };

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

fn is_json(media: &MediaType) -> bool {
    media.kind() == "application" && (media.subtype() == "json" || media.subtype().ends_with("+json"))
}

fn render_json(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_plain(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| format!("{}={}", key, render_plain(value)))
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Array(items) => items.iter().map(render_plain).collect::<Vec<_>>().join("\n"),
        other => other.to_string(),
    }
}

fn render_html(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => html_fragment(other),
    }
}

fn html_fragment(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => escape_html(s),
        Value::Object(map) => {
            let rows: String = map
                .iter()
                .map(|(key, value)| {
                    format!("<tr><th>{}</th><td>{}</td></tr>", escape_html(key), html_fragment(value))
                })
                .collect();
            format!("<table>{}</table>", rows)
        }
        Value::Array(items) => {
            let entries: String = items
                .iter()
                .map(|item| format!("<li>{}</li>", html_fragment(item)))
                .collect();
            format!("<ul>{}</ul>", entries)
        }
        other => escape_html(&other.to_string()),
    }
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
