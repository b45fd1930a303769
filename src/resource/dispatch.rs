use std::{collections::HashMap, fmt, sync::Arc};

use axum::{http::StatusCode, response::Response};
use serde_json::Value;

use super::{
    RequestContext,
    negotiate::MediaType,
    representation::{RawResponse, Representation, render},
};

/// A hook that builds a finished response itself. Its result is served verbatim.
pub type Handler = Arc<dyn Fn(&RequestContext) -> Response + Send + Sync>;

/// A value stored in a dispatch map and served to every matching request.
#[derive(Debug, Clone)]
pub enum Literal {
    Raw(RawResponse),
    Domain(Value),
}

impl From<Literal> for Representation {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Raw(raw) => Representation::Raw(raw),
            Literal::Domain(value) => Representation::Domain(value),
        }
    }
}

/// Entry
///
/// One slot of a [`MediaDispatch`] map: either a literal or a handler function.
#[derive(Clone)]
pub enum Entry {
    Literal(Literal),
    Handler(Handler),
}

impl Entry {
    pub fn text(body: impl Into<String>) -> Self {
        Entry::Literal(Literal::Domain(Value::String(body.into())))
    }

    pub fn value(value: Value) -> Self {
        Entry::Literal(Literal::Domain(value))
    }

    pub fn raw(raw: RawResponse) -> Self {
        Entry::Literal(Literal::Raw(raw))
    }

    pub fn handler<F>(f: F) -> Self
    where
        F: Fn(&RequestContext) -> Response + Send + Sync + 'static,
    {
        Entry::Handler(Arc::new(f))
    }

    /// Resolves the entry for one request. Handlers run and their response passes through
    /// untouched; literals are normalized for `media`.
    pub fn respond(
        &self,
        ctx: &RequestContext,
        media: Option<&MediaType>,
        status: StatusCode,
    ) -> Representation {
        match self {
            Entry::Handler(handler) => Representation::AlreadyRendered(handler(ctx)),
            Entry::Literal(literal) => Representation::from(literal.clone()).normalize(media, status),
        }
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Literal(literal) => f.debug_tuple("Literal").field(literal).finish(),
            Entry::Handler(_) => f.write_str("Handler(..)"),
        }
    }
}

/// MediaDispatch
///
/// Maps media types to entries, plus an optional default for everything else. Keys are
/// `type/subtype` essences, compared case-insensitively.
///
/// A map without a default produces nothing for unlisted types; the caller decides what
/// "no representation" means.
#[derive(Debug, Clone, Default)]
pub struct MediaDispatch {
    entries: HashMap<String, Entry>,
    default: Option<Entry>,
}

impl MediaDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, media: &str, entry: Entry) -> Self {
        self.entries.insert(dispatch_key(media), entry);
        self
    }

    pub fn with_default(mut self, entry: Entry) -> Self {
        self.default = Some(entry);
        self
    }

    /// Shallow merge: `other`'s entries, and its default if it has one, win on collision.
    pub fn merge(mut self, other: MediaDispatch) -> Self {
        self.entries.extend(other.entries);
        if other.default.is_some() {
            self.default = other.default;
        }
        self
    }

    /// Merges maps left to right, so later maps win.
    pub fn merged(maps: impl IntoIterator<Item = MediaDispatch>) -> Self {
        maps.into_iter().fold(MediaDispatch::new(), MediaDispatch::merge)
    }

    pub fn get(&self, media: &str) -> Option<&Entry> {
        self.entries.get(&dispatch_key(media))
    }

    pub fn default_entry(&self) -> Option<&Entry> {
        self.default.as_ref()
    }

    /// respond
    ///
    /// Picks the entry for the request's negotiated media type (or, when nothing was
    /// negotiated, the client's most preferred type) and falls back to the default.
    ///
    /// A literal reached through the default is rendered for the requested type itself,
    /// so a generic message still comes out as JSON for a JSON client. Returns `None`
    /// when neither a matching entry nor a default exists.
    pub fn respond(&self, ctx: &RequestContext, status: StatusCode) -> Option<Representation> {
        let media = ctx.preferred_media_type();
        let exact = media
            .as_ref()
            .and_then(|media| self.entries.get(&media.essence()));

        match exact {
            Some(entry) => Some(entry.respond(ctx, media.as_ref(), status)),
            None => {
                let fallback = self.default.as_ref()?;
                tracing::trace!(
                    media = %media.as_ref().map(MediaType::essence).unwrap_or_default(),
                    "No dispatch entry for media type, using default"
                );
                match fallback {
                    Entry::Literal(Literal::Domain(value)) => Some(Representation::AlreadyRendered(
                        render(value, media.as_ref(), status),
                    )),
                    other => Some(other.respond(ctx, media.as_ref(), status)),
                }
            }
        }
    }
}

fn dispatch_key(media: &str) -> String {
    MediaType::parse(media)
        .map(|media| media.essence())
        .unwrap_or_else(|| media.trim().to_ascii_lowercase())
}
