//! Media type negotiation against the `Accept` header.
//!
//! ```
//! use liberator_friend::resource::negotiate::{AcceptHeader, MediaType, select_media_type};
//!
//! let accept = AcceptHeader::new(Some("application/json, text/*;q=0.5"));
//! let allowed = [MediaType::plain_text()];
//! assert_eq!(
//!     select_media_type(Some(&accept), Some(&allowed[..])),
//!     Some(MediaType::plain_text()),
//! );
//! ```

use std::{cmp::Ordering, fmt};

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};

const WILDCARD: &str = "*";

/// A `type/subtype` pair. Either component may be the `*` wildcard.
/// Parameters other than `q` are not significant for matching and are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType {
    kind: String,
    subtype: String,
}

impl MediaType {
    pub fn new(kind: impl Into<String>, subtype: impl Into<String>) -> Self {
        Self {
            kind: kind.into().to_ascii_lowercase(),
            subtype: subtype.into().to_ascii_lowercase(),
        }
    }

    pub fn plain_text() -> Self {
        Self::new("text", "plain")
    }

    pub fn html() -> Self {
        Self::new("text", "html")
    }

    pub fn json() -> Self {
        Self::new("application", "json")
    }

    pub fn any() -> Self {
        Self::new(WILDCARD, WILDCARD)
    }

    /// Parses `type/subtype[;params]`. Returns `None` for anything without a slash
    /// or with an empty component, and for `*/subtype`, which no client may send.
    pub fn parse(raw: &str) -> Option<Self> {
        let essence = raw.split(';').next()?.trim();
        let (kind, subtype) = essence.split_once('/')?;
        let (kind, subtype) = (kind.trim(), subtype.trim());
        if kind.is_empty() || subtype.is_empty() {
            return None;
        }
        if kind == WILDCARD && subtype != WILDCARD {
            return None;
        }
        Some(Self::new(kind, subtype))
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// `type/subtype` without parameters, the key used by media dispatch maps.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.kind, self.subtype)
    }

    pub fn is_wildcard(&self) -> bool {
        self.kind == WILDCARD || self.subtype == WILDCARD
    }

    /// Wildcards match in both directions: `*/*` matches anything and `text/*`
    /// matches `text/plain` whichever side it appears on.
    pub fn matches(&self, other: &MediaType) -> bool {
        let kind = self.kind == WILDCARD || other.kind == WILDCARD || self.kind == other.kind;
        let subtype =
            self.subtype == WILDCARD || other.subtype == WILDCARD || self.subtype == other.subtype;
        kind && subtype
    }

    /// 2 for an exact type, 1 for `type/*`, 0 for `*/*`.
    pub fn specificity(&self) -> u8 {
        match (self.kind == WILDCARD, self.subtype == WILDCARD) {
            (false, false) => 2,
            (false, true) => 1,
            _ => 0,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.subtype)
    }
}

/// AcceptHeader
///
/// The request's `Accept` header as seen by negotiation. `AcceptHeader(None)` means the
/// client sent no header, which negotiates as `*/*`. It is attached to every request by
/// [`accept_layer`]; a request that never passed through that layer has no representation
/// at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptHeader(Option<String>);

impl AcceptHeader {
    pub fn new(raw: Option<&str>) -> Self {
        Self(raw.map(str::to_string))
    }

    pub fn raw(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// The accepted types in preference order: quality descending, ties broken by
    /// specificity, then by position in the header. Entries with `q=0` are refused
    /// by the client and left out; unparsable entries are skipped.
    pub fn preferences(&self) -> Vec<MediaType> {
        if self.0.is_none() {
            return vec![MediaType::any()];
        }

        let mut ranked: Vec<(MediaType, f32)> =
            self.ranges().into_iter().filter(|(_, q)| *q > 0.0).collect();

        // Stable sort keeps header order among equal entries.
        ranked.sort_by(|(a, qa), (b, qb)| match qb.partial_cmp(qa) {
            Some(Ordering::Equal) | None => b.specificity().cmp(&a.specificity()),
            Some(ord) => ord,
        });

        ranked.into_iter().map(|(media, _)| media).collect()
    }

    /// Every parsable range with its quality, in header order. Refusals are kept.
    fn ranges(&self) -> Vec<(MediaType, f32)> {
        let Some(raw) = self.0.as_deref() else {
            return vec![(MediaType::any(), 1.0)];
        };

        raw.split(',')
            .filter_map(|part| {
                let part = part.trim();
                if part.is_empty() {
                    return None;
                }
                let media = MediaType::parse(part)?;
                Some((media, quality(part)))
            })
            .collect()
    }
}

/// The range that decides `candidate`'s quality: the most specific one matching it,
/// the earliest in the header among equals.
fn deciding_range<'a>(
    ranges: &'a [(MediaType, f32)],
    candidate: &MediaType,
) -> Option<&'a (MediaType, f32)> {
    ranges
        .iter()
        .filter(|(range, _)| range.matches(candidate))
        .fold(None, |best, entry| match best {
            Some(best) if best.0.specificity() >= entry.0.specificity() => Some(best),
            _ => Some(entry),
        })
}

fn quality(part: &str) -> f32 {
    part.split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("q"))
        .and_then(|(_, value)| value.trim().parse::<f32>().ok())
        .map(|q| q.clamp(0.0, 1.0))
        .unwrap_or(1.0)
}

/// select_media_type
///
/// Without `allowed`, returns the client's most preferred type. With `allowed`, returns
/// the allowed type that best satisfies the client's preferences, or `None` when nothing
/// matches, which callers must treat as "not acceptable". Each allowed type takes the
/// quality of the most specific accepted range matching it, so `text/plain;q=0, */*`
/// refuses `text/plain` even though `*/*` would match it. When a wildcard meets a
/// concrete type the more specific of the two is returned.
///
/// A missing header accepts anything: the first allowed entry, or `*/*`.
///
/// # Panics
/// Panics when `allowed` is given but `accept` is `None`, i.e. the request carries no
/// Accept representation because [`accept_layer`] never ran. That is a wiring bug, not
/// a client error, and it is not papered over with a default.
pub fn select_media_type(
    accept: Option<&AcceptHeader>,
    allowed: Option<&[MediaType]>,
) -> Option<MediaType> {
    let Some(allowed) = allowed else {
        let preferences = accept.cloned().unwrap_or_default().preferences();
        return preferences.into_iter().next();
    };

    let accept = accept.expect("negotiating against allowed media types requires the accept layer");

    if accept.raw().is_none() {
        return allowed.first().cloned();
    }

    let ranges = accept.ranges();
    let ranges = ranges.as_slice();

    // An allowed wildcard stands for every concrete type the client names under it.
    let candidates = allowed.iter().flat_map(move |offered| {
        let named = ranges
            .iter()
            .filter(move |(range, _)| {
                offered.is_wildcard()
                    && range.matches(offered)
                    && range.specificity() > offered.specificity()
            })
            .map(|(range, _)| range.clone());
        named.chain(std::iter::once(offered.clone()))
    });

    let mut best: Option<(f32, u8, MediaType)> = None;
    for candidate in candidates {
        let Some((range, q)) = deciding_range(ranges, &candidate) else {
            continue;
        };
        if *q <= 0.0 {
            continue;
        }

        let rank = (*q, range.specificity());
        if matches!(&best, Some((bq, bs, _)) if (*bq, *bs) >= rank) {
            continue;
        }

        let negotiated = if candidate.is_wildcard() && range.specificity() > candidate.specificity() {
            range.clone()
        } else {
            candidate
        };
        best = Some((rank.0, rank.1, negotiated));
    }

    best.map(|(_, _, media)| media)
}

/// accept_layer
///
/// Middleware attaching the [`AcceptHeader`] representation to every request. A blank
/// header, or one that is not visible ASCII, is treated as absent.
pub async fn accept_layer(mut request: Request, next: Next) -> Response {
    let accept = AcceptHeader::new(
        request
            .headers()
            .get(header::ACCEPT)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.trim().is_empty()),
    );
    request.extensions_mut().insert(accept);
    next.run(request).await
}
