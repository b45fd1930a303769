//! A small declarative resource abstraction.
//!
//! A [`Resource`] is a bundle of allowed methods, available media types, an
//! `authorized?` gate and per-outcome hooks. [`Resource::execute`] walks the decision
//! steps for one request and renders the outcome for the negotiated media type.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, Method, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};

use crate::auth::{Identity, current_identity};

pub mod dispatch;
pub mod gate;
pub mod negotiate;
pub mod representation;

use dispatch::{Entry, MediaDispatch};
use gate::{Authorization, Unauthorized};
use negotiate::{AcceptHeader, MediaType, select_media_type};

/// RequestContext
///
/// The slice of a request the resource layer reads: method, path, the Accept
/// representation, the identity attached by the authentication layer, and the media
/// type once negotiation has picked one.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub accept: Option<AcceptHeader>,
    pub identity: Option<Identity>,
    pub media_type: Option<MediaType>,
}

impl RequestContext {
    /// A context as the accept layer would produce it for a request without an Accept header.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            accept: Some(AcceptHeader::default()),
            identity: None,
            media_type: None,
        }
    }

    pub fn with_accept(mut self, accept: &str) -> Self {
        self.accept = Some(AcceptHeader::new(Some(accept)));
        self
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// The negotiated media type if negotiation already ran, else the client's top preference.
    pub fn preferred_media_type(&self) -> Option<MediaType> {
        self.media_type
            .clone()
            .or_else(|| select_media_type(self.accept.as_ref(), None))
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            accept: parts.extensions.get::<AcceptHeader>().cloned(),
            identity: current_identity(&parts.extensions).cloned(),
            media_type: None,
        })
    }
}

/// Resource
///
/// Built once at startup and shared read-only afterwards. Definitions compose with
/// struct update syntax, the override's fields winning over the base's:
///
/// ```
/// use liberator_friend::resource::{Resource, dispatch::Entry, gate::authenticated_base};
///
/// let base = Resource::default();
/// let members = Resource {
///     authorized: authenticated_base(),
///     handle_ok: Entry::text("members only"),
///     ..base
/// };
/// assert_eq!(members.authorized.description(), "any authenticated identity");
/// ```
#[derive(Debug, Clone)]
pub struct Resource {
    pub name: String,
    pub allowed_methods: Vec<Method>,
    pub available_media_types: Vec<MediaType>,
    pub authorized: Authorization,
    pub handle_ok: Entry,
    pub handle_not_found: MediaDispatch,
    pub handle_not_acceptable: MediaDispatch,
    pub handle_unauthorized: MediaDispatch,
    pub handle_method_not_allowed: MediaDispatch,
}

impl Default for Resource {
    fn default() -> Self {
        Self {
            name: "resource".to_string(),
            allowed_methods: vec![Method::GET, Method::HEAD],
            available_media_types: vec![MediaType::plain_text()],
            authorized: Authorization::allow_all(),
            handle_ok: Entry::text(""),
            handle_not_found: MediaDispatch::new(),
            handle_not_acceptable: MediaDispatch::new(),
            handle_unauthorized: MediaDispatch::new(),
            handle_method_not_allowed: MediaDispatch::new(),
        }
    }
}

impl Resource {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// execute
    ///
    /// Runs the decision steps in order: method allowed, authorized, media type
    /// available, ok. Every outcome except a refused gate becomes a response here; the
    /// refusal is returned as [`Unauthorized`] for the authentication layer to handle.
    pub fn execute(self: &Arc<Self>, mut ctx: RequestContext) -> Result<Response, Unauthorized> {
        if !self.allowed_methods.contains(&ctx.method) {
            let mut response = outcome(
                &self.handle_method_not_allowed,
                &ctx,
                StatusCode::METHOD_NOT_ALLOWED,
            );
            if let Ok(allow) = HeaderValue::from_str(&self.allow_header()) {
                response.headers_mut().insert(header::ALLOW, allow);
            }
            return Ok(response);
        }

        gate::check(self, &ctx)?;

        let available = self.available_media_types.as_slice();
        let Some(media) = select_media_type(ctx.accept.as_ref(), Some(available)) else {
            tracing::debug!(
                resource = self.name(),
                accept = ctx.accept.as_ref().and_then(AcceptHeader::raw),
                "No acceptable media type"
            );
            return Ok(outcome(
                &self.handle_not_acceptable,
                &ctx,
                StatusCode::NOT_ACCEPTABLE,
            ));
        };

        ctx.media_type = Some(media);
        let response = self
            .handle_ok
            .respond(&ctx, ctx.media_type.as_ref(), StatusCode::OK)
            .into_response();
        Ok(vary_on_accept(response))
    }

    /// Renders `handle_not_found` with 404.
    pub fn not_found(&self, ctx: &RequestContext) -> Response {
        outcome(&self.handle_not_found, ctx, StatusCode::NOT_FOUND)
    }

    /// Renders `handle_unauthorized` with 401.
    pub fn unauthorized(&self, ctx: &RequestContext) -> Response {
        outcome(&self.handle_unauthorized, ctx, StatusCode::UNAUTHORIZED)
    }

    fn allow_header(&self) -> String {
        self.allowed_methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A dispatch map with nothing to say for the request leaves a bare status.
fn outcome(dispatch: &MediaDispatch, ctx: &RequestContext, status: StatusCode) -> Response {
    let response = match dispatch.respond(ctx, status) {
        Some(representation) => representation.into_response(),
        None => {
            tracing::warn!(
                status = status.as_u16(),
                path = %ctx.path,
                "No representation available, sending empty body"
            );
            status.into_response()
        }
    };
    vary_on_accept(response)
}

/// Every negotiated body depends on the request's Accept header.
fn vary_on_accept(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::VARY, HeaderValue::from_static("accept"));
    response
}
