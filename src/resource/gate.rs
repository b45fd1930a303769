use std::{collections::BTreeSet, fmt, sync::Arc};

use thiserror::Error;

use super::{RequestContext, Resource};
use crate::auth::{Identity, has_role};

/// Predicate over the identity the authentication layer attached to the request.
pub type Predicate = Arc<dyn Fn(Option<&Identity>) -> bool + Send + Sync>;

/// Authorization
///
/// A resource's `authorized?` decision. The description is only used for logging.
#[derive(Clone)]
pub struct Authorization {
    description: String,
    check: Predicate,
}

impl Authorization {
    pub fn new<F>(description: impl Into<String>, check: F) -> Self
    where
        F: Fn(Option<&Identity>) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            check: Arc::new(check),
        }
    }

    /// Lets every request through, signed in or not.
    pub fn allow_all() -> Self {
        Self::new("anyone", |_| true)
    }

    pub fn is_authorized(&self, identity: Option<&Identity>) -> bool {
        (self.check)(identity)
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authorization")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// role_auth
///
/// Authorized iff the request carries an identity holding at least one of `roles`.
/// An empty role set authorizes nobody.
pub fn role_auth<I, R>(roles: I) -> Authorization
where
    I: IntoIterator<Item = R>,
    R: Into<String>,
{
    let roles: BTreeSet<String> = roles.into_iter().map(Into::into).collect();
    let description = format!(
        "any of roles [{}]",
        roles.iter().cloned().collect::<Vec<_>>().join(", ")
    );
    Authorization::new(description, move |identity| {
        identity.is_some_and(|identity| roles.iter().any(|role| has_role(identity, role)))
    })
}

/// authenticated_base
///
/// Authorized iff the request carries any identity at all, whatever its roles.
pub fn authenticated_base() -> Authorization {
    Authorization::new("any authenticated identity", |identity| identity.is_some())
}

/// Unauthorized
///
/// Raised by the gate when `authorized?` says no. It carries the resource that refused,
/// so the outer authentication layer can either answer with a login challenge or render
/// that resource's own `handle_unauthorized` body.
#[derive(Debug, Error)]
#[error("not authorized for resource `{}` (requires {})", .resource.name(), .resource.authorized.description())]
pub struct Unauthorized {
    pub resource: Arc<Resource>,
}

/// check
///
/// Runs the resource's `authorized?` predicate against the request's identity.
pub fn check(resource: &Arc<Resource>, ctx: &RequestContext) -> Result<(), Unauthorized> {
    if resource.authorized.is_authorized(ctx.identity.as_ref()) {
        Ok(())
    } else {
        tracing::debug!(
            resource = resource.name(),
            required = resource.authorized.description(),
            user = ctx.identity.as_ref().map(|identity| identity.username.as_str()),
            "Authorization gate refused request"
        );
        Err(Unauthorized {
            resource: Arc::clone(resource),
        })
    }
}
