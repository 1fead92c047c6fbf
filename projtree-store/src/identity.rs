//! Request identity.
//!
//! The store never authenticates anyone itself. Whatever sits in front of it
//! (an HTTP layer, a test) attaches the authenticated subject to a
//! [`RequestContext`], and an [`IdentityResolver`] turns that context into a
//! [`SubjectId`] or fails with [`StoreError::Unauthenticated`].

use crate::{StoreError, StoreResult};
use projtree_types::SubjectId;

/// Per-request data handed to every repository operation.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Authenticated subject, if any.
    pub subject: Option<SubjectId>,
    /// Correlation id for logs.
    pub request_id: Option<String>,
}

impl RequestContext {
    /// A context with no authenticated subject.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A context authenticated as `subject`.
    #[must_use]
    pub fn for_subject(subject: SubjectId) -> Self {
        Self {
            subject: Some(subject),
            request_id: None,
        }
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Resolves the caller's identity from a request context.
pub trait IdentityResolver: Send + Sync {
    /// Returns the caller's subject, or [`StoreError::Unauthenticated`].
    fn resolve_identity(&self, ctx: &RequestContext) -> StoreResult<SubjectId>;
}

/// Trusts the subject already attached to the context.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextIdentityResolver;

impl IdentityResolver for ContextIdentityResolver {
    fn resolve_identity(&self, ctx: &RequestContext) -> StoreResult<SubjectId> {
        ctx.subject.clone().ok_or(StoreError::Unauthenticated)
    }
}
