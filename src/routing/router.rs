//! Fresh route resolution for a (user, target) pair.
//!
//! # Responsibilities
//! - Look up the user's groups
//! - Fold the policy layers into an effective policy
//! - Ask the selector for one reachable candidate
//!
//! # Design Decisions
//! - Immutable after construction; owned by the request serializer
//! - Sticky reuse is the registry's job, not the router's

use std::sync::Arc;

use crate::routing::groups::{GroupError, GroupSource};
use crate::routing::policy::PolicyResolver;
use crate::routing::select::{HealthCheck, RouteError, RouteSelector};

/// Error type for route resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    #[error(transparent)]
    Groups(#[from] GroupError),

    #[error(transparent)]
    Route(#[from] RouteError),
}

pub struct Router {
    policy: PolicyResolver,
    groups: Arc<dyn GroupSource>,
    selector: Arc<dyn RouteSelector>,
}

impl Router {
    pub fn new(
        policy: PolicyResolver,
        groups: Arc<dyn GroupSource>,
        selector: Arc<dyn RouteSelector>,
    ) -> Self {
        Self {
            policy,
            groups,
            selector,
        }
    }

    /// Pick a backend for `user` connecting to the normalized `target`.
    pub async fn route(
        &self,
        user: &str,
        target: &str,
        health: &mut dyn HealthCheck,
    ) -> Result<String, RoutingError> {
        let member_of = self.groups.groups_of(user)?;
        let policy = self.policy.resolve(user, target, &member_of);

        tracing::debug!(
            user = %user,
            target = %target,
            algorithm = %policy.algorithm,
            candidates = ?policy.candidates,
            "Resolved routing policy"
        );

        let backend = self
            .selector
            .select(policy.algorithm, &policy.candidates, health)
            .await?;
        Ok(backend)
    }
}
