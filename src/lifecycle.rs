//! Publish/archive lifecycle for entries and assets.
//!
//! The declared `published` and `archived` flags are independent targets.
//! Publish/unpublish is always evaluated before archive/unarchive, so a
//! request for both converges to archived in one pass (archiving unpublishes).
//! Transitions already applied are never rolled back on a later failure.

use serde::Serialize;
use tracing::{debug, info};

use crate::contentful::{Entity, PublishingService, Scope, Sys};
use crate::error::ApiResult;

/// Observable lifecycle state of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Neither published nor archived.
    Draft,
    /// Published.
    Published,
    /// Archived.
    Archived,
}

/// A lifecycle verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    /// Draft to published.
    Publish,
    /// Published to draft.
    Unpublish,
    /// To archived.
    Archive,
    /// Archived to draft.
    Unarchive,
}

/// Declared target membership.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleTarget {
    /// Should be published.
    pub published: bool,
    /// Should be archived.
    pub archived: bool,
}

impl LifecycleState {
    /// Derives the state from system metadata.
    #[must_use]
    pub const fn of(sys: &Sys) -> Self {
        if sys.is_archived() {
            Self::Archived
        } else if sys.is_published() {
            Self::Published
        } else {
            Self::Draft
        }
    }
}

impl LifecycleTarget {
    /// Creates a target.
    #[must_use]
    pub const fn new(published: bool, archived: bool) -> Self {
        Self {
            published,
            archived,
        }
    }

    /// The publish-phase transition needed from `sys`, if any.
    ///
    /// An archived entity that should stay archived needs none: archiving
    /// already superseded the publish.
    #[must_use]
    pub const fn publish_step(self, sys: &Sys) -> Option<Transition> {
        if self.archived && sys.is_archived() {
            return None;
        }
        match (self.published, sys.is_published()) {
            (true, false) => Some(Transition::Publish),
            (false, true) => Some(Transition::Unpublish),
            _ => None,
        }
    }

    /// The archive-phase transition needed from `sys`, if any.
    #[must_use]
    pub const fn archive_step(self, sys: &Sys) -> Option<Transition> {
        match (self.archived, sys.is_archived()) {
            (true, false) => Some(Transition::Archive),
            (false, true) => Some(Transition::Unarchive),
            _ => None,
        }
    }

    /// Every transition a pass would attempt from `sys`, in order.
    #[must_use]
    pub fn plan(self, sys: &Sys) -> Vec<Transition> {
        self.publish_step(sys)
            .into_iter()
            .chain(self.archive_step(sys))
            .collect()
    }
}

/// Drives one entity through its lifecycle transitions.
pub struct LifecycleStateMachine<'a, E: Entity> {
    service: &'a dyn PublishingService<E>,
    scope: &'a Scope,
}

impl<'a, E: Entity> LifecycleStateMachine<'a, E> {
    /// Creates a state machine bound to a service and scope.
    #[must_use]
    pub const fn new(service: &'a dyn PublishingService<E>, scope: &'a Scope) -> Self {
        Self { service, scope }
    }

    /// Runs one pass: publish phase, then archive phase.
    ///
    /// `entity` must carry the current remote version; each applied transition
    /// refreshes it in place. Returns the transitions that were applied.
    ///
    /// # Errors
    ///
    /// Returns the first failing transition's error. Earlier transitions stay
    /// applied.
    pub async fn converge(
        &self,
        entity: &mut E,
        target: LifecycleTarget,
    ) -> ApiResult<Vec<Transition>> {
        let mut applied = Vec::new();

        if let Some(transition) = target.publish_step(entity.sys()) {
            self.apply(transition, entity).await?;
            applied.push(transition);
        }

        // Evaluated against the refreshed sys: archiving may follow a publish.
        if let Some(transition) = target.archive_step(entity.sys()) {
            self.apply(transition, entity).await?;
            applied.push(transition);
        }

        if applied.is_empty() {
            debug!("{} {} already in target state", E::KIND, entity.sys().id);
        } else {
            info!(
                "{} {} is now {:?} after {:?}",
                E::KIND,
                entity.sys().id,
                LifecycleState::of(entity.sys()),
                applied
            );
        }

        Ok(applied)
    }

    async fn apply(&self, transition: Transition, entity: &mut E) -> ApiResult<()> {
        debug!("{:?} {} {}", transition, E::KIND, entity.sys().id);
        match transition {
            Transition::Publish => self.service.publish(self.scope, entity).await,
            Transition::Unpublish => self.service.unpublish(self.scope, entity).await,
            Transition::Archive => self.service.archive(self.scope, entity).await,
            Transition::Unarchive => self.service.unarchive(self.scope, entity).await,
        }
    }
}
