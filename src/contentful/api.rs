//! Service traits describing the content management API verb set.
//!
//! The reconciler only ever talks to these traits. A concrete client
//! (HTTP-backed, or [`super::InMemoryContentful`]) implements them and
//! classifies its failures into [`ApiError`](crate::error::ApiError) once.

use async_trait::async_trait;

use crate::error::ApiResult;

use super::types::{ApiKey, Asset, Entity, Entry, Environment, Locale, Space, Webhook};

/// Parent scope of a call.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Scope {
    /// Owning space, absent for space-level calls.
    pub space_id: Option<String>,
    /// Environment inside the space, for environment-scoped content.
    pub environment: Option<String>,
}

impl Scope {
    /// Scope for calls that address spaces themselves.
    #[must_use]
    pub const fn organization() -> Self {
        Self {
            space_id: None,
            environment: None,
        }
    }

    /// Scope for calls inside a space.
    #[must_use]
    pub fn space(space_id: impl Into<String>) -> Self {
        Self {
            space_id: Some(space_id.into()),
            environment: None,
        }
    }

    /// Narrows the scope to one environment of the space.
    #[must_use]
    pub fn in_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.space_id, &self.environment) {
            (Some(space_id), Some(environment)) => write!(f, "space {space_id}/{environment}"),
            (Some(space_id), None) => write!(f, "space {space_id}"),
            (None, _) => f.write_str("organization"),
        }
    }
}

/// CRUD verbs for one entity kind.
#[async_trait]
pub trait EntityService<E: Entity>: Send + Sync {
    /// Fetches an entity by ID.
    async fn get(&self, scope: &Scope, id: &str) -> ApiResult<E>;

    /// Creates (`sys.version == 0`) or updates the entity, refreshing its `sys`.
    async fn upsert(&self, scope: &Scope, entity: &mut E) -> ApiResult<()>;

    /// Deletes the entity at the version it carries.
    async fn delete(&self, scope: &Scope, entity: &E) -> ApiResult<()>;
}

/// Lifecycle verbs for entities that can be published and archived.
#[async_trait]
pub trait PublishingService<E: Entity>: EntityService<E> {
    /// Publishes the current version.
    async fn publish(&self, scope: &Scope, entity: &mut E) -> ApiResult<()>;

    /// Withdraws the published version.
    async fn unpublish(&self, scope: &Scope, entity: &mut E) -> ApiResult<()>;

    /// Archives the entity.
    async fn archive(&self, scope: &Scope, entity: &mut E) -> ApiResult<()>;

    /// Restores an archived entity to draft.
    async fn unarchive(&self, scope: &Scope, entity: &mut E) -> ApiResult<()>;

    /// Upcasts to the plain CRUD verbs.
    fn as_entity_service(&self) -> &dyn EntityService<E>;
}

/// Asset verbs, including server-side file processing.
#[async_trait]
pub trait AssetService: PublishingService<Asset> {
    /// Triggers processing of the file stored under `asset.locale`.
    async fn process(&self, scope: &Scope, asset: &mut Asset) -> ApiResult<()>;

    /// Upcasts to the lifecycle verbs.
    fn as_publishing_service(&self) -> &dyn PublishingService<Asset>;
}

/// An authenticated handle to the content management API.
pub trait ContentfulApi: Send + Sync {
    /// Space verbs.
    fn spaces(&self) -> &dyn EntityService<Space>;

    /// Environment verbs.
    fn environments(&self) -> &dyn EntityService<Environment>;

    /// Locale verbs.
    fn locales(&self) -> &dyn EntityService<Locale>;

    /// Webhook verbs.
    fn webhooks(&self) -> &dyn EntityService<Webhook>;

    /// API key verbs.
    fn api_keys(&self) -> &dyn EntityService<ApiKey>;

    /// Entry verbs.
    fn entries(&self) -> &dyn PublishingService<Entry>;

    /// Asset verbs.
    fn assets(&self) -> &dyn AssetService;
}
