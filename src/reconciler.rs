//! Generic reconciler for declared resources.
//!
//! Each entity kind implements [`Resource`]; [`Reconciler`] drives
//! Create/Read/Update/Delete for all of them the same way. Every operation
//! mutates the declared resource in place and returns [`Diagnostics`]. Errors
//! are translated exactly once, here, at the operation boundary.
//!
//! The resource's remote identity is the join key between declared and
//! remote state. It is assigned once by Create and only ever cleared
//! afterwards (drift on Read, success on Delete).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::ProviderConfig;
use crate::contentful::{ContentfulApi, Entity, EntityService, Scope};
use crate::diagnostics::Diagnostics;
use crate::error::{ApiResult, ReconcileError, Result};

/// Remote identity of a declared resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Remote ID. `None` until created, and again after drift or deletion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Last version observed remotely.
    #[serde(default)]
    pub version: u64,
}

impl Identity {
    /// Returns true once the resource exists remotely.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.id.is_some()
    }

    /// Forgets the remote identity.
    pub fn clear(&mut self) {
        self.id = None;
        self.version = 0;
    }
}

/// A declarative attribute set for one entity kind.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Remote entity type.
    type Entity: Entity;

    /// The service handling this kind.
    fn service(api: &dyn ContentfulApi) -> &dyn EntityService<Self::Entity>;

    /// Parent scope of every call for this resource.
    fn scope(&self, config: &ProviderConfig) -> Scope;

    /// Remote identity.
    fn identity(&self) -> &Identity;

    /// Mutable remote identity.
    fn identity_mut(&mut self) -> &mut Identity;

    /// Builds a new payload from the declared attributes.
    ///
    /// # Errors
    ///
    /// Returns an error if the attributes cannot form a valid payload.
    fn to_entity(&self) -> std::result::Result<Self::Entity, ReconcileError>;

    /// Applies the declared attributes onto a freshly fetched entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the attributes cannot form a valid payload.
    fn apply_to(&self, entity: &mut Self::Entity) -> std::result::Result<(), ReconcileError>;

    /// Copies remote attributes back into the declaration.
    fn refresh(&mut self, entity: &Self::Entity);

    /// Runs after every successful upsert, before the result is mapped back.
    ///
    /// # Errors
    ///
    /// Returns the first collaborator error.
    async fn after_upsert(
        &self,
        _reconciler: &Reconciler<'_>,
        _scope: &Scope,
        _entity: &mut Self::Entity,
    ) -> ApiResult<()> {
        Ok(())
    }
}

/// Drives declared resources towards their remote counterparts.
pub struct Reconciler<'a> {
    /// Content management API.
    api: &'a dyn ContentfulApi,
    /// Provider configuration.
    config: &'a ProviderConfig,
}

impl<'a> Reconciler<'a> {
    /// Creates a new reconciler.
    #[must_use]
    pub const fn new(api: &'a dyn ContentfulApi, config: &'a ProviderConfig) -> Self {
        Self { api, config }
    }

    /// The API handle.
    #[must_use]
    pub const fn api(&self) -> &'a dyn ContentfulApi {
        self.api
    }

    /// The provider configuration.
    #[must_use]
    pub const fn config(&self) -> &'a ProviderConfig {
        self.config
    }

    /// Creates the remote entity and records its identity.
    pub async fn create<R: Resource>(&self, resource: &mut R) -> Diagnostics {
        info!("Creating {}", R::Entity::KIND);
        let result = self.try_create(resource).await;
        Self::finish::<R>("create", resource, &result)
    }

    /// Refreshes the declaration from remote state. A missing entity is drift:
    /// the identity is cleared and no diagnostics are returned.
    pub async fn read<R: Resource>(&self, resource: &mut R) -> Diagnostics {
        let result = self.try_read(resource).await;
        if let Err(err) = &result {
            error!("Failed to read {}: {err}", R::Entity::KIND);
        }
        Diagnostics::from_result(&result)
    }

    /// Applies the declaration onto the current remote entity.
    pub async fn update<R: Resource>(&self, resource: &mut R) -> Diagnostics {
        info!("Updating {} {}", R::Entity::KIND, display_id(resource.identity()));
        let result = self.try_update(resource).await;
        Self::finish::<R>("update", resource, &result)
    }

    /// Deletes the remote entity. An already-absent entity counts as deleted.
    pub async fn delete<R: Resource>(&self, resource: &mut R) -> Diagnostics {
        info!("Deleting {} {}", R::Entity::KIND, display_id(resource.identity()));
        let result = self.try_delete(resource).await;
        Self::finish::<R>("delete", resource, &result)
    }

    async fn try_create<R: Resource>(&self, resource: &mut R) -> Result<()> {
        let scope = resource.scope(self.config);
        let service = R::service(self.api);

        let mut entity = resource.to_entity()?;
        entity.sys_mut().version = 0;
        service.upsert(&scope, &mut entity).await?;

        // Identity holds from here on, even if a later phase fails.
        resource.identity_mut().id = Some(entity.sys().id.clone());
        self.complete_upsert(resource, &scope, entity).await
    }

    async fn try_read<R: Resource>(&self, resource: &mut R) -> Result<()> {
        let Some(id) = resource.identity().id.clone() else {
            debug!("{} has no identity, nothing to read", R::Entity::KIND);
            return Ok(());
        };
        let scope = resource.scope(self.config);

        match R::service(self.api).get(&scope, &id).await {
            Ok(entity) => {
                Self::sync(resource, &entity);
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                warn!("{} {id} no longer exists in {scope}, clearing identity", R::Entity::KIND);
                resource.identity_mut().clear();
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn try_update<R: Resource>(&self, resource: &mut R) -> Result<()> {
        let id = resource
            .identity()
            .id
            .clone()
            .ok_or(ReconcileError::MissingIdentity {
                kind: R::Entity::KIND,
            })?;
        let scope = resource.scope(self.config);
        let service = R::service(self.api);

        // The fetched version is the one the server holds right now.
        let mut entity = service.get(&scope, &id).await?;
        resource.apply_to(&mut entity)?;
        service.upsert(&scope, &mut entity).await?;

        self.complete_upsert(resource, &scope, entity).await
    }

    async fn try_delete<R: Resource>(&self, resource: &mut R) -> Result<()> {
        let Some(id) = resource.identity().id.clone() else {
            debug!("{} has no identity, nothing to delete", R::Entity::KIND);
            return Ok(());
        };
        let scope = resource.scope(self.config);
        let service = R::service(self.api);

        let outcome = match service.get(&scope, &id).await {
            Ok(entity) => service.delete(&scope, &entity).await,
            Err(err) => Err(err),
        };

        match outcome {
            Ok(()) => {}
            Err(err) if err.is_not_found() => {
                debug!("{} {id} already absent", R::Entity::KIND);
            }
            Err(err) => return Err(err.into()),
        }

        resource.identity_mut().clear();
        Ok(())
    }

    async fn complete_upsert<R: Resource>(
        &self,
        resource: &mut R,
        scope: &Scope,
        mut entity: R::Entity,
    ) -> Result<()> {
        // Declared targets drive the phase, so refresh only once it ran.
        // Transitions applied before a failure are still reflected locally.
        let outcome = resource.after_upsert(self, scope, &mut entity).await;
        Self::sync(resource, &entity);
        outcome.map_err(Into::into)
    }

    /// Polls `id` with backoff until two consecutive reads report the same
    /// version, and returns the last read.
    ///
    /// Gives up after the configured number of attempts with a warning and
    /// returns the last read. With settling disabled, reads once.
    ///
    /// # Errors
    ///
    /// Returns the first failed read.
    pub async fn settle<E: Entity>(
        &self,
        service: &dyn EntityService<E>,
        scope: &Scope,
        id: &str,
    ) -> ApiResult<E> {
        let policy = self.config.settle;
        let mut last = service.get(scope, id).await?;
        if !policy.is_enabled() {
            return Ok(last);
        }

        for attempt in 0..policy.max_attempts {
            tokio::time::sleep(policy.delay(attempt)).await;
            let next = service.get(scope, id).await?;
            if next.sys().version == last.sys().version {
                debug!("{} {id} settled at version {}", E::KIND, next.sys().version);
                return Ok(next);
            }
            last = next;
        }

        warn!(
            "{} {id} still changing after {} polls, continuing at version {}",
            E::KIND,
            policy.max_attempts,
            last.sys().version
        );
        Ok(last)
    }

    fn sync<R: Resource>(resource: &mut R, entity: &R::Entity) {
        resource.identity_mut().version = entity.sys().version;
        resource.refresh(entity);
    }

    fn finish<R: Resource>(operation: &str, resource: &R, result: &Result<()>) -> Diagnostics {
        let kind = R::Entity::KIND;
        match result {
            Ok(()) => info!(
                "Finished {operation} of {kind} {}",
                display_id(resource.identity())
            ),
            Err(err) => error!("Failed to {operation} {kind}: {err}"),
        }
        Diagnostics::from_result(result)
    }
}

fn display_id(identity: &Identity) -> &str {
    identity.id.as_deref().unwrap_or("<new>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettleConfig;
    use crate::contentful::{Asset, InMemoryContentful, Locale, Operation, Sys};
    use crate::diagnostics::Severity;
    use crate::error::{ApiError, ErrorResponse};

    /// Minimal declaration exercising the generic paths.
    #[derive(Debug, Default)]
    struct TestLocale {
        space_id: String,
        name: String,
        code: String,
        identity: Identity,
    }

    impl Resource for TestLocale {
        type Entity = Locale;

        fn service(api: &dyn ContentfulApi) -> &dyn EntityService<Locale> {
            api.locales()
        }

        fn scope(&self, _config: &ProviderConfig) -> Scope {
            Scope::space(self.space_id.clone())
        }

        fn identity(&self) -> &Identity {
            &self.identity
        }

        fn identity_mut(&mut self) -> &mut Identity {
            &mut self.identity
        }

        fn to_entity(&self) -> std::result::Result<Locale, ReconcileError> {
            let mut locale = Locale::default();
            self.apply_to(&mut locale)?;
            Ok(locale)
        }

        fn apply_to(&self, entity: &mut Locale) -> std::result::Result<(), ReconcileError> {
            entity.name.clone_from(&self.name);
            entity.code.clone_from(&self.code);
            Ok(())
        }

        fn refresh(&mut self, entity: &Locale) {
            self.name.clone_from(&entity.name);
            self.code.clone_from(&entity.code);
        }
    }

    fn declared() -> TestLocale {
        TestLocale {
            space_id: String::from("space-1"),
            name: String::from("German"),
            code: String::from("de-DE"),
            identity: Identity::default(),
        }
    }

    fn fast_config() -> ProviderConfig {
        ProviderConfig::new("token", "org").with_settle(SettleConfig {
            initial_delay_ms: 1,
            multiplier: 1,
            max_attempts: 3,
        })
    }

    #[tokio::test]
    async fn test_create_records_identity_and_version() {
        let api = InMemoryContentful::new();
        let config = fast_config();
        let reconciler = Reconciler::new(&api, &config);
        let mut locale = declared();

        let diags = reconciler.create(&mut locale).await;

        assert!(diags.is_empty());
        assert!(locale.identity.is_set());
        assert_eq!(locale.identity.version, 1);
        assert_eq!(api.operations::<Locale>(), vec![Operation::Upsert]);
    }

    #[tokio::test]
    async fn test_create_translates_validation_error() {
        let api = InMemoryContentful::new();
        let config = fast_config();
        api.fail_next::<Locale>(
            Operation::Upsert,
            ApiError::Validation(
                ErrorResponse::new("Validation error").with_detail(["code"], "is taken"),
            ),
        );
        let mut locale = declared();

        let diags = Reconciler::new(&api, &config).create(&mut locale).await;

        assert_eq!(diags.len(), 2);
        assert_eq!(diags.as_slice()[0].severity, Severity::Warning);
        assert_eq!(diags.as_slice()[0].summary, "is taken (code)");
        assert_eq!(diags.as_slice()[1].severity, Severity::Error);
        assert_eq!(diags.as_slice()[1].summary, "Validation error");
        assert!(!locale.identity.is_set());
    }

    #[tokio::test]
    async fn test_read_refreshes_attributes() {
        let api = InMemoryContentful::new();
        let config = fast_config();
        let reconciler = Reconciler::new(&api, &config);
        let mut locale = declared();
        reconciler.create(&mut locale).await;

        let id = locale.identity.id.clone().expect("created");
        let mut remote: Locale = api.peek(&Scope::space("space-1"), &id).expect("stored");
        remote.name = String::from("Deutsch");
        remote.sys.version += 1;
        api.seed(&Scope::space("space-1"), remote);

        let diags = reconciler.read(&mut locale).await;

        assert!(diags.is_empty());
        assert_eq!(locale.name, "Deutsch");
        assert_eq!(locale.identity.version, 2);
    }

    #[tokio::test]
    async fn test_read_missing_clears_identity() {
        let api = InMemoryContentful::new();
        let config = fast_config();
        let reconciler = Reconciler::new(&api, &config);
        let mut locale = declared();
        reconciler.create(&mut locale).await;
        let id = locale.identity.id.clone().expect("created");
        assert!(api.remove::<Locale>(&Scope::space("space-1"), &id));

        let diags = reconciler.read(&mut locale).await;

        assert!(diags.is_empty());
        assert!(!locale.identity.is_set());
    }

    #[tokio::test]
    async fn test_read_transport_error_is_surfaced() {
        let api = InMemoryContentful::new();
        let config = fast_config();
        let mut locale = declared();
        locale.identity.id = Some(String::from("loc-1"));
        api.fail_next::<Locale>(Operation::Get, ApiError::transport("connection reset"));

        let diags = Reconciler::new(&api, &config).read(&mut locale).await;

        assert_eq!(diags.len(), 1);
        assert_eq!(diags.as_slice()[0].summary, "connection reset");
        assert!(locale.identity.is_set());
    }

    #[tokio::test]
    async fn test_update_uses_fetched_version() {
        let api = InMemoryContentful::new();
        let config = fast_config();
        let reconciler = Reconciler::new(&api, &config);
        let mut locale = declared();
        reconciler.create(&mut locale).await;

        // Someone else wrote in between; the cached version is stale.
        let id = locale.identity.id.clone().expect("created");
        let mut remote: Locale = api.peek(&Scope::space("space-1"), &id).expect("stored");
        remote.sys.version = 5;
        api.seed(&Scope::space("space-1"), remote);

        locale.name = String::from("Deutsch (Deutschland)");
        let diags = reconciler.update(&mut locale).await;

        assert!(diags.is_empty());
        assert_eq!(locale.identity.version, 6);
        assert_eq!(locale.identity.id.as_deref(), Some(id.as_str()));
    }

    #[tokio::test]
    async fn test_update_conflict_is_not_retried() {
        let api = InMemoryContentful::new();
        let config = fast_config();
        let reconciler = Reconciler::new(&api, &config);
        let mut locale = declared();
        reconciler.create(&mut locale).await;
        api.fail_next::<Locale>(Operation::Upsert, ApiError::conflict("Version mismatch"));

        let diags = reconciler.update(&mut locale).await;

        assert_eq!(diags.len(), 1);
        assert!(diags.has_error());
        assert_eq!(diags.as_slice()[0].summary, "Version mismatch");
        assert_eq!(
            api.operations::<Locale>(),
            vec![Operation::Upsert, Operation::Get, Operation::Upsert]
        );
    }

    #[tokio::test]
    async fn test_update_without_identity() {
        let api = InMemoryContentful::new();
        let config = fast_config();
        let mut locale = declared();

        let diags = Reconciler::new(&api, &config).update(&mut locale).await;

        assert!(diags.has_error());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_clears_identity() {
        let api = InMemoryContentful::new();
        let config = fast_config();
        let reconciler = Reconciler::new(&api, &config);
        let mut locale = declared();
        reconciler.create(&mut locale).await;
        let id = locale.identity.id.clone().expect("created");

        let diags = reconciler.delete(&mut locale).await;

        assert!(diags.is_empty());
        assert!(!locale.identity.is_set());
        assert!(api.peek::<Locale>(&Scope::space("space-1"), &id).is_none());
    }

    #[tokio::test]
    async fn test_delete_absent_is_idempotent() {
        let api = InMemoryContentful::new();
        let config = fast_config();
        let mut locale = declared();
        locale.identity.id = Some(String::from("gone"));

        let diags = Reconciler::new(&api, &config).delete(&mut locale).await;

        assert!(diags.is_empty());
        assert!(!locale.identity.is_set());
    }

    #[tokio::test]
    async fn test_delete_not_found_on_delete_call() {
        let api = InMemoryContentful::new();
        let config = fast_config();
        let reconciler = Reconciler::new(&api, &config);
        let mut locale = declared();
        reconciler.create(&mut locale).await;
        api.fail_next::<Locale>(Operation::Delete, ApiError::not_found("gone"));

        let diags = reconciler.delete(&mut locale).await;

        assert!(diags.is_empty());
        assert!(!locale.identity.is_set());
    }

    #[tokio::test]
    async fn test_settle_waits_for_stable_version() {
        let api = InMemoryContentful::new();
        let config = fast_config();
        let scope = Scope::space("space-1");
        api.seed(
            &scope,
            Asset {
                sys: Sys::with_id("asset-1"),
                ..Asset::default()
            },
        );
        api.lag_reads::<Asset>(2);

        let reconciler = Reconciler::new(&api, &config);
        let asset = reconciler
            .settle(api.assets().as_publishing_service().as_entity_service(), &scope, "asset-1")
            .await
            .expect("settle failed");

        assert_eq!(asset.sys.version, 3);
        assert_eq!(api.operations::<Asset>().len(), 3);
    }

    #[tokio::test]
    async fn test_settle_gives_up_with_last_read() {
        let api = InMemoryContentful::new();
        let config = fast_config();
        let scope = Scope::space("space-1");
        api.seed(
            &scope,
            Asset {
                sys: Sys::with_id("asset-1"),
                ..Asset::default()
            },
        );
        api.lag_reads::<Asset>(10);

        let reconciler = Reconciler::new(&api, &config);
        let asset = reconciler
            .settle(api.assets().as_publishing_service().as_entity_service(), &scope, "asset-1")
            .await
            .expect("settle failed");

        // One initial read plus three polls, each advancing the version.
        assert_eq!(asset.sys.version, 5);
        assert_eq!(api.operations::<Asset>().len(), 4);
    }

    #[tokio::test]
    async fn test_settle_disabled_reads_once() {
        let api = InMemoryContentful::new();
        let config = ProviderConfig::new("token", "org").with_settle(SettleConfig::disabled());
        let scope = Scope::space("space-1");
        api.seed(
            &scope,
            Asset {
                sys: Sys::with_id("asset-1"),
                ..Asset::default()
            },
        );

        let reconciler = Reconciler::new(&api, &config);
        reconciler
            .settle(api.assets().as_publishing_service().as_entity_service(), &scope, "asset-1")
            .await
            .expect("settle failed");

        assert_eq!(api.operations::<Asset>(), vec![Operation::Get]);
    }
}
