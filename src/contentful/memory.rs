//! In-process implementation of the content management API.
//!
//! Behaves like the remote service where the reconciler can observe it:
//! server-assigned IDs, a version counter that advances by one per write,
//! optimistic version checks, publish/archive timestamps with automatic
//! unpublish on archive, write-only webhook passwords and asset processing.
//! Failures can be injected per entity kind and operation.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, ErrorResponse};

use super::api::{AssetService, ContentfulApi, EntityService, PublishingService, Scope};
use super::types::{ApiKey, Asset, Entity, Entry, Environment, Locale, Space, Webhook};

/// Host used for processed asset URLs.
const ASSET_HOST: &str = "//assets.ctfassets.net";

/// A collaborator verb, as recorded in the call log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Fetch by ID.
    Get,
    /// Create or update.
    Upsert,
    /// Delete.
    Delete,
    /// Publish.
    Publish,
    /// Unpublish.
    Unpublish,
    /// Archive.
    Archive,
    /// Unarchive.
    Unarchive,
    /// Asset file processing.
    Process,
}

/// One recorded collaborator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Entity kind.
    pub kind: &'static str,
    /// Verb.
    pub operation: Operation,
    /// Entity ID the call addressed (empty for creates without an ID).
    pub id: String,
}

/// Entities of one kind, keyed by `(scope, id)`.
pub type Table<E> = BTreeMap<(Scope, String), E>;

/// Opaque storage behind [`InMemoryContentful`].
#[derive(Debug, Default)]
pub struct Tables {
    spaces: Table<Space>,
    environments: Table<Environment>,
    locales: Table<Locale>,
    webhooks: Table<Webhook>,
    api_keys: Table<ApiKey>,
    entries: Table<Entry>,
    assets: Table<Asset>,
    failures: Vec<(&'static str, Operation, ApiError)>,
    lagging_reads: Vec<(&'static str, u32)>,
    calls: Vec<Call>,
}

impl Tables {
    /// Records the call and returns the injected failure for it, if any.
    fn begin(&mut self, kind: &'static str, operation: Operation, id: &str) -> ApiResult<()> {
        trace!("{kind} {operation:?} {id}");
        self.calls.push(Call {
            kind,
            operation,
            id: id.to_string(),
        });

        let position = self
            .failures
            .iter()
            .position(|(k, op, _)| *k == kind && *op == operation);
        match position {
            Some(index) => Err(self.failures.remove(index).2),
            None => Ok(()),
        }
    }

    /// Consumes one lagging read for `kind`, returning true if there was one.
    fn take_lagging_read(&mut self, kind: &'static str) -> bool {
        match self.lagging_reads.iter_mut().find(|(k, n)| *k == kind && *n > 0) {
            Some((_, remaining)) => {
                *remaining -= 1;
                true
            }
            None => false,
        }
    }
}

/// Per-kind storage and server-side behaviour.
pub trait StoredEntity: Entity {
    /// The table holding this kind.
    fn table(state: &mut Tables) -> &mut Table<Self>;

    /// Fills server-assigned attributes on create.
    fn on_create(&mut self, _scope: &Scope) -> ApiResult<()> {
        Ok(())
    }

    /// Carries attributes the client cannot change from the stored copy.
    fn on_update(&mut self, _stored: &Self) {}

    /// Strips write-only attributes before returning a copy.
    fn redact(&mut self) {}
}

impl StoredEntity for Space {
    fn table(state: &mut Tables) -> &mut Table<Self> {
        &mut state.spaces
    }

    fn on_update(&mut self, stored: &Self) {
        self.default_locale.clone_from(&stored.default_locale);
    }
}

impl StoredEntity for Environment {
    fn table(state: &mut Tables) -> &mut Table<Self> {
        &mut state.environments
    }

    fn on_create(&mut self, _scope: &Scope) -> ApiResult<()> {
        if self.sys.id.is_empty() {
            self.sys.id.clone_from(&self.name);
        }
        Ok(())
    }
}

impl StoredEntity for Locale {
    fn table(state: &mut Tables) -> &mut Table<Self> {
        &mut state.locales
    }
}

impl StoredEntity for Webhook {
    fn table(state: &mut Tables) -> &mut Table<Self> {
        &mut state.webhooks
    }

    fn redact(&mut self) {
        self.http_basic_password.clear();
    }
}

impl StoredEntity for ApiKey {
    fn table(state: &mut Tables) -> &mut Table<Self> {
        &mut state.api_keys
    }

    fn on_create(&mut self, _scope: &Scope) -> ApiResult<()> {
        self.access_token = Uuid::new_v4().simple().to_string();
        Ok(())
    }

    fn on_update(&mut self, stored: &Self) {
        self.access_token.clone_from(&stored.access_token);
    }
}

impl StoredEntity for Entry {
    fn table(state: &mut Tables) -> &mut Table<Self> {
        &mut state.entries
    }

    fn on_create(&mut self, _scope: &Scope) -> ApiResult<()> {
        if self.sys.content_type_id.as_deref().is_none_or(str::is_empty) {
            return Err(ApiError::Validation(
                ErrorResponse::new("Validation error")
                    .with_detail(["sys", "contentType"], "A content type is required"),
            ));
        }
        Ok(())
    }

    fn on_update(&mut self, stored: &Self) {
        self.sys.content_type_id.clone_from(&stored.sys.content_type_id);
    }
}

impl StoredEntity for Asset {
    fn table(state: &mut Tables) -> &mut Table<Self> {
        &mut state.assets
    }

    fn on_update(&mut self, stored: &Self) {
        for (locale, file) in &mut self.fields.file {
            if let Some(previous) = stored.fields.file.get(locale) {
                if previous.file_name == file.file_name && file.url.is_none() {
                    file.url.clone_from(&previous.url);
                    file.details = previous.details;
                }
            }
        }
    }
}

/// In-process content management API.
#[derive(Debug, Default)]
pub struct InMemoryContentful {
    state: Mutex<Tables>,
}

impl InMemoryContentful {
    /// Creates an empty instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Makes the next `operation` on an entity of kind `E` fail with `error`.
    pub fn fail_next<E: Entity>(&self, operation: Operation, error: ApiError) {
        self.with_state(|state| state.failures.push((E::KIND, operation, error)));
    }

    /// Simulates a server that is still writing in the background: each of
    /// the next `reads` fetches of kind `E` first advances the stored version.
    pub fn lag_reads<E: Entity>(&self, reads: u32) {
        self.with_state(|state| state.lagging_reads.push((E::KIND, reads)));
    }

    /// Returns every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.with_state(|state| state.calls.clone())
    }

    /// Returns the operations made against entities of kind `E`, in order.
    #[must_use]
    pub fn operations<E: Entity>(&self) -> Vec<Operation> {
        self.calls()
            .into_iter()
            .filter(|c| c.kind == E::KIND)
            .map(|c| c.operation)
            .collect()
    }

    /// Stores an entity directly, bypassing the verbs, as if written by
    /// another client. Assigns an ID and version when missing.
    pub fn seed<E: StoredEntity>(&self, scope: &Scope, mut entity: E) -> E {
        self.with_state(|state| {
            let sys = entity.sys_mut();
            if sys.id.is_empty() {
                sys.id = new_id();
            }
            if sys.version == 0 {
                sys.version = 1;
            }
            sys.space_id.clone_from(&scope.space_id);
            let key = (scope.clone(), sys.id.clone());
            E::table(state).insert(key, entity.clone());
        });
        entity
    }

    /// Removes an entity directly, as if deleted by another client.
    pub fn remove<E: StoredEntity>(&self, scope: &Scope, id: &str) -> bool {
        self.with_state(|state| {
            E::table(state)
                .remove(&(scope.clone(), id.to_string()))
                .is_some()
        })
    }

    /// Returns the stored copy of an entity, without recording a call.
    #[must_use]
    pub fn peek<E: StoredEntity>(&self, scope: &Scope, id: &str) -> Option<E> {
        self.with_state(|state| {
            E::table(state)
                .get(&(scope.clone(), id.to_string()))
                .cloned()
        })
    }

    fn get_entity<E: StoredEntity>(&self, scope: &Scope, id: &str) -> ApiResult<E> {
        self.with_state(|state| {
            state.begin(E::KIND, Operation::Get, id)?;
            let lagging = state.take_lagging_read(E::KIND);
            let stored = E::table(state)
                .get_mut(&(scope.clone(), id.to_string()))
                .ok_or_else(|| not_found(E::KIND, id))?;
            if lagging {
                stored.sys_mut().version += 1;
            }
            let mut entity = stored.clone();
            entity.redact();
            Ok(entity)
        })
    }

    fn upsert_entity<E: StoredEntity>(&self, scope: &Scope, entity: &mut E) -> ApiResult<()> {
        self.with_state(|state| {
            state.begin(E::KIND, Operation::Upsert, &entity.sys().id)?;
            let mut next = entity.clone();

            if next.sys().version == 0 {
                next.on_create(scope)?;
                if next.sys().id.is_empty() {
                    next.sys_mut().id = new_id();
                }
                let key = (scope.clone(), next.sys().id.clone());
                if E::table(state).contains_key(&key) {
                    return Err(version_mismatch());
                }
                let sys = next.sys_mut();
                sys.version = 1;
                sys.space_id.clone_from(&scope.space_id);
                sys.published_at = None;
                sys.archived_at = None;
                sys.updated_at = Some(Utc::now());
                debug!("Created {} {}", E::KIND, sys.id);
                E::table(state).insert(key, next.clone());
            } else {
                let key = (scope.clone(), next.sys().id.clone());
                let stored = E::table(state)
                    .get(&key)
                    .cloned()
                    .ok_or_else(|| not_found(E::KIND, &key.1))?;
                if stored.sys().version != next.sys().version {
                    return Err(version_mismatch());
                }
                next.on_update(&stored);
                let mut sys = stored.sys().clone();
                sys.version += 1;
                sys.updated_at = Some(Utc::now());
                *next.sys_mut() = sys;
                E::table(state).insert(key, next.clone());
            }

            next.redact();
            *entity = next;
            Ok(())
        })
    }

    fn delete_entity<E: StoredEntity>(&self, scope: &Scope, entity: &E) -> ApiResult<()> {
        self.with_state(|state| {
            let id = entity.sys().id.clone();
            state.begin(E::KIND, Operation::Delete, &id)?;
            let key = (scope.clone(), id);
            let stored = E::table(state)
                .get(&key)
                .ok_or_else(|| not_found(E::KIND, &key.1))?;
            if stored.sys().version != entity.sys().version {
                return Err(version_mismatch());
            }
            E::table(state).remove(&key);
            Ok(())
        })
    }

    /// Applies a lifecycle verb to the stored entity and refreshes the caller's `sys`.
    fn transition<E: StoredEntity>(
        &self,
        scope: &Scope,
        entity: &mut E,
        operation: Operation,
    ) -> ApiResult<()> {
        self.with_state(|state| {
            let id = entity.sys().id.clone();
            state.begin(E::KIND, operation, &id)?;
            let key = (scope.clone(), id);
            let table = E::table(state);
            let stored = table
                .get_mut(&key)
                .ok_or_else(|| not_found(E::KIND, &key.1))?;
            if stored.sys().version != entity.sys().version {
                return Err(version_mismatch());
            }

            let now = Some(Utc::now());
            let sys = stored.sys_mut();
            match operation {
                Operation::Publish if sys.archived_at.is_some() => {
                    return Err(rejected("Cannot publish an archived entity"));
                }
                Operation::Publish => sys.published_at = now,
                Operation::Unpublish if sys.published_at.is_none() => {
                    return Err(rejected("Entity is not published"));
                }
                Operation::Unpublish => sys.published_at = None,
                Operation::Archive if sys.archived_at.is_some() => {
                    return Err(rejected("Entity is already archived"));
                }
                Operation::Archive => {
                    sys.published_at = None;
                    sys.archived_at = now;
                }
                Operation::Unarchive if sys.archived_at.is_none() => {
                    return Err(rejected("Entity is not archived"));
                }
                Operation::Unarchive => sys.archived_at = None,
                Operation::Get | Operation::Upsert | Operation::Delete | Operation::Process => {
                    return Err(ApiError::transport(format!(
                        "{operation:?} is not a lifecycle transition"
                    )));
                }
            }
            sys.version += 1;
            sys.updated_at = now;

            *entity.sys_mut() = sys.clone();
            Ok(())
        })
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn not_found(kind: &str, id: &str) -> ApiError {
    ApiError::not_found(format!("The {kind} {id} could not be found."))
}

fn version_mismatch() -> ApiError {
    ApiError::conflict("Version mismatch")
}

fn rejected(message: &str) -> ApiError {
    ApiError::Validation(ErrorResponse::new(message))
}

/// Entities that can be published and archived.
pub trait PublishableEntity: StoredEntity {}

impl PublishableEntity for Entry {}
impl PublishableEntity for Asset {}

#[async_trait]
impl<E: StoredEntity> EntityService<E> for InMemoryContentful {
    async fn get(&self, scope: &Scope, id: &str) -> ApiResult<E> {
        self.get_entity(scope, id)
    }

    async fn upsert(&self, scope: &Scope, entity: &mut E) -> ApiResult<()> {
        self.upsert_entity(scope, entity)
    }

    async fn delete(&self, scope: &Scope, entity: &E) -> ApiResult<()> {
        self.delete_entity(scope, entity)
    }
}

#[async_trait]
impl<E: PublishableEntity> PublishingService<E> for InMemoryContentful {
    async fn publish(&self, scope: &Scope, entity: &mut E) -> ApiResult<()> {
        self.transition(scope, entity, Operation::Publish)
    }

    async fn unpublish(&self, scope: &Scope, entity: &mut E) -> ApiResult<()> {
        self.transition(scope, entity, Operation::Unpublish)
    }

    async fn archive(&self, scope: &Scope, entity: &mut E) -> ApiResult<()> {
        self.transition(scope, entity, Operation::Archive)
    }

    async fn unarchive(&self, scope: &Scope, entity: &mut E) -> ApiResult<()> {
        self.transition(scope, entity, Operation::Unarchive)
    }

    fn as_entity_service(&self) -> &dyn EntityService<E> {
        self
    }
}

#[async_trait]
impl AssetService for InMemoryContentful {
    async fn process(&self, scope: &Scope, asset: &mut Asset) -> ApiResult<()> {
        self.with_state(|state| {
            let id = asset.sys.id.clone();
            state.begin(Asset::KIND, Operation::Process, &id)?;
            let key = (scope.clone(), id);
            let stored = state
                .assets
                .get_mut(&key)
                .ok_or_else(|| not_found(Asset::KIND, &key.1))?;
            if stored.sys.version != asset.sys.version {
                return Err(version_mismatch());
            }

            let file = stored
                .fields
                .file
                .get_mut(&asset.locale)
                .ok_or_else(|| {
                    ApiError::Validation(ErrorResponse::new("Validation error").with_detail(
                        ["fields", "file", asset.locale.as_str()],
                        "No file stored for this locale",
                    ))
                })?;
            if file.upload_url.is_none() && file.upload_from_id.is_none() {
                return Err(rejected("Nothing to process: the file has no upload source"));
            }

            let space_id = key.0.space_id.as_deref().unwrap_or_default();
            file.url = Some(format!(
                "{ASSET_HOST}/{space_id}/{}/{}",
                key.1, file.file_name
            ));
            file.upload_url = None;
            stored.sys.version += 1;
            stored.sys.updated_at = Some(Utc::now());
            debug!("Processed asset {} ({})", key.1, asset.locale);

            *asset = Asset {
                locale: asset.locale.clone(),
                ..stored.clone()
            };
            Ok(())
        })
    }

    fn as_publishing_service(&self) -> &dyn PublishingService<Asset> {
        self
    }
}

impl ContentfulApi for InMemoryContentful {
    fn spaces(&self) -> &dyn EntityService<Space> {
        self
    }

    fn environments(&self) -> &dyn EntityService<Environment> {
        self
    }

    fn locales(&self) -> &dyn EntityService<Locale> {
        self
    }

    fn webhooks(&self) -> &dyn EntityService<Webhook> {
        self
    }

    fn api_keys(&self) -> &dyn EntityService<ApiKey> {
        self
    }

    fn entries(&self) -> &dyn PublishingService<Entry> {
        self
    }

    fn assets(&self) -> &dyn AssetService {
        self
    }
}
