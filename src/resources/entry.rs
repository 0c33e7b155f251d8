//! Entry declaration.
//!
//! Fields are declared as flat `(field_id, locale, content)` triples. Only
//! the locales a declaration uses are written or read back, so entries
//! managed per locale by several declarations do not overwrite each other.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::contentful::{ContentfulApi, EntityService, Entry, PublishingService, Scope, Sys};
use crate::error::{ApiResult, ReconcileError};
use crate::lifecycle::{LifecycleStateMachine, LifecycleTarget};
use crate::localized::{
    LocalizedField, entry_fields, locales_of, merge_fields, refresh_entry_fields,
};
use crate::reconciler::{Identity, Reconciler, Resource};

/// A declared entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryResource {
    /// Owning space.
    pub space_id: String,
    /// Caller-chosen entry ID.
    pub entry_id: String,
    /// Content type the entry belongs to.
    pub contenttype_id: String,
    /// Active locale of this declaration.
    pub locale: String,
    /// Field values.
    #[serde(default)]
    pub field: Vec<LocalizedField>,
    /// Should be published.
    #[serde(default)]
    pub published: bool,
    /// Should be archived.
    #[serde(default)]
    pub archived: bool,
    /// Remote identity.
    #[serde(flatten)]
    pub identity: Identity,
}

impl EntryResource {
    /// Locales this declaration owns.
    fn locales(&self) -> BTreeSet<String> {
        let mut locales = locales_of(&self.field);
        locales.insert(self.locale.clone());
        locales
    }

    const fn target(&self) -> LifecycleTarget {
        LifecycleTarget::new(self.published, self.archived)
    }
}

#[async_trait]
impl Resource for EntryResource {
    type Entity = Entry;

    fn service(api: &dyn ContentfulApi) -> &dyn EntityService<Entry> {
        let entries: &dyn PublishingService<Entry> = api.entries();
        entries.as_entity_service()
    }

    fn scope(&self, config: &ProviderConfig) -> Scope {
        Scope::space(self.space_id.clone()).in_environment(config.environment.clone())
    }

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }

    fn to_entity(&self) -> Result<Entry, ReconcileError> {
        Ok(Entry {
            sys: Sys {
                content_type_id: Some(self.contenttype_id.clone()),
                ..Sys::with_id(self.entry_id.clone())
            },
            locale: self.locale.clone(),
            fields: entry_fields(&self.field),
        })
    }

    fn apply_to(&self, entity: &mut Entry) -> Result<(), ReconcileError> {
        entity.locale.clone_from(&self.locale);
        merge_fields(&mut entity.fields, entry_fields(&self.field), &self.locales());
        Ok(())
    }

    // `published` and `archived` are targets, not observations: they stay as
    // declared.
    fn refresh(&mut self, entity: &Entry) {
        let locales = self.locales();
        self.field = refresh_entry_fields(&self.field, &entity.fields, &locales);
        if let Some(content_type_id) = &entity.sys.content_type_id {
            self.contenttype_id.clone_from(content_type_id);
        }
    }

    async fn after_upsert(
        &self,
        reconciler: &Reconciler<'_>,
        scope: &Scope,
        entity: &mut Entry,
    ) -> ApiResult<()> {
        LifecycleStateMachine::new(reconciler.api().entries(), scope)
            .converge(entity, self.target())
            .await
            .map(|_| ())
    }
}
