//! Space declaration.

use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::contentful::{ContentfulApi, EntityService, Scope, Space};
use crate::error::ReconcileError;
use crate::reconciler::{Identity, Resource};

/// A declared space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceResource {
    /// Display name.
    pub name: String,
    /// Locale the space is created with. Only honoured on create.
    #[serde(default = "default_locale")]
    pub default_locale: String,
    /// Remote identity.
    #[serde(flatten)]
    pub identity: Identity,
}

impl SpaceResource {
    /// Declares a space with the default locale.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_locale: default_locale(),
            identity: Identity::default(),
        }
    }
}

impl Resource for SpaceResource {
    type Entity = Space;

    fn service(api: &dyn ContentfulApi) -> &dyn EntityService<Space> {
        api.spaces()
    }

    fn scope(&self, _config: &ProviderConfig) -> Scope {
        Scope::organization()
    }

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }

    fn to_entity(&self) -> Result<Space, ReconcileError> {
        Ok(Space {
            name: self.name.clone(),
            default_locale: self.default_locale.clone(),
            ..Space::default()
        })
    }

    fn apply_to(&self, entity: &mut Space) -> Result<(), ReconcileError> {
        entity.name.clone_from(&self.name);
        Ok(())
    }

    fn refresh(&mut self, entity: &Space) {
        self.name.clone_from(&entity.name);
    }
}

fn default_locale() -> String {
    String::from("en")
}
