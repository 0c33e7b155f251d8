//! Environment declaration. The environment's name doubles as its ID.

use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::contentful::{ContentfulApi, EntityService, Environment, Scope, Sys};
use crate::error::ReconcileError;
use crate::reconciler::{Identity, Resource};

/// A declared environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentResource {
    /// Owning space.
    pub space_id: String,
    /// Name and ID.
    pub name: String,
    /// Remote identity.
    #[serde(flatten)]
    pub identity: Identity,
}

impl EnvironmentResource {
    /// Declares an environment.
    #[must_use]
    pub fn new(space_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            space_id: space_id.into(),
            name: name.into(),
            identity: Identity::default(),
        }
    }
}

impl Resource for EnvironmentResource {
    type Entity = Environment;

    fn service(api: &dyn ContentfulApi) -> &dyn EntityService<Environment> {
        api.environments()
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

    fn to_entity(&self) -> Result<Environment, ReconcileError> {
        Ok(Environment {
            sys: Sys::with_id(self.name.clone()),
            name: self.name.clone(),
        })
    }

    fn apply_to(&self, entity: &mut Environment) -> Result<(), ReconcileError> {
        entity.name.clone_from(&self.name);
        Ok(())
    }

    fn refresh(&mut self, entity: &Environment) {
        self.name.clone_from(&entity.name);
        if let Some(space_id) = &entity.sys.space_id {
            self.space_id.clone_from(space_id);
        }
    }
}
