//! Delivery API key declaration.

use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::contentful::{ApiKey, ContentfulApi, EntityService, Scope};
use crate::error::ReconcileError;
use crate::reconciler::{Identity, Resource};

/// A declared delivery API key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyResource {
    /// Owning space.
    pub space_id: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Token assigned by the server.
    #[serde(default)]
    pub access_token: String,
    /// Remote identity.
    #[serde(flatten)]
    pub identity: Identity,
}

impl ApiKeyResource {
    /// Declares an API key.
    #[must_use]
    pub fn new(space_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            space_id: space_id.into(),
            name: name.into(),
            description: String::new(),
            access_token: String::new(),
            identity: Identity::default(),
        }
    }
}

impl Resource for ApiKeyResource {
    type Entity = ApiKey;

    fn service(api: &dyn ContentfulApi) -> &dyn EntityService<ApiKey> {
        api.api_keys()
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

    fn to_entity(&self) -> Result<ApiKey, ReconcileError> {
        Ok(ApiKey {
            name: self.name.clone(),
            description: self.description.clone(),
            ..ApiKey::default()
        })
    }

    fn apply_to(&self, entity: &mut ApiKey) -> Result<(), ReconcileError> {
        entity.name.clone_from(&self.name);
        entity.description.clone_from(&self.description);
        Ok(())
    }

    fn refresh(&mut self, entity: &ApiKey) {
        self.name.clone_from(&entity.name);
        self.description.clone_from(&entity.description);
        self.access_token.clone_from(&entity.access_token);
        if let Some(space_id) = &entity.sys.space_id {
            self.space_id.clone_from(space_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contentful::InMemoryContentful;
    use crate::reconciler::Reconciler;

    #[tokio::test]
    async fn test_access_token_is_read_back() {
        let api = InMemoryContentful::new();
        let config = ProviderConfig::new("token", "org");
        let reconciler = Reconciler::new(&api, &config);
        let mut key = ApiKeyResource::new("space-1", "website");

        assert!(reconciler.create(&mut key).await.is_empty());
        let token = key.access_token.clone();
        assert!(!token.is_empty());

        key.description = String::from("Public website");
        assert!(reconciler.update(&mut key).await.is_empty());
        assert_eq!(key.access_token, token);
        assert_eq!(key.identity.version, 2);
    }
}
