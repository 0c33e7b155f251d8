//! Webhook declaration.
//!
//! Headers are declared as a map and sent as a key/value list; order is not
//! significant. The basic-auth password is write-only and never read back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::contentful::{ContentfulApi, EntityService, Scope, Webhook, WebhookHeader};
use crate::error::ReconcileError;
use crate::reconciler::{Identity, Resource};

/// A declared webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookResource {
    /// Owning space.
    pub space_id: String,
    /// Display name.
    pub name: String,
    /// Target URL.
    pub url: String,
    /// Subscribed topics such as `Entry.publish`. At least one.
    pub topics: Vec<String>,
    /// Extra headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Basic-auth user.
    #[serde(default)]
    pub http_basic_auth_username: String,
    /// Basic-auth password.
    #[serde(default)]
    pub http_basic_auth_password: String,
    /// Remote identity.
    #[serde(flatten)]
    pub identity: Identity,
}

/// Converts declared headers into the API's list form.
#[must_use]
pub fn headers_to_list(headers: &BTreeMap<String, String>) -> Vec<WebhookHeader> {
    headers
        .iter()
        .map(|(key, value)| WebhookHeader {
            key: key.clone(),
            value: value.clone(),
        })
        .collect()
}

/// Converts the API's header list into map form. A later duplicate key wins.
#[must_use]
pub fn headers_from_list(headers: &[WebhookHeader]) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|h| (h.key.clone(), h.value.clone()))
        .collect()
}

impl WebhookResource {
    fn check_topics(&self) -> Result<(), ReconcileError> {
        if self.topics.is_empty() {
            return Err(ReconcileError::InvalidAttributes {
                kind: "webhook",
                reason: String::from("at least one topic is required"),
            });
        }
        Ok(())
    }
}

impl Resource for WebhookResource {
    type Entity = Webhook;

    fn service(api: &dyn ContentfulApi) -> &dyn EntityService<Webhook> {
        api.webhooks()
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

    fn to_entity(&self) -> Result<Webhook, ReconcileError> {
        let mut webhook = Webhook::default();
        self.apply_to(&mut webhook)?;
        Ok(webhook)
    }

    fn apply_to(&self, entity: &mut Webhook) -> Result<(), ReconcileError> {
        self.check_topics()?;
        entity.name.clone_from(&self.name);
        entity.url.clone_from(&self.url);
        entity.topics.clone_from(&self.topics);
        entity.headers = headers_to_list(&self.headers);
        entity.http_basic_username.clone_from(&self.http_basic_auth_username);
        entity.http_basic_password.clone_from(&self.http_basic_auth_password);
        Ok(())
    }

    fn refresh(&mut self, entity: &Webhook) {
        self.name.clone_from(&entity.name);
        self.url.clone_from(&entity.url);
        self.topics.clone_from(&entity.topics);
        self.headers = headers_from_list(&entity.headers);
        self.http_basic_auth_username.clone_from(&entity.http_basic_username);
        if let Some(space_id) = &entity.sys.space_id {
            self.space_id.clone_from(space_id);
        }
    }
}
