//! Locale declaration.

use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::contentful::{ContentfulApi, EntityService, Locale, Scope};
use crate::error::ReconcileError;
use crate::reconciler::{Identity, Resource};

/// A declared locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleResource {
    /// Owning space.
    pub space_id: String,
    /// Display name.
    pub name: String,
    /// Locale code such as `de-DE`.
    pub code: String,
    /// Code used when a value is missing in this locale.
    #[serde(default = "default_fallback_code")]
    pub fallback_code: String,
    /// Whether content may omit this locale.
    #[serde(default)]
    pub optional: bool,
    /// Available through the delivery API.
    #[serde(default = "default_cda")]
    pub cda: bool,
    /// Available through the management API.
    #[serde(default)]
    pub cma: bool,
    /// Remote identity.
    #[serde(flatten)]
    pub identity: Identity,
}

impl LocaleResource {
    /// Declares a locale with default fallback and API availability.
    #[must_use]
    pub fn new(
        space_id: impl Into<String>,
        name: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            space_id: space_id.into(),
            name: name.into(),
            code: code.into(),
            fallback_code: default_fallback_code(),
            optional: false,
            cda: default_cda(),
            cma: false,
            identity: Identity::default(),
        }
    }
}

impl Resource for LocaleResource {
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

    fn to_entity(&self) -> Result<Locale, ReconcileError> {
        let mut locale = Locale::default();
        self.apply_to(&mut locale)?;
        Ok(locale)
    }

    fn apply_to(&self, entity: &mut Locale) -> Result<(), ReconcileError> {
        entity.name.clone_from(&self.name);
        entity.code.clone_from(&self.code);
        entity.fallback_code.clone_from(&self.fallback_code);
        entity.optional = self.optional;
        entity.cda = self.cda;
        entity.cma = self.cma;
        Ok(())
    }

    fn refresh(&mut self, entity: &Locale) {
        self.name.clone_from(&entity.name);
        self.code.clone_from(&entity.code);
        self.fallback_code.clone_from(&entity.fallback_code);
        self.optional = entity.optional;
        self.cda = entity.cda;
        self.cma = entity.cma;
    }
}

fn default_fallback_code() -> String {
    String::from("en-US")
}

const fn default_cda() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contentful::InMemoryContentful;
    use crate::reconciler::Reconciler;

    #[test]
    fn test_defaults_from_yaml() {
        let yaml = "space_id: s1\nname: German\ncode: de-DE\n";
        let locale: LocaleResource = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(locale, LocaleResource::new("s1", "German", "de-DE"));
        assert!(locale.cda);
        assert!(!locale.cma);
    }

    #[tokio::test]
    async fn test_read_picks_up_remote_changes() {
        let api = InMemoryContentful::new();
        let config = ProviderConfig::new("token", "org");
        let reconciler = Reconciler::new(&api, &config);
        let mut locale = LocaleResource::new("space-1", "German", "de-DE");
        assert!(reconciler.create(&mut locale).await.is_empty());

        let scope = Scope::space("space-1");
        let id = locale.identity.id.clone().expect("created");
        let mut remote: Locale = api.peek(&scope, &id).expect("stored");
        remote.optional = true;
        remote.fallback_code = String::from("en-GB");
        api.seed(&scope, remote);

        assert!(reconciler.read(&mut locale).await.is_empty());
        assert!(locale.optional);
        assert_eq!(locale.fallback_code, "en-GB");
    }
}
