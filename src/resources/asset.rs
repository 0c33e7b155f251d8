//! Asset declaration.
//!
//! The file descriptor is stored under the asset's locale. Every upsert is
//! followed by processing, a settling read, and then the lifecycle phase.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ProviderConfig;
use crate::contentful::{
    Asset, AssetFields, AssetService, ContentfulApi, EntityService, File, FileDetails,
    PublishingService, Scope, Sys,
};
use crate::error::{ApiResult, ReconcileError};
use crate::lifecycle::{LifecycleStateMachine, LifecycleTarget};
use crate::localized::{LocalizedText, delocalize_locales, localize, merge_value};
use crate::reconciler::{Identity, Reconciler, Resource};

/// A declared asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetResource {
    /// Owning space.
    pub space_id: String,
    /// Caller-chosen asset ID.
    pub asset_id: String,
    /// Locale the file is stored under.
    pub locale: String,
    /// Localized fields.
    pub fields: AssetFieldsResource,
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

/// Declared asset fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFieldsResource {
    /// Title per locale.
    #[serde(default)]
    pub title: Vec<LocalizedText>,
    /// Description per locale.
    #[serde(default)]
    pub description: Vec<LocalizedText>,
    /// The file stored under the asset's locale.
    pub file: AssetFileResource,
}

/// Declared file descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFileResource {
    /// Public URL to fetch the original from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload: Option<String>,
    /// File name.
    pub file_name: String,
    /// MIME type.
    pub content_type: String,
    /// Size and dimensions, computed by processing when not declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<FileDetails>,
    /// Delivery URL, computed by processing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// ID of a previously created upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_from: Option<String>,
}

impl AssetResource {
    fn locales(&self) -> BTreeSet<String> {
        self.fields
            .title
            .iter()
            .chain(&self.fields.description)
            .map(|text| text.locale.clone())
            .chain(std::iter::once(self.locale.clone()))
            .collect()
    }

    fn file(&self) -> Result<File, ReconcileError> {
        let file = &self.fields.file;
        if file.file_name.is_empty() {
            return Err(ReconcileError::InvalidAttributes {
                kind: "asset",
                reason: String::from("the file block needs a file name"),
            });
        }
        Ok(File {
            file_name: file.file_name.clone(),
            content_type: file.content_type.clone(),
            url: file.url.clone(),
            upload_url: file.upload.clone(),
            upload_from_id: file.upload_from.clone(),
            details: file.details,
        })
    }

    const fn target(&self) -> LifecycleTarget {
        LifecycleTarget::new(self.published, self.archived)
    }
}

#[async_trait]
impl Resource for AssetResource {
    type Entity = Asset;

    fn service(api: &dyn ContentfulApi) -> &dyn EntityService<Asset> {
        let assets: &dyn AssetService = api.assets();
        let publishing: &dyn PublishingService<Asset> = assets.as_publishing_service();
        publishing.as_entity_service()
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

    fn to_entity(&self) -> Result<Asset, ReconcileError> {
        let file = self.file()?;
        Ok(Asset {
            sys: Sys::with_id(self.asset_id.clone()),
            locale: self.locale.clone(),
            fields: AssetFields {
                title: localize(&self.fields.title),
                description: localize(&self.fields.description),
                file: [(self.locale.clone(), file)].into_iter().collect(),
            },
        })
    }

    fn apply_to(&self, entity: &mut Asset) -> Result<(), ReconcileError> {
        let file = self.file()?;
        let locales = self.locales();
        entity.locale.clone_from(&self.locale);
        merge_value(&mut entity.fields.title, localize(&self.fields.title), &locales);
        merge_value(
            &mut entity.fields.description,
            localize(&self.fields.description),
            &locales,
        );
        entity.fields.file.insert(self.locale.clone(), file);
        Ok(())
    }

    fn refresh(&mut self, entity: &Asset) {
        let locales = self.locales();
        self.fields.title = delocalize_locales(&entity.fields.title, &locales);
        self.fields.description = delocalize_locales(&entity.fields.description, &locales);

        if let Some(remote) = entity.fields.file.get(&self.locale) {
            let file = &mut self.fields.file;
            file.file_name.clone_from(&remote.file_name);
            file.content_type.clone_from(&remote.content_type);
            file.url.clone_from(&remote.url);
            file.upload_from.clone_from(&remote.upload_from_id);
            if remote.details.is_some() {
                file.details = remote.details;
            }
        }
        // `published` and `archived` stay as declared.
    }

    async fn after_upsert(
        &self,
        reconciler: &Reconciler<'_>,
        scope: &Scope,
        entity: &mut Asset,
    ) -> ApiResult<()> {
        let assets: &dyn AssetService = reconciler.api().assets();
        let publishing = assets.as_publishing_service();
        assets.process(scope, entity).await?;

        // Processing finishes in the background; wait for the version to hold.
        let id = entity.sys.id.clone();
        let mut settled = reconciler
            .settle(publishing.as_entity_service(), scope, &id)
            .await?;
        settled.locale.clone_from(&self.locale);
        debug!("Asset {id} ready at version {}", settled.sys.version);
        *entity = settled;

        LifecycleStateMachine::new(publishing, scope)
            .converge(entity, self.target())
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettleConfig;
    use crate::contentful::{ImageDimensions, InMemoryContentful, Operation};
    use crate::error::{ApiError, ErrorResponse};

    fn declared(published: bool, archived: bool) -> AssetResource {
        AssetResource {
            space_id: String::from("space-1"),
            asset_id: String::from("cat"),
            locale: String::from("en-US"),
            fields: AssetFieldsResource {
                title: vec![LocalizedText::new("en-US", "A cat")],
                description: vec![LocalizedText::new("en-US", "Sleeping")],
                file: AssetFileResource {
                    upload: Some(String::from("https://example.com/cat.png")),
                    file_name: String::from("cat.png"),
                    content_type: String::from("image/png"),
                    details: Some(FileDetails {
                        size: 1024,
                        image: Some(ImageDimensions {
                            width: 64,
                            height: 48,
                        }),
                    }),
                    ..AssetFileResource::default()
                },
            },
            published,
            archived,
            identity: Identity::default(),
        }
    }

    fn config() -> ProviderConfig {
        ProviderConfig::new("token", "org").with_settle(SettleConfig {
            initial_delay_ms: 1,
            multiplier: 2,
            max_attempts: 3,
        })
    }

    fn scope() -> Scope {
        Scope::space("space-1").in_environment("master")
    }

    #[tokio::test]
    async fn test_create_processes_settles_and_publishes() {
        let api = InMemoryContentful::new();
        let config = config();
        let mut asset = declared(true, false);

        let diags = Reconciler::new(&api, &config).create(&mut asset).await;

        assert!(diags.is_empty());
        assert_eq!(
            api.operations::<Asset>(),
            vec![
                Operation::Upsert,
                Operation::Process,
                Operation::Get,
                Operation::Get,
                Operation::Publish,
            ]
        );
        assert_eq!(asset.identity.id.as_deref(), Some("cat"));
        assert_eq!(asset.identity.version, 3);
        assert!(asset.published);
        assert_eq!(
            asset.fields.file.url.as_deref(),
            Some("//assets.ctfassets.net/space-1/cat/cat.png")
        );
        assert_eq!(asset.fields.file.details.map(|d| d.size), Some(1024));
    }

    #[tokio::test]
    async fn test_lifecycle_runs_on_settled_version() {
        let api = InMemoryContentful::new();
        let config = config();
        let mut asset = declared(true, true);
        // Background processing bumps the version on the first reads.
        api.lag_reads::<Asset>(2);

        let diags = Reconciler::new(&api, &config).create(&mut asset).await;

        assert!(diags.is_empty());
        let stored: Asset = api.peek(&scope(), "cat").expect("stored");
        assert!(stored.sys.is_archived());
        assert!(!stored.sys.is_published());
        assert_eq!(stored.sys.version, asset.identity.version);
    }

    #[tokio::test]
    async fn test_reapplying_converged_asset_is_a_no_op() {
        for (published, archived) in [(false, false), (true, false), (false, true), (true, true)] {
            let api = InMemoryContentful::new();
            let config = config();
            let reconciler = Reconciler::new(&api, &config);
            let mut asset = declared(published, archived);
            assert!(reconciler.create(&mut asset).await.is_empty());
            let converged = asset.clone();

            let diags = reconciler.update(&mut asset).await;

            assert!(diags.is_empty(), "({published}, {archived}): {diags:?}");
            assert_eq!(asset.published, published);
            assert_eq!(asset.archived, archived);
            assert_eq!(asset.fields, converged.fields);
            // Upsert, process and the settling reads; no lifecycle call.
            assert_eq!(api.operations::<Asset>().last(), Some(&Operation::Get));
        }
    }

    #[tokio::test]
    async fn test_process_failure_is_terminal() {
        let api = InMemoryContentful::new();
        let config = config();
        let mut asset = declared(true, false);
        api.fail_next::<Asset>(
            Operation::Process,
            ApiError::Validation(
                ErrorResponse::new("Processing failed")
                    .with_detail(["fields", "file", "en-US", "upload"], "URL not reachable"),
            ),
        );

        let diags = Reconciler::new(&api, &config).create(&mut asset).await;

        assert_eq!(diags.len(), 2);
        assert_eq!(diags.as_slice()[0].summary, "URL not reachable (fields.file.en-US.upload)");
        assert_eq!(diags.as_slice()[1].summary, "Processing failed");
        assert_eq!(asset.identity.id.as_deref(), Some("cat"));
        assert_eq!(
            api.operations::<Asset>(),
            vec![Operation::Upsert, Operation::Process]
        );
    }

    #[tokio::test]
    async fn test_update_keeps_other_locale_titles() {
        let api = InMemoryContentful::new();
        let config = config();
        let reconciler = Reconciler::new(&api, &config);
        let mut asset = declared(false, false);
        assert!(reconciler.create(&mut asset).await.is_empty());

        let mut remote: Asset = api.peek(&scope(), "cat").expect("stored");
        remote
            .fields
            .title
            .insert(String::from("fr-FR"), String::from("Un chat"));
        remote.sys.version += 1;
        api.seed(&scope(), remote);

        asset.fields.title = vec![LocalizedText::new("en-US", "A sleepy cat")];
        assert!(reconciler.update(&mut asset).await.is_empty());

        let stored: Asset = api.peek(&scope(), "cat").expect("stored");
        assert_eq!(stored.fields.title["en-US"], "A sleepy cat");
        assert_eq!(stored.fields.title["fr-FR"], "Un chat");
        assert_eq!(asset.fields.title, vec![LocalizedText::new("en-US", "A sleepy cat")]);
    }

    #[tokio::test]
    async fn test_missing_file_name_rejected_locally() {
        let api = InMemoryContentful::new();
        let config = config();
        let mut asset = declared(false, false);
        asset.fields.file.file_name.clear();

        let diags = Reconciler::new(&api, &config).create(&mut asset).await;

        assert!(diags.has_error());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_asset() {
        let api = InMemoryContentful::new();
        let config = config();
        let reconciler = Reconciler::new(&api, &config);
        let mut asset = declared(false, false);
        assert!(reconciler.create(&mut asset).await.is_empty());

        assert!(reconciler.delete(&mut asset).await.is_empty());
        assert!(!asset.identity.is_set());
        assert!(api.peek::<Asset>(&scope(), "cat").is_none());
    }
}
