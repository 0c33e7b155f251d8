//! Contentful entity types.
//!
//! These mirror the content management API's nested, locale-keyed shapes.
//! The flat declarative shapes live in [`crate::resources`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::localized::{LocalizedFields, LocalizedValue};

/// System metadata attached to every entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sys {
    /// Unique identifier, immutable once assigned.
    #[serde(default)]
    pub id: String,
    /// Write counter. Zero means "not created yet".
    #[serde(default)]
    pub version: u64,
    /// Owning space.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,
    /// Content type of an entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type_id: Option<String>,
    /// Set while the entity is published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    /// Set while the entity is archived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    /// Last write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Sys {
    /// Sys for a new entity with a caller-chosen ID.
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Returns true while the entity is published.
    #[must_use]
    pub const fn is_published(&self) -> bool {
        self.published_at.is_some()
    }

    /// Returns true while the entity is archived.
    #[must_use]
    pub const fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

/// Common access to the system metadata of any entity.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Kind name used in logs and messages.
    const KIND: &'static str;

    /// System metadata.
    fn sys(&self) -> &Sys;

    /// Mutable system metadata.
    fn sys_mut(&mut self) -> &mut Sys;
}

macro_rules! impl_entity {
    ($ty:ty, $kind:literal) => {
        impl Entity for $ty {
            const KIND: &'static str = $kind;

            fn sys(&self) -> &Sys {
                &self.sys
            }

            fn sys_mut(&mut self) -> &mut Sys {
                &mut self.sys
            }
        }
    };
}

/// A space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    /// System metadata.
    #[serde(default)]
    pub sys: Sys,
    /// Display name.
    pub name: String,
    /// Locale the space is created with.
    #[serde(default)]
    pub default_locale: String,
}

/// An environment inside a space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// System metadata.
    #[serde(default)]
    pub sys: Sys,
    /// Name, which doubles as the environment ID.
    pub name: String,
}

/// A locale configured on a space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Locale {
    /// System metadata.
    #[serde(default)]
    pub sys: Sys,
    /// Display name.
    pub name: String,
    /// Locale code such as `en-US`.
    pub code: String,
    /// Code used when a value is missing in this locale.
    #[serde(default)]
    pub fallback_code: String,
    /// Whether content may omit this locale.
    #[serde(default)]
    pub optional: bool,
    /// Available through the delivery API.
    #[serde(default, rename = "contentDeliveryApi")]
    pub cda: bool,
    /// Available through the management API.
    #[serde(default, rename = "contentManagementApi")]
    pub cma: bool,
}

/// A header sent with every webhook call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookHeader {
    /// Header name.
    pub key: String,
    /// Header value.
    pub value: String,
}

/// A webhook definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    /// System metadata.
    #[serde(default)]
    pub sys: Sys,
    /// Display name.
    pub name: String,
    /// Target URL.
    pub url: String,
    /// Basic-auth user.
    #[serde(default)]
    pub http_basic_username: String,
    /// Basic-auth password. Write-only: the API never returns it.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub http_basic_password: String,
    /// Extra headers. Order is not significant.
    #[serde(default)]
    pub headers: Vec<WebhookHeader>,
    /// Subscribed topics such as `Entry.publish`.
    #[serde(default)]
    pub topics: Vec<String>,
}

/// A delivery API key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    /// System metadata.
    #[serde(default)]
    pub sys: Sys,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Token assigned by the server.
    #[serde(default)]
    pub access_token: String,
}

/// A content entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// System metadata.
    #[serde(default)]
    pub sys: Sys,
    /// Active locale of the call that produced this payload.
    #[serde(default, skip_serializing)]
    pub locale: String,
    /// Field ID to locale to value.
    #[serde(default)]
    pub fields: LocalizedFields<Value>,
}

/// Pixel dimensions of an image asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Metadata computed when an upload is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDetails {
    /// Size in bytes.
    pub size: u64,
    /// Present for images.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageDimensions>,
}

/// File descriptor stored under one locale of an asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    /// File name.
    pub file_name: String,
    /// MIME type.
    pub content_type: String,
    /// Delivery URL, set once processing finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Public URL to fetch the original from.
    #[serde(default, rename = "upload", skip_serializing_if = "Option::is_none")]
    pub upload_url: Option<String>,
    /// ID of a previously created upload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_from_id: Option<String>,
    /// Size and dimensions, set once processing finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<FileDetails>,
}

/// Localized asset fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFields {
    /// Title per locale.
    #[serde(default)]
    pub title: LocalizedValue<String>,
    /// Description per locale.
    #[serde(default)]
    pub description: LocalizedValue<String>,
    /// File per locale.
    #[serde(default)]
    pub file: LocalizedValue<File>,
}

/// A media asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// System metadata.
    #[serde(default)]
    pub sys: Sys,
    /// Locale the file descriptor is stored under.
    #[serde(default, skip_serializing)]
    pub locale: String,
    /// Localized fields.
    #[serde(default)]
    pub fields: AssetFields,
}

impl_entity!(Space, "space");
impl_entity!(Environment, "environment");
impl_entity!(Locale, "locale");
impl_entity!(Webhook, "webhook");
impl_entity!(ApiKey, "api key");
impl_entity!(Entry, "entry");
impl_entity!(Asset, "asset");
