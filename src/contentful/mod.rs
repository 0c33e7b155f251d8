//! Contentful collaborator boundary.
//!
//! This module defines the entity types exchanged with the content management
//! API, the verb set the reconciler relies on, and an in-process
//! implementation of that verb set.

mod api;
mod memory;
mod types;

pub use api::{AssetService, ContentfulApi, EntityService, PublishingService, Scope};
pub use memory::{Call, InMemoryContentful, Operation, PublishableEntity, StoredEntity, Table, Tables};
pub use types::{
    ApiKey, Asset, AssetFields, Entity, Entry, Environment, File, FileDetails, ImageDimensions,
    Locale, Space, Sys, Webhook, WebhookHeader,
};
