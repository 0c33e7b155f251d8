//! Declarative attribute sets, one per entity kind.
//!
//! Each type is the flat, locale-unaware shape a declaration uses and
//! implements [`Resource`](crate::reconciler::Resource) so the generic
//! reconciler can drive it.

mod api_key;
mod asset;
mod entry;
mod environment;
mod locale;
mod space;
mod webhook;

pub use api_key::ApiKeyResource;
pub use asset::{AssetFileResource, AssetFieldsResource, AssetResource};
pub use entry::EntryResource;
pub use environment::EnvironmentResource;
pub use locale::LocaleResource;
pub use space::SpaceResource;
pub use webhook::{WebhookResource, headers_from_list, headers_to_list};
