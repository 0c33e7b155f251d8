// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Contentful Reconcile
//!
//! A resource reconciliation engine for the Contentful content management API.
//!
//! ## Overview
//!
//! Declared resources (spaces, environments, locales, webhooks, API keys,
//! entries and assets) are converged against their remote counterparts:
//!
//! - Flat, locale-unaware declarations are mapped to the API's nested,
//!   locale-keyed entities and back
//! - Entries and assets are driven through their publish/archive lifecycle
//! - Every write carries the version the server currently holds
//! - Remote failures are translated into an ordered diagnostic list
//!
//! ## Architecture
//!
//! 1. **Declaration**: a [`resources`] attribute set
//! 2. **Collaborator**: the [`contentful`] service traits
//! 3. **Reconciler**: Create/Read/Update/Delete, returning [`Diagnostics`]
//!
//! ## Modules
//!
//! - [`config`]: Provider configuration loading and validation
//! - [`contentful`]: Entity types, service traits, in-memory service
//! - [`diagnostics`]: Error translation into diagnostics
//! - [`lifecycle`]: Publish/archive state machine
//! - [`localized`]: Flat/nested localized field mapping
//! - [`reconciler`]: Generic reconciliation engine
//! - [`resources`]: Per-kind declarations
//! - [`telemetry`]: Logging setup
//!
//! ## Example
//!
//! ```yaml
//! space_id: blog
//! entry_id: hello-world
//! contenttype_id: post
//! locale: en-US
//! field:
//!   - id: title
//!     locale: en-US
//!     content: Hello world
//! published: true
//! archived: false
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod config;
pub mod contentful;
pub mod diagnostics;
pub mod error;
pub mod lifecycle;
pub mod localized;
pub mod reconciler;
pub mod resources;
pub mod telemetry;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{ConfigParser, ConfigValidator, ProviderConfig, SettleConfig};
pub use contentful::{ContentfulApi, InMemoryContentful, Scope};
pub use diagnostics::{Diagnostic, Diagnostics, Severity, translate};
pub use error::{ApiError, ProviderError, Result};
pub use lifecycle::{LifecycleState, LifecycleStateMachine, LifecycleTarget, Transition};
pub use reconciler::{Identity, Reconciler, Resource};
pub use resources::{
    ApiKeyResource, AssetResource, EntryResource, EnvironmentResource, LocaleResource,
    SpaceResource, WebhookResource,
};
