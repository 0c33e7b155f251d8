//! Error types for the Contentful reconciliation engine.
//!
//! Remote failures are classified exactly once, at the collaborator boundary,
//! into the closed [`ApiError`] enumeration. Everything downstream pattern
//! matches on it; nothing inspects error strings.

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

/// The main error type for the reconciliation engine.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors reported by the content management API.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// Local reconciliation errors.
    #[error("Reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// A required setting was neither in the file nor in the environment.
    #[error("Missing required setting {field} (set {env_var})")]
    MissingSetting {
        /// Configuration field name.
        field: String,
        /// Environment variable that would supply it.
        env_var: String,
    },
}

/// Errors raised by the reconciler itself, before or after talking to the API.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The operation needs a remote identity but the resource has none.
    #[error("{kind} has no remote identity; it must be created first")]
    MissingIdentity {
        /// Entity kind.
        kind: &'static str,
    },

    /// The declared attributes cannot be turned into an entity payload.
    #[error("Invalid {kind} attributes: {reason}")]
    InvalidAttributes {
        /// Entity kind.
        kind: &'static str,
        /// What is wrong with them.
        reason: String,
    },
}

/// Closed classification of every failure the collaborator can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The addressed entity does not exist remotely.
    #[error("{message}")]
    NotFound {
        /// Message reported by the API.
        message: String,
    },

    /// The API rejected the payload, possibly with per-field details.
    #[error("{}", .0.message)]
    Validation(ErrorResponse),

    /// The version sent with a write is not the one the server holds.
    #[error("{message}")]
    Conflict {
        /// Message reported by the API.
        message: String,
    },

    /// Anything else: network failures, unexpected statuses, unparseable bodies.
    #[error("{message}")]
    Transport {
        /// The original error message, verbatim.
        message: String,
    },
}

/// Structured error body returned by the content management API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorResponse {
    /// Top-level summary.
    #[serde(default)]
    pub message: String,
    /// Per-field problems, in the order the API reported them.
    #[serde(default, deserialize_with = "deserialize_details")]
    pub details: Vec<ErrorDetail>,
}

/// A single field-level problem inside an [`ErrorResponse`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorDetail {
    /// Location of the offending value, outermost segment first.
    #[serde(default, deserialize_with = "deserialize_path")]
    pub path: Vec<PathSegment>,
    /// Human readable description.
    #[serde(default)]
    pub details: String,
}

/// One segment of an [`ErrorDetail`] path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Array index.
    Index(u64),
    /// Object key.
    Key(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Key(key) => f.write_str(key),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<u64> for PathSegment {
    fn from(index: u64) -> Self {
        Self::Index(index)
    }
}

impl ErrorResponse {
    /// Creates a response with a message and no details.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Appends a field-level detail.
    #[must_use]
    pub fn with_detail<P, S>(mut self, path: P, details: impl Into<String>) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        self.details.push(ErrorDetail {
            path: path.into_iter().map(Into::into).collect(),
            details: details.into(),
        });
        self
    }
}

impl ErrorDetail {
    /// Joins the path segments with dots; empty when there is no path.
    #[must_use]
    pub fn dotted_path(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Wire shape of `details`: `{ "errors": [...] }`.
#[derive(Deserialize)]
struct WireDetails {
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

fn deserialize_details<'de, D>(deserializer: D) -> std::result::Result<Vec<ErrorDetail>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let wire: Option<WireDetails> = Option::deserialize(deserializer)?;
    Ok(wire.map(|w| w.errors).unwrap_or_default())
}

fn deserialize_path<'de, D>(deserializer: D) -> std::result::Result<Vec<PathSegment>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let path: Option<Vec<PathSegment>> = Option::deserialize(deserializer)?;
    Ok(path.unwrap_or_default())
}

/// Error body as sent by the API, including the `sys.id` error kind.
#[derive(Deserialize)]
struct WireError {
    #[serde(default)]
    sys: Option<WireErrorSys>,
    #[serde(flatten)]
    response: ErrorResponse,
}

#[derive(Deserialize)]
struct WireErrorSys {
    #[serde(default)]
    id: String,
}

/// HTTP status for a missing resource.
const HTTP_NOT_FOUND: u16 = 404;

/// HTTP status for a version mismatch.
const HTTP_CONFLICT: u16 = 409;

impl ApiError {
    /// Classifies a raw error response from the content management API.
    ///
    /// This is the single place where remote failures become typed errors.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<WireError> = serde_json::from_str(body).ok();
        let kind = parsed
            .as_ref()
            .and_then(|w| w.sys.as_ref())
            .map(|sys| sys.id.clone())
            .unwrap_or_default();

        let fallback = || {
            if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                body.to_string()
            }
        };

        match parsed {
            Some(wire) if status == HTTP_NOT_FOUND || kind == "NotFound" => Self::NotFound {
                message: non_empty_or(wire.response.message, fallback),
            },
            Some(wire) if status == HTTP_CONFLICT || kind == "VersionMismatch" => Self::Conflict {
                message: non_empty_or(wire.response.message, fallback),
            },
            Some(wire) if !wire.response.message.is_empty() || !wire.response.details.is_empty() => {
                Self::Validation(wire.response)
            }
            _ if status == HTTP_NOT_FOUND => Self::NotFound { message: fallback() },
            _ if status == HTTP_CONFLICT => Self::Conflict { message: fallback() },
            _ => Self::Transport { message: fallback() },
        }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a version conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Creates a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Returns true if the remote entity does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

fn non_empty_or(message: String, fallback: impl FnOnce() -> String) -> String {
    if message.is_empty() { fallback() } else { message }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Result type alias for collaborator calls.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}
