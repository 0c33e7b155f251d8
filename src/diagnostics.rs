//! Severity-ranked diagnostics returned by every reconciler operation.
//!
//! A failed operation produces one warning per field-level problem reported by
//! the API, followed by exactly one terminal error. A successful operation
//! produces no diagnostics at all.

use serde::Serialize;

use crate::error::{ApiError, ProviderError};

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational; the operation may still have failed overall.
    Warning,
    /// The operation did not fully succeed.
    Error,
}

/// A single message returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// One-line summary.
    pub summary: String,
}

/// Ordered list of diagnostics for one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostic {
    /// Creates a warning.
    #[must_use]
    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
        }
    }

    /// Creates an error.
    #[must_use]
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
        }
    }
}

/// Translates a collaborator error into diagnostics.
///
/// `None` yields an empty list. Validation errors yield one warning per detail,
/// in input order, then the top-level message as the single error. Every other
/// kind yields its message, unchanged, as a single error.
#[must_use]
pub fn translate(err: Option<&ApiError>) -> Diagnostics {
    let Some(err) = err else {
        return Diagnostics::new();
    };

    match err {
        ApiError::Validation(response) => {
            let mut diagnostics: Vec<Diagnostic> = response
                .details
                .iter()
                .map(|detail| {
                    Diagnostic::warning(format!("{} ({})", detail.details, detail.dotted_path()))
                })
                .collect();
            diagnostics.push(Diagnostic::error(response.message.clone()));
            Diagnostics(diagnostics)
        }
        ApiError::NotFound { message }
        | ApiError::Conflict { message }
        | ApiError::Transport { message } => Diagnostics(vec![Diagnostic::error(message.clone())]),
    }
}

impl Diagnostics {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Translates any engine error; API errors go through [`translate`].
    #[must_use]
    pub fn from_error(err: &ProviderError) -> Self {
        match err {
            ProviderError::Api(api) => translate(Some(api)),
            other => Self(vec![Diagnostic::error(other.to_string())]),
        }
    }

    /// Turns the outcome of a whole operation into diagnostics.
    #[must_use]
    pub fn from_result<T>(result: &crate::error::Result<T>) -> Self {
        match result {
            Ok(_) => Self::new(),
            Err(err) => Self::from_error(err),
        }
    }

    /// Returns true if any diagnostic has error severity.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    /// Returns true if there are no diagnostics.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The diagnostics in order.
    #[must_use]
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.0
    }

    /// Iterates in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    /// Consumes the list.
    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{label}: {}", self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorResponse, ReconcileError};

    #[test]
    fn test_translate_none() {
        let d = translate(None);
        assert!(d.is_empty());
        assert!(!d.has_error());
    }

    #[test]
    fn test_translate_regular_error() {
        let d = translate(Some(&ApiError::transport("regular error")));
        assert!(d.has_error());
        assert_eq!(d.len(), 1);
        assert_eq!(d.as_slice()[0], Diagnostic::error("regular error"));
    }

    #[test]
    fn test_translate_without_warning() {
        let d = translate(Some(&ApiError::Validation(ErrorResponse::new("error message"))));
        assert!(d.has_error());
        assert_eq!(d.len(), 1);
        assert_eq!(d.as_slice()[0].summary, "error message");
        assert_eq!(d.as_slice()[0].severity, Severity::Error);
    }

    #[test]
    fn test_translate_with_warning_without_path() {
        let err = ApiError::Validation(
            ErrorResponse::new("error message").with_detail(Vec::<&str>::new(), "error detail"),
        );
        let d = translate(Some(&err));
        assert!(d.has_error());
        assert_eq!(d.len(), 2);
        assert_eq!(d.as_slice()[0], Diagnostic::warning("error detail ()"));
        assert_eq!(d.as_slice()[1], Diagnostic::error("error message"));
    }

    #[test]
    fn test_translate_with_warning_with_path() {
        let err = ApiError::Validation(
            ErrorResponse::new("error message").with_detail(["path", "to", "error"], "error detail"),
        );
        let d = translate(Some(&err));
        assert_eq!(d.len(), 2);
        assert_eq!(d.as_slice()[0], Diagnostic::warning("error detail (path.to.error)"));
        assert_eq!(d.as_slice()[1], Diagnostic::error("error message"));
    }

    #[test]
    fn test_translate_keeps_detail_order_and_duplicates() {
        let err = ApiError::Validation(
            ErrorResponse::new("Validation error")
                .with_detail(["fields", "b"], "second")
                .with_detail(["fields", "a"], "first")
                .with_detail(["fields", "a"], "first"),
        );
        let summaries: Vec<_> = translate(Some(&err))
            .iter()
            .map(|d| d.summary.clone())
            .collect();
        assert_eq!(
            summaries,
            vec![
                "second (fields.b)",
                "first (fields.a)",
                "first (fields.a)",
                "Validation error"
            ]
        );
    }

    #[test]
    fn test_conflict_is_single_error() {
        let d = translate(Some(&ApiError::conflict("Version mismatch")));
        assert_eq!(d.into_vec(), vec![Diagnostic::error("Version mismatch")]);
    }

    #[test]
    fn test_from_error_passes_local_errors_through() {
        let err = ProviderError::from(ReconcileError::MissingIdentity { kind: "entry" });
        let d = Diagnostics::from_error(&err);
        assert_eq!(d.len(), 1);
        assert_eq!(d.as_slice()[0].severity, Severity::Error);
        assert_eq!(d.as_slice()[0].summary, err.to_string());
    }

    #[test]
    fn test_from_result_ok_is_empty() {
        let ok: crate::error::Result<()> = Ok(());
        assert!(Diagnostics::from_result(&ok).is_empty());
    }
}
