//! Mapping between flat `(field, locale, content)` triples and the nested
//! `field -> locale -> value` shape used by the API.
//!
//! `flatten` and `unflatten` are inverses over the locales supplied in a
//! single call. Entry content is additionally decoded as JSON when it parses,
//! and kept as the literal string when it does not, so that plain text and
//! structured (rich text) values share one string attribute.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Locale code to value.
pub type LocalizedValue<T> = BTreeMap<String, T>;

/// Field ID to locale code to value.
pub type LocalizedFields<T> = BTreeMap<String, LocalizedValue<T>>;

/// One flat `(field, locale, content)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedField<T = String> {
    /// Field ID.
    pub id: String,
    /// Locale code.
    pub locale: String,
    /// Content for that field and locale.
    pub content: T,
}

/// A flat `(locale, content)` pair for a single localized text value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    /// Locale code.
    pub locale: String,
    /// Text for that locale.
    pub content: String,
}

impl<T> LocalizedField<T> {
    /// Creates a triple.
    #[must_use]
    pub fn new(id: impl Into<String>, locale: impl Into<String>, content: T) -> Self {
        Self {
            id: id.into(),
            locale: locale.into(),
            content,
        }
    }
}

impl LocalizedText {
    /// Creates a pair.
    #[must_use]
    pub fn new(locale: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            content: content.into(),
        }
    }
}

/// Nests flat triples. A later triple for the same field and locale wins.
#[must_use]
pub fn unflatten<T>(fields: impl IntoIterator<Item = LocalizedField<T>>) -> LocalizedFields<T> {
    let mut nested = LocalizedFields::new();
    for field in fields {
        nested
            .entry(field.id)
            .or_insert_with(BTreeMap::new)
            .insert(field.locale, field.content);
    }
    nested
}

/// Flattens nested fields, ordered by field ID then locale.
#[must_use]
pub fn flatten<T: Clone>(nested: &LocalizedFields<T>) -> Vec<LocalizedField<T>> {
    nested
        .iter()
        .flat_map(|(id, locales)| {
            locales
                .iter()
                .map(move |(locale, content)| LocalizedField::new(id.clone(), locale.clone(), content.clone()))
        })
        .collect()
}

/// Like [`flatten`], keeping only the given locales.
#[must_use]
pub fn flatten_locales<T: Clone>(
    nested: &LocalizedFields<T>,
    locales: &BTreeSet<String>,
) -> Vec<LocalizedField<T>> {
    flatten(nested)
        .into_iter()
        .filter(|field| locales.contains(&field.locale))
        .collect()
}

/// Builds a locale map from flat pairs.
#[must_use]
pub fn localize(values: &[LocalizedText]) -> LocalizedValue<String> {
    values
        .iter()
        .map(|v| (v.locale.clone(), v.content.clone()))
        .collect()
}

/// Flattens a locale map into pairs ordered by locale.
#[must_use]
pub fn delocalize(values: &LocalizedValue<String>) -> Vec<LocalizedText> {
    values
        .iter()
        .map(|(locale, content)| LocalizedText::new(locale.clone(), content.clone()))
        .collect()
}

/// Decodes entry content: JSON when it parses, otherwise the literal string.
#[must_use]
pub fn parse_content(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Encodes entry content: strings verbatim, everything else as compact JSON.
#[must_use]
pub fn render_content(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Nests entry field triples, decoding each content string.
#[must_use]
pub fn entry_fields(fields: &[LocalizedField]) -> LocalizedFields<Value> {
    unflatten(
        fields
            .iter()
            .map(|f| LocalizedField::new(f.id.clone(), f.locale.clone(), parse_content(&f.content))),
    )
}

/// Flattens entry fields for the given locales, encoding each value.
#[must_use]
pub fn entry_field_list(
    fields: &LocalizedFields<Value>,
    locales: &BTreeSet<String>,
) -> Vec<LocalizedField> {
    flatten_locales(fields, locales)
        .into_iter()
        .map(|f| LocalizedField::new(f.id, f.locale, render_content(&f.content)))
        .collect()
}

/// Reads entry fields back against a declaration.
///
/// A declared triple keeps its own string while it still decodes to the
/// remote value, so JSON spelled differently from `render_content` output
/// (key order, whitespace, number form) is not reported as changed. Declared
/// order is kept; remote values in `locales` that were not declared follow.
#[must_use]
pub fn refresh_entry_fields(
    declared: &[LocalizedField],
    remote: &LocalizedFields<Value>,
    locales: &BTreeSet<String>,
) -> Vec<LocalizedField> {
    let mut seen = BTreeSet::new();
    let mut refreshed: Vec<LocalizedField> = declared
        .iter()
        .filter_map(|field| {
            let value = remote.get(&field.id)?.get(&field.locale)?;
            seen.insert((field.id.clone(), field.locale.clone()));
            let content = if parse_content(&field.content) == *value {
                field.content.clone()
            } else {
                render_content(value)
            };
            Some(LocalizedField::new(field.id.clone(), field.locale.clone(), content))
        })
        .collect();

    refreshed.extend(
        entry_field_list(remote, locales)
            .into_iter()
            .filter(|field| !seen.contains(&(field.id.clone(), field.locale.clone()))),
    );
    refreshed
}

/// Replaces the values of `locales` in `target` with `declared`, leaving
/// every other locale untouched. Fields left without any locale are removed.
pub fn merge_fields<T>(
    target: &mut LocalizedFields<T>,
    declared: LocalizedFields<T>,
    locales: &BTreeSet<String>,
) {
    for values in target.values_mut() {
        values.retain(|locale, _| !locales.contains(locale));
    }
    for (id, values) in declared {
        target.entry(id).or_default().extend(values);
    }
    target.retain(|_, values| !values.is_empty());
}

/// Single-value form of [`merge_fields`].
pub fn merge_value<T>(
    target: &mut LocalizedValue<T>,
    declared: LocalizedValue<T>,
    locales: &BTreeSet<String>,
) {
    target.retain(|locale, _| !locales.contains(locale));
    target.extend(declared);
}

/// Like [`delocalize`], keeping only the given locales.
#[must_use]
pub fn delocalize_locales(
    values: &LocalizedValue<String>,
    locales: &BTreeSet<String>,
) -> Vec<LocalizedText> {
    delocalize(values)
        .into_iter()
        .filter(|text| locales.contains(&text.locale))
        .collect()
}

/// Distinct locales used by a list of triples.
#[must_use]
pub fn locales_of<T>(fields: &[LocalizedField<T>]) -> BTreeSet<String> {
    fields.iter().map(|f| f.locale.clone()).collect()
}
