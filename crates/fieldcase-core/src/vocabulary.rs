//! Field-name vocabulary of one dataset layer
//!
//! Matching is always case-insensitive; replacement text depends on the
//! configured [`CasePolicy`]. All names are compiled into a single
//! boundary-anchored alternation, longest name first, so one pass over a
//! text replaces every token deterministically regardless of set order.

use crate::collaborator::{DatasetRef, FieldCatalog, FieldInfo};
use crate::error::{MigrationError, MigrationResult};
use regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

/// System-maintained editor-tracking fields, never treated as references
pub const SYSTEM_FIELDS: [&str; 4] = ["CreationDate", "Creator", "EditDate", "Editor"];

/// Casing written back for matched field names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasePolicy {
    /// Lower-cased field name
    #[default]
    Lowercase,
    /// Exact spelling from the dataset metadata
    Authoritative,
}

impl CasePolicy {
    /// Replacement spelling for an authoritative field name
    #[inline]
    #[must_use]
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::Lowercase => name.to_lowercase(),
            Self::Authoritative => name.to_string(),
        }
    }
}

/// Canonical field names of one dataset layer
#[derive(Debug, Clone)]
pub struct Vocabulary {
    dataset: DatasetRef,
    /// Authoritative spellings, first occurrence per case-folded name
    names: Vec<String>,
    /// Case-folded name → replacement text
    canonical: HashMap<String, String>,
    matcher: Regex,
}

impl Vocabulary {
    /// Build vocabulary from authoritative names
    ///
    /// System fields and blank names are dropped. Names differing only by
    /// case collapse onto the first one seen.
    ///
    /// # Errors
    /// - `MigrationError::VocabularyEmpty` if no usable name remains
    /// - `MigrationError::InvalidVocabulary` if the matcher cannot be built
    pub fn new<I, S>(dataset: &DatasetRef, names: I, policy: CasePolicy) -> MigrationResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut kept = Vec::new();
        let mut canonical = HashMap::new();

        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() || is_system_field(name) {
                continue;
            }
            let folded = name.to_lowercase();
            if canonical.contains_key(&folded) {
                tracing::warn!(
                    "dataset {} lists '{}' more than once ignoring case; keeping first spelling",
                    dataset,
                    name
                );
                continue;
            }
            canonical.insert(folded, policy.apply(name));
            kept.push(name.to_string());
        }

        if kept.is_empty() {
            return Err(MigrationError::vocabulary_empty(&dataset.item_id, dataset.layer));
        }

        let matcher = build_matcher(&kept)?;
        Ok(Self {
            dataset: dataset.clone(),
            names: kept,
            canonical,
            matcher,
        })
    }

    /// Build vocabulary from layer field metadata
    ///
    /// # Errors
    /// Same as [`Vocabulary::new`]
    pub fn from_fields(
        dataset: &DatasetRef,
        fields: &[FieldInfo],
        policy: CasePolicy,
    ) -> MigrationResult<Self> {
        Self::new(dataset, fields.iter().map(|f| f.name.as_str()), policy)
    }

    /// Fetch the layer's field metadata and build its vocabulary
    ///
    /// # Errors
    /// - Collaborator failures, unchanged
    /// - `MigrationError::VocabularyEmpty` (likely wrong layer or dataset id)
    pub async fn resolve<C>(
        catalog: &C,
        dataset: &DatasetRef,
        policy: CasePolicy,
    ) -> MigrationResult<Self>
    where
        C: FieldCatalog + ?Sized,
    {
        let fields = catalog
            .fetch_field_metadata(&dataset.item_id, dataset.layer)
            .await?;
        let vocabulary = Self::from_fields(dataset, &fields, policy)?;
        tracing::info!(
            "resolved {} field names for dataset {} ({} in metadata)",
            vocabulary.len(),
            dataset,
            fields.len()
        );
        Ok(vocabulary)
    }

    /// Dataset this vocabulary belongs to
    #[inline]
    #[must_use]
    pub fn dataset(&self) -> &DatasetRef {
        &self.dataset
    }

    /// Authoritative names
    #[inline]
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of names
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false; an empty vocabulary cannot be constructed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Replacement for a whole value, if it names a field
    #[inline]
    #[must_use]
    pub fn canonical(&self, name: &str) -> Option<&str> {
        self.canonical.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Check if a whole value names a field
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.canonical(name).is_some()
    }

    /// Replace every whole-token field occurrence in `text`
    ///
    /// `NAME` inside `SURNAME` is not a token and stays untouched.
    #[must_use]
    pub fn replace_tokens<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.matcher.replace_all(text, |caps: &Captures<'_>| {
            let found = &caps[0];
            self.canonical(found).unwrap_or(found).to_string()
        })
    }
}

fn is_system_field(name: &str) -> bool {
    SYSTEM_FIELDS.iter().any(|system| system.eq_ignore_ascii_case(name))
}

fn build_matcher(names: &[String]) -> MigrationResult<Regex> {
    let mut ordered: Vec<&String> = names.iter().collect();
    ordered.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let alternatives: Vec<String> = ordered
        .into_iter()
        .map(|name| {
            // Boundaries only where the name itself starts or ends with a word character
            let head = if starts_with_word(name) { r"\b" } else { "" };
            let tail = if ends_with_word(name) { r"\b" } else { "" };
            format!("{head}{}{tail}", regex::escape(name))
        })
        .collect();

    RegexBuilder::new(&format!("(?:{})", alternatives.join("|")))
        .case_insensitive(true)
        .size_limit(32 * 1024 * 1024)
        .build()
        .map_err(|e| MigrationError::InvalidVocabulary(e.to_string()))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn starts_with_word(name: &str) -> bool {
    name.chars().next().is_some_and(is_word_char)
}

fn ends_with_word(name: &str) -> bool {
    name.chars().next_back().is_some_and(is_word_char)
}
