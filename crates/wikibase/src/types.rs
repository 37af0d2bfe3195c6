//! Identifiers and value types shared by the gateway and its callers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Property linking an item to its representative image.
pub const IMAGE_PROPERTY: &str = "P18";

/// Property stating that a file depicts an item.
pub const DEPICTS_PROPERTY: &str = "P180";

/// Namespace prefix the media repository puts in front of file titles.
pub const FILE_NAMESPACE: &str = "File:";

// ============================================================================
// Entity identifiers
// ============================================================================

/// Identifier of a knowledge-base entity (`Q42` for items, `M7` for files).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Parse an entity id, returning `None` for blank input.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Build the entity id of a media-repository file from its page id.
    #[must_use]
    pub fn media_info(page_id: u64) -> Self {
        Self(format!("M{page_id}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric part of the id (`Q42` -> 42).
    #[must_use]
    pub fn numeric_id(&self) -> Option<u64> {
        self.0.get(1..)?.parse().ok()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// File references
// ============================================================================

/// Display name of an uploaded file as the media repository knows it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileReference(String);

impl FileReference {
    /// Parse a file reference, returning `None` for blank input.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == FILE_NAMESPACE {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// File name without the namespace prefix.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.strip_prefix(FILE_NAMESPACE).unwrap_or(&self.0)
    }

    /// Page title including the namespace prefix.
    #[must_use]
    pub fn title(&self) -> String {
        format!("{FILE_NAMESPACE}{}", self.file_name())
    }

    /// The file name as a quoted string value, as `wbcreateclaim` expects.
    ///
    /// `File:Example.jpg` becomes `"Example.jpg"`.
    #[must_use]
    pub fn property_value(&self) -> String {
        serde_json::Value::String(self.file_name().to_string()).to_string()
    }
}

impl fmt::Display for FileReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Revisions
// ============================================================================

/// Revision produced by a successful write.
///
/// The remote signals a rejected write with [`RevisionId::REJECTED`], which is
/// distinct from a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(i64);

impl RevisionId {
    /// Sentinel for a write the remote refused.
    pub const REJECTED: Self = Self(-1);

    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_rejected(self) -> bool {
        self.0 <= 0
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Labels
// ============================================================================

/// Language code of a label (`en`, `fr`, `pt-br`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageCode(String);

impl LanguageCode {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A localized label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub language: LanguageCode,
    pub text: String,
}

impl Label {
    #[must_use]
    pub fn new(language: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            language: LanguageCode::new(language),
            text: text.into(),
        }
    }
}

/// Error returned when a `lang=text` pair cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid label `{0}`, expected `language=text`")]
pub struct ParseLabelError(String);

impl FromStr for Label {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (language, text) = s
            .split_once('=')
            .ok_or_else(|| ParseLabelError(s.to_string()))?;
        let language = language.trim();
        if language.is_empty() || text.is_empty() {
            return Err(ParseLabelError(s.to_string()));
        }
        Ok(Self::new(language, text))
    }
}

/// Ordered labels to attach in one request. Duplicate languages are kept;
/// every entry becomes its own edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelSet(Vec<Label>);

impl LabelSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: Label) {
        self.0.push(label);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Label> {
        self.0.iter()
    }
}

impl FromIterator<Label> for LabelSet {
    fn from_iter<I: IntoIterator<Item = Label>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<L: Into<String>, T: Into<String>> FromIterator<(L, T)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (L, T)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(language, text)| Label::new(language, text))
            .collect()
    }
}

impl IntoIterator for LabelSet {
    type Item = Label;
    type IntoIter = std::vec::IntoIter<Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a LabelSet {
    type Item = &'a Label;
    type IntoIter = std::slice::Iter<'a, Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ============================================================================
// Edit tags
// ============================================================================

/// Provenance tag applied to revisions made by this client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditTag {
    pub name: String,
    pub reason: String,
}

impl Default for EditTag {
    fn default() -> Self {
        Self {
            name: "wikimedia-commons-app".to_string(),
            reason: "Add tag for edits made using Android Commons app".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_value_strips_namespace_and_quotes() {
        let file = FileReference::parse("File:Example.jpg").unwrap();
        assert_eq!(file.property_value(), "\"Example.jpg\"");
        assert_eq!(file.title(), "File:Example.jpg");

        let bare = FileReference::parse("Example.jpg").unwrap();
        assert_eq!(bare.property_value(), "\"Example.jpg\"");
        assert_eq!(bare.title(), "File:Example.jpg");
    }

    #[test]
    fn test_property_value_escapes_quotes() {
        let file = FileReference::parse("File:The \"Cat\".jpg").unwrap();
        assert_eq!(file.property_value(), r#""The \"Cat\".jpg""#);
    }

    #[test]
    fn test_blank_identifiers_are_rejected() {
        assert!(EntityId::parse("").is_none());
        assert!(EntityId::parse("   ").is_none());
        assert!(FileReference::parse("").is_none());
        assert!(FileReference::parse("File:").is_none());
    }

    #[test]
    fn test_entity_numeric_id() {
        assert_eq!(EntityId::parse("Q42").unwrap().numeric_id(), Some(42));
        assert_eq!(EntityId::media_info(7).as_str(), "M7");
        assert_eq!(EntityId::parse("Qx").unwrap().numeric_id(), None);
    }

    #[test]
    fn test_revision_sentinel() {
        assert!(RevisionId::REJECTED.is_rejected());
        assert!(RevisionId::new(0).is_rejected());
        assert!(!RevisionId::new(55).is_rejected());
    }

    #[test]
    fn test_label_parsing() {
        let label: Label = "fr=Chat noir".parse().unwrap();
        assert_eq!(label.language.as_str(), "fr");
        assert_eq!(label.text, "Chat noir");

        assert!("fr".parse::<Label>().is_err());
        assert!("=Chat".parse::<Label>().is_err());
        assert!("fr=".parse::<Label>().is_err());
    }

    #[test]
    fn test_label_set_keeps_duplicates_in_order() {
        let labels: LabelSet = [("en", "Cat"), ("en", "Kitty"), ("fr", "Chat")]
            .into_iter()
            .collect();
        let languages: Vec<&str> = labels.iter().map(|l| l.language.as_str()).collect();
        assert_eq!(languages, vec!["en", "en", "fr"]);
    }
}
