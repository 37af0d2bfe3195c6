//! Localized user-facing messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::Severity;

/// Locale used when the requested one has no translations.
pub const FALLBACK_LOCALE: &str = "en";

/// Messages the orchestrator can show to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKey {
    /// The image claim was created. Takes the subject's title.
    EditSuccess,
    /// The image claim could not be made.
    EditFailure,
}

impl MessageKey {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EditSuccess => "edit_success",
            Self::EditFailure => "edit_failure",
        }
    }

    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::EditSuccess => Severity::Info,
            Self::EditFailure => Severity::Critical,
        }
    }
}

/// A rendered message ready for delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMessage {
    pub key: MessageKey,
    pub text: String,
    pub severity: Severity,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// Message templates for one locale.
///
/// Templates use positional placeholders (`{0}`, `{1}`, ...).
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    language: String,
}

impl MessageCatalog {
    /// Create a catalog for `locale` (`fr`, `fr-FR` and `fr_FR` are equivalent).
    #[must_use]
    pub fn new(locale: &str) -> Self {
        let language = locale
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        let language = if Self::template_for(&language, MessageKey::EditFailure).is_some() {
            language
        } else {
            FALLBACK_LOCALE.to_string()
        };

        Self { language }
    }

    /// The language actually used for rendering.
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    fn template_for(language: &str, key: MessageKey) -> Option<&'static str> {
        let template = match (language, key) {
            ("en", MessageKey::EditSuccess) => "Image successfully added to {0} on Wikidata!",
            ("en", MessageKey::EditFailure) => "Failed to update corresponding Wikidata entity!",
            ("fr", MessageKey::EditSuccess) => "Image ajoutée avec succès à {0} sur Wikidata !",
            ("fr", MessageKey::EditFailure) => {
                "Échec de la mise à jour de l'entité Wikidata correspondante !"
            }
            ("de", MessageKey::EditSuccess) => {
                "Bild erfolgreich zu {0} auf Wikidata hinzugefügt!"
            }
            ("de", MessageKey::EditFailure) => {
                "Die zugehörige Wikidata-Entität konnte nicht aktualisiert werden!"
            }
            _ => return None,
        };
        Some(template)
    }

    /// Render `key` with positional `args`. Missing args render as empty text.
    #[must_use]
    pub fn render(&self, key: MessageKey, args: &[String]) -> String {
        let template = Self::template_for(&self.language, key)
            .or_else(|| Self::template_for(FALLBACK_LOCALE, key))
            .unwrap_or_default();

        // Single pass over the template; substituted text is never rescanned.
        let mut text = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find('{') {
            text.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let placeholder = after
                .find('}')
                .and_then(|end| after[..end].parse::<usize>().ok().map(|index| (index, end)));

            match placeholder {
                Some((index, end)) => {
                    text.push_str(args.get(index).map_or("", String::as_str));
                    rest = &after[end + 1..];
                }
                None => {
                    text.push('{');
                    rest = after;
                }
            }
        }
        text.push_str(rest);
        text
    }

    /// Render `key` into a [`UserMessage`].
    #[must_use]
    pub fn message(&self, key: MessageKey, args: &[String]) -> UserMessage {
        UserMessage {
            key,
            text: self.render(key, args),
            severity: key.severity(),
            timestamp: Utc::now(),
        }
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::new(FALLBACK_LOCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_success_with_title() {
        let catalog = MessageCatalog::default();
        let text = catalog.render(MessageKey::EditSuccess, &["Tour Eiffel".to_string()]);
        assert_eq!(text, "Image successfully added to Tour Eiffel on Wikidata!");
    }

    #[test]
    fn test_missing_argument_renders_empty() {
        let catalog = MessageCatalog::default();
        let text = catalog.render(MessageKey::EditSuccess, &[]);
        assert_eq!(text, "Image successfully added to  on Wikidata!");
    }

    #[test]
    fn test_braces_in_arguments_are_kept_verbatim() {
        let catalog = MessageCatalog::default();
        let text = catalog.render(MessageKey::EditSuccess, &["Set {1} Theory".to_string()]);
        assert_eq!(text, "Image successfully added to Set {1} Theory on Wikidata!");

        let text = catalog.render(MessageKey::EditSuccess, &["{0}".to_string()]);
        assert_eq!(text, "Image successfully added to {0} on Wikidata!");
    }

    #[test]
    fn test_region_suffix_is_ignored() {
        assert_eq!(MessageCatalog::new("fr-FR").language(), "fr");
        assert_eq!(MessageCatalog::new("de_AT").language(), "de");
        assert_eq!(MessageCatalog::new("FR").language(), "fr");
    }

    #[test]
    fn test_unknown_locale_falls_back_to_english() {
        let catalog = MessageCatalog::new("xx");
        assert_eq!(catalog.language(), "en");
        assert_eq!(
            catalog.render(MessageKey::EditFailure, &[]),
            "Failed to update corresponding Wikidata entity!"
        );
    }

    #[test]
    fn test_message_carries_key_severity() {
        let message = MessageCatalog::new("de").message(MessageKey::EditFailure, &[]);
        assert_eq!(message.severity, Severity::Critical);
        assert!(message.text.starts_with("Die zugehörige"));
    }
}
