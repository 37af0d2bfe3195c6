//! Runtime configuration read from the environment.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::EditOutcomeNotifier;
use wikibase::{
    ClientConfig, EditTag, EntityId, GatewayError, WikibaseClient, DEFAULT_COMMONS_API,
    DEFAULT_WIKIBASE_API,
};

use crate::error::ConfigError;
use crate::guard::LocationGuard;
use crate::orchestrator::{EntityAnnotationOrchestrator, SANDBOX_ENTITY};
use crate::preferences::PreferenceRead;
use crate::scheduler::Foreground;

const ENV_WIKIBASE_API_URL: &str = "WIKIBASE_API_URL";
const ENV_COMMONS_API_URL: &str = "COMMONS_API_URL";
const ENV_EDIT_TOKEN: &str = "WIKIBASE_EDIT_TOKEN";
const ENV_PREFERENCES: &str = "ANNOTATE_PREFERENCES";
const ENV_USER_AGENT: &str = "ANNOTATE_USER_AGENT";
const ENV_SANDBOX: &str = "ANNOTATE_SANDBOX";
const ENV_TIMEOUT_SECS: &str = "ANNOTATE_TIMEOUT_SECS";
const ENV_EDIT_TAG: &str = "ANNOTATE_EDIT_TAG";

const DEFAULT_PREFERENCES: &str = "preferences.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub wikibase_api_url: String,
    pub commons_api_url: String,
    /// CSRF token for writes. Also used as the label auth token.
    pub edit_token: String,
    pub preferences_path: PathBuf,
    /// `None` keeps the client's default.
    pub user_agent: Option<String>,
    /// Redirect every edit to the sandbox item.
    pub sandbox: bool,
    pub timeout: Duration,
    /// Provenance tag applied to every image claim.
    pub tag: EditTag,
}

impl Config {
    /// Read the configuration, falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = ClientConfig::default();

        let sandbox = match env_value(ENV_SANDBOX) {
            Some(value) => parse_flag(ENV_SANDBOX, &value)?,
            None => false,
        };

        let timeout = match env_value(ENV_TIMEOUT_SECS) {
            Some(value) => value
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid {
                    name: ENV_TIMEOUT_SECS,
                    value,
                })?,
            None => defaults.timeout,
        };

        Ok(Self {
            wikibase_api_url: env_value(ENV_WIKIBASE_API_URL)
                .unwrap_or_else(|| DEFAULT_WIKIBASE_API.to_string()),
            commons_api_url: env_value(ENV_COMMONS_API_URL)
                .unwrap_or_else(|| DEFAULT_COMMONS_API.to_string()),
            edit_token: env_value(ENV_EDIT_TOKEN).unwrap_or_default(),
            preferences_path: env_value(ENV_PREFERENCES)
                .map_or_else(|| PathBuf::from(DEFAULT_PREFERENCES), PathBuf::from),
            user_agent: env_value(ENV_USER_AGENT),
            sandbox,
            timeout,
            tag: env_value(ENV_EDIT_TAG).map_or_else(EditTag::default, |name| EditTag {
                name,
                ..EditTag::default()
            }),
        })
    }

    /// Check that the configuration can be used for writes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, url) in [
            (ENV_WIKIBASE_API_URL, &self.wikibase_api_url),
            (ENV_COMMONS_API_URL, &self.commons_api_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Invalid {
                    name,
                    value: url.clone(),
                });
            }
        }

        if self.edit_token.is_empty() {
            return Err(ConfigError::Missing(ENV_EDIT_TOKEN));
        }

        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid {
                name: ENV_TIMEOUT_SECS,
                value: "0".to_string(),
            });
        }

        Ok(())
    }

    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            wikibase_api_url: self.wikibase_api_url.clone(),
            commons_api_url: self.commons_api_url.clone(),
            edit_token: self.edit_token.clone(),
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            timeout: self.timeout,
        }
    }

    /// Wire an orchestrator against the configured knowledge base.
    ///
    /// Edits are gated by the location check stored in `preferences`.
    pub fn orchestrator(
        &self,
        preferences: Arc<dyn PreferenceRead>,
        notifier: Arc<dyn EditOutcomeNotifier>,
        foreground: Foreground,
    ) -> Result<EntityAnnotationOrchestrator, GatewayError> {
        let gateway = Arc::new(WikibaseClient::new(self.client_config())?);

        Ok(EntityAnnotationOrchestrator::new(gateway, notifier, foreground)
            .with_guard(Arc::new(LocationGuard::new(Arc::clone(&preferences))))
            .with_preferences(preferences)
            .with_tag(self.tag.clone())
            .with_auth_token(self.edit_token.clone())
            .with_entity_override(self.entity_override()))
    }

    /// The sandbox item when sandbox mode is on.
    #[must_use]
    pub fn entity_override(&self) -> Option<EntityId> {
        if self.sandbox {
            EntityId::parse(SANDBOX_ENTITY)
        } else {
            None
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ALL: [&str; 8] = [
        ENV_WIKIBASE_API_URL,
        ENV_COMMONS_API_URL,
        ENV_EDIT_TOKEN,
        ENV_PREFERENCES,
        ENV_USER_AGENT,
        ENV_SANDBOX,
        ENV_TIMEOUT_SECS,
        ENV_EDIT_TAG,
    ];

    fn clear_env() {
        for name in ALL {
            std::env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = Config::from_env().unwrap();

        assert_eq!(config.wikibase_api_url, DEFAULT_WIKIBASE_API);
        assert_eq!(config.commons_api_url, DEFAULT_COMMONS_API);
        assert_eq!(config.preferences_path, PathBuf::from("preferences.json"));
        assert!(!config.sandbox);
        assert_eq!(config.tag, EditTag::default());
        assert!(config.entity_override().is_none());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("WIKIBASE_EDIT_TOKEN"))
        ));
    }

    #[test]
    #[serial]
    fn test_sandbox_redirects_to_sandbox_item() {
        clear_env();
        std::env::set_var(ENV_SANDBOX, "true");
        std::env::set_var(ENV_EDIT_TOKEN, "abc+\\");

        let config = Config::from_env().unwrap();
        assert_eq!(config.entity_override().unwrap().as_str(), "Q4115189");
        assert!(config.validate().is_ok());
        assert_eq!(config.client_config().edit_token, "abc+\\");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_are_rejected() {
        clear_env();
        std::env::set_var(ENV_SANDBOX, "maybe");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid { name: "ANNOTATE_SANDBOX", .. })
        ));

        clear_env();
        std::env::set_var(ENV_TIMEOUT_SECS, "soon");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid { name: "ANNOTATE_TIMEOUT_SECS", .. })
        ));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_validate_rejects_non_http_urls() {
        clear_env();
        std::env::set_var(ENV_EDIT_TOKEN, "token");
        std::env::set_var(ENV_COMMONS_API_URL, "ftp://commons");

        let config = Config::from_env().unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { name: "COMMONS_API_URL", .. })
        ));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_edit_tag_name_override_keeps_reason() {
        clear_env();
        std::env::set_var(ENV_EDIT_TAG, "bot-import");

        let config = Config::from_env().unwrap();
        assert_eq!(config.tag.name, "bot-import");
        assert_eq!(config.tag.reason, EditTag::default().reason);

        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn test_orchestrator_is_wired_from_config() {
        clear_env();
        std::env::set_var(ENV_EDIT_TOKEN, "token");
        let config = Config::from_env().unwrap();
        clear_env();

        let (fg, ui) = crate::scheduler::foreground();
        let ui = ui.spawn();
        let preferences = Arc::new(
            crate::preferences::JsonKvStore::default()
                .with(crate::guard::CORRECT_LOCATION_KEY, false),
        );
        let notifier = Arc::new(notify::Notifier::disabled());

        let orchestrator = config.orchestrator(preferences, notifier, fg).unwrap();

        // The stored location mismatch reaches the guard.
        let report = orchestrator
            .annotate_and_wait("Q1", "File:Cat.jpg", wikibase::LabelSet::new())
            .await;
        assert_eq!(report.skipped, Some(crate::SkipReason::GuardDenied));

        drop(orchestrator);
        ui.await.unwrap();
    }
}
