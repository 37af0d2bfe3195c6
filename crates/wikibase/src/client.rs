//! HTTP implementation of [`RemoteEntityGateway`] for the MediaWiki Action API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::error::GatewayError;
use crate::gateway::RemoteEntityGateway;
use crate::models::{
    ApiErrorBody, ClaimResponse, EntityEditResponse, QueryResponse, TagResponse,
};
use crate::types::{EntityId, FileReference, LanguageCode, RevisionId, DEPICTS_PROPERTY};

/// Default knowledge-base API endpoint.
pub const DEFAULT_WIKIBASE_API: &str = "https://www.wikidata.org/w/api.php";

/// Default media-repository API endpoint.
pub const DEFAULT_COMMONS_API: &str = "https://commons.wikimedia.org/w/api.php";

const DEFAULT_USER_AGENT: &str = "commons-annotate/0.2.0";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for [`WikibaseClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Action API of the knowledge base holding items (`Q…`).
    pub wikibase_api_url: String,
    /// Action API of the media repository holding file entities (`M…`).
    pub commons_api_url: String,
    /// CSRF token sent with every write.
    pub edit_token: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            wikibase_api_url: DEFAULT_WIKIBASE_API.to_string(),
            commons_api_url: DEFAULT_COMMONS_API.to_string(),
            edit_token: String::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Gateway backed by the MediaWiki/Wikibase Action API.
#[derive(Debug, Clone)]
pub struct WikibaseClient {
    client: Client,
    wikibase_api_url: String,
    commons_api_url: String,
    edit_token: String,
}

impl WikibaseClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint is empty or the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, GatewayError> {
        if config.wikibase_api_url.is_empty() {
            return Err(GatewayError::Config(
                "knowledge-base API URL is required".to_string(),
            ));
        }
        if config.commons_api_url.is_empty() {
            return Err(GatewayError::Config(
                "media-repository API URL is required".to_string(),
            ));
        }

        let client = Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            wikibase_api_url: config.wikibase_api_url,
            commons_api_url: config.commons_api_url,
            edit_token: config.edit_token,
        })
    }

    /// POST an action and decode its body.
    async fn post<T>(&self, api_url: &str, params: &[(&str, String)]) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
    {
        let mut form: Vec<(&str, String)> = params.to_vec();
        form.push(("format", "json".to_string()));
        form.push(("formatversion", "2".to_string()));

        debug!(url = %api_url, action = ?params.first().map(|(_, v)| v), "Posting API action");

        let response = self.client.post(api_url).form(&form).send().await?;
        Self::decode(response).await
    }

    /// GET a read-only action and decode its body.
    async fn get<T>(&self, api_url: &str, params: &[(&str, String)]) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
    {
        let mut query: Vec<(&str, String)> = params.to_vec();
        query.push(("format", "json".to_string()));
        query.push(("formatversion", "2".to_string()));

        debug!(url = %api_url, action = ?params.first().map(|(_, v)| v), "Querying API");

        let response = self.client.get(api_url).query(&query).send().await?;
        Self::decode(response).await
    }

    async fn decode<T>(response: reqwest::Response) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let mut value: Value = serde_json::from_str(&body)?;

        // The Action API reports failures with HTTP 200 and an `error` object
        if let Some(error) = value.get_mut("error").map(Value::take) {
            let error: ApiErrorBody = serde_json::from_value(error)?;
            return Err(GatewayError::Api {
                code: error.code,
                info: error.info,
            });
        }

        serde_json::from_value(value).map_err(GatewayError::Serialization)
    }

    fn token_or_default<'a>(&'a self, token: &'a str) -> &'a str {
        if token.is_empty() {
            &self.edit_token
        } else {
            token
        }
    }
}

#[async_trait]
impl RemoteEntityGateway for WikibaseClient {
    #[instrument(skip_all, fields(entity_id = %entity_id, property = %property))]
    async fn create_claim(
        &self,
        entity_id: &EntityId,
        property: &str,
        value: &str,
    ) -> Result<RevisionId, GatewayError> {
        let response: ClaimResponse = self
            .post(
                &self.wikibase_api_url,
                &[
                    ("action", "wbcreateclaim".to_string()),
                    ("entity", entity_id.to_string()),
                    ("property", property.to_string()),
                    ("snaktype", "value".to_string()),
                    ("value", value.to_string()),
                    ("token", self.edit_token.clone()),
                ],
            )
            .await?;

        let revision = match (response.success, response.pageinfo) {
            (Some(1), Some(page)) => page.lastrevid.map_or(RevisionId::REJECTED, RevisionId::new),
            _ => RevisionId::REJECTED,
        };
        debug!(revision = %revision, "Claim request completed");
        Ok(revision)
    }

    #[instrument(skip_all, fields(revision = %revision, tag = %tag))]
    async fn add_edit_tag(
        &self,
        revision: RevisionId,
        tag: &str,
        reason: &str,
    ) -> Result<bool, GatewayError> {
        let response: TagResponse = self
            .post(
                &self.wikibase_api_url,
                &[
                    ("action", "tag".to_string()),
                    ("revid", revision.to_string()),
                    ("add", tag.to_string()),
                    ("reason", reason.to_string()),
                    ("token", self.edit_token.clone()),
                ],
            )
            .await?;

        Ok(response
            .tag
            .iter()
            .any(|result| result.status == "success" && result.revid == Some(revision.get())))
    }

    #[instrument(skip_all, fields(file = %file))]
    async fn get_file_entity_id(
        &self,
        file: &FileReference,
    ) -> Result<Option<EntityId>, GatewayError> {
        let response: QueryResponse = self
            .get(
                &self.commons_api_url,
                &[
                    ("action", "query".to_string()),
                    ("prop", "info".to_string()),
                    ("titles", file.title()),
                ],
            )
            .await?;

        let page = response
            .query
            .ok_or(GatewayError::MissingField("query"))?
            .pages
            .into_iter()
            .next();

        Ok(match page {
            Some(page) if !page.missing => page.pageid.map(EntityId::media_info),
            _ => None,
        })
    }

    #[instrument(skip_all, fields(entity_id = %entity_id, related = %related))]
    async fn set_entity_relation(
        &self,
        entity_id: &EntityId,
        related: &EntityId,
    ) -> Result<RevisionId, GatewayError> {
        let numeric_id = entity_id
            .numeric_id()
            .ok_or_else(|| GatewayError::InvalidEntity(entity_id.to_string()))?;
        let value = json!({ "entity-type": "item", "numeric-id": numeric_id });

        let response: ClaimResponse = self
            .post(
                &self.commons_api_url,
                &[
                    ("action", "wbcreateclaim".to_string()),
                    ("entity", related.to_string()),
                    ("property", DEPICTS_PROPERTY.to_string()),
                    ("snaktype", "value".to_string()),
                    ("value", value.to_string()),
                    ("token", self.edit_token.clone()),
                ],
            )
            .await?;

        match (response.success, response.pageinfo) {
            (Some(1), Some(page)) => Ok(page.lastrevid.map_or(RevisionId::REJECTED, RevisionId::new)),
            _ => Ok(RevisionId::REJECTED),
        }
    }

    #[instrument(skip_all, fields(entity_id = %entity_id, language = %language))]
    async fn set_entity_label(
        &self,
        entity_id: &EntityId,
        auth_token: &str,
        language: &LanguageCode,
        text: &str,
    ) -> Result<RevisionId, GatewayError> {
        let response: EntityEditResponse = self
            .post(
                &self.commons_api_url,
                &[
                    ("action", "wbsetlabel".to_string()),
                    ("id", entity_id.to_string()),
                    ("language", language.to_string()),
                    ("value", text.to_string()),
                    ("token", self.token_or_default(auth_token).to_string()),
                ],
            )
            .await?;

        if response.success != Some(1) {
            return Ok(RevisionId::REJECTED);
        }
        let entity = response.entity.ok_or(GatewayError::MissingField("entity"))?;
        Ok(entity.lastrevid.map_or(RevisionId::REJECTED, RevisionId::new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty_endpoints() {
        let config = ClientConfig {
            wikibase_api_url: String::new(),
            ..ClientConfig::default()
        };
        assert!(matches!(
            WikibaseClient::new(config),
            Err(GatewayError::Config(_))
        ));

        let config = ClientConfig {
            commons_api_url: String::new(),
            ..ClientConfig::default()
        };
        assert!(matches!(
            WikibaseClient::new(config),
            Err(GatewayError::Config(_))
        ));
    }

    #[test]
    fn test_empty_label_token_falls_back_to_edit_token() {
        let client = WikibaseClient::new(ClientConfig {
            edit_token: "csrf+\\".to_string(),
            ..ClientConfig::default()
        })
        .unwrap();
        assert_eq!(client.token_or_default(""), "csrf+\\");
        assert_eq!(client.token_or_default("other"), "other");
    }
}
