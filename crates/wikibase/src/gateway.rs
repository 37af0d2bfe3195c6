//! The remote write capability consumed by the orchestrator.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::types::{EntityId, FileReference, LanguageCode, RevisionId};

/// Atomic remote operations against the knowledge base.
///
/// Implementations perform a single request per call. They never retry and
/// carry no orchestration logic.
#[async_trait]
pub trait RemoteEntityGateway: Send + Sync {
    /// Create a claim `property = value` on `entity_id`.
    ///
    /// Returns [`RevisionId::REJECTED`] when the remote refused the edit.
    async fn create_claim(
        &self,
        entity_id: &EntityId,
        property: &str,
        value: &str,
    ) -> Result<RevisionId, GatewayError>;

    /// Attach a provenance tag to an existing revision.
    async fn add_edit_tag(
        &self,
        revision: RevisionId,
        tag: &str,
        reason: &str,
    ) -> Result<bool, GatewayError>;

    /// Resolve the entity that represents `file` itself, if it has one.
    async fn get_file_entity_id(
        &self,
        file: &FileReference,
    ) -> Result<Option<EntityId>, GatewayError>;

    /// Record that the file entity `related` depicts `entity_id`.
    async fn set_entity_relation(
        &self,
        entity_id: &EntityId,
        related: &EntityId,
    ) -> Result<RevisionId, GatewayError>;

    /// Set the label of `entity_id` for one language.
    async fn set_entity_label(
        &self,
        entity_id: &EntityId,
        auth_token: &str,
        language: &LanguageCode,
        text: &str,
    ) -> Result<RevisionId, GatewayError>;
}
