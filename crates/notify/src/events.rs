//! Structured records of every step an annotation request goes through.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wikibase::{EntityId, FileReference, LanguageCode, RevisionId};

/// Severity levels for edit events and user messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Normal progress
    Info,
    /// A best-effort step did not complete
    Warning,
    /// The user-visible edit failed
    Critical,
}

impl Severity {
    /// Get the webhook attachment color for this severity.
    #[must_use]
    pub const fn color(&self) -> &'static str {
        match self {
            Self::Info => "#3498db",     // Blue
            Self::Warning => "#f39c12",  // Orange
            Self::Critical => "#e74c3c", // Red
        }
    }

    /// Get display name for this severity.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Warning => "Warning",
            Self::Critical => "Critical",
        }
    }
}

/// Outcome of one step of an annotation request.
///
/// Rejections (the remote refused a write) and failures (the request never
/// completed) are separate variants so logs can tell them apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditEvent {
    /// The request was dropped before any remote call
    Skipped {
        reason: String,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },

    // =========================================================================
    // Image claim
    // =========================================================================
    ClaimCreated {
        entity_id: EntityId,
        revision: RevisionId,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },

    ClaimRejected {
        entity_id: EntityId,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },

    ClaimFailed {
        entity_id: EntityId,
        error: String,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },

    EditTagged {
        revision: RevisionId,
        tag: String,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },

    EditTagFailed {
        revision: RevisionId,
        tag: String,
        error: String,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },

    // =========================================================================
    // File entity
    // =========================================================================
    FileEntityResolved {
        file: FileReference,
        file_entity_id: EntityId,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },

    FileEntityMissing {
        file: FileReference,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },

    FileEntityFailed {
        file: FileReference,
        error: String,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },

    // =========================================================================
    // Depicts relation and labels
    // =========================================================================
    RelationSet {
        entity_id: EntityId,
        file_entity_id: EntityId,
        revision: RevisionId,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },

    RelationFailed {
        entity_id: EntityId,
        file_entity_id: EntityId,
        error: String,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },

    LabelSet {
        file_entity_id: EntityId,
        language: LanguageCode,
        revision: RevisionId,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },

    LabelFailed {
        file_entity_id: EntityId,
        language: LanguageCode,
        error: String,
        #[serde(default = "Utc::now")]
        timestamp: DateTime<Utc>,
    },
}

impl EditEvent {
    /// Get a short title for this event.
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::Skipped { reason, .. } => format!("Edit skipped: {reason}"),
            Self::ClaimCreated {
                entity_id,
                revision,
                ..
            } => format!("Image claim created on {entity_id} (revision {revision})"),
            Self::ClaimRejected { entity_id, .. } => {
                format!("Image claim rejected for {entity_id}")
            }
            Self::ClaimFailed {
                entity_id, error, ..
            } => format!("Image claim failed for {entity_id}: {error}"),
            Self::EditTagged { revision, tag, .. } => {
                format!("Revision {revision} tagged `{tag}`")
            }
            Self::EditTagFailed {
                revision, error, ..
            } => format!("Tagging revision {revision} failed: {error}"),
            Self::FileEntityResolved {
                file,
                file_entity_id,
                ..
            } => format!("{file} resolved to {file_entity_id}"),
            Self::FileEntityMissing { file, .. } => format!("No entity for {file}"),
            Self::FileEntityFailed { file, error, .. } => {
                format!("Resolving entity for {file} failed: {error}")
            }
            Self::RelationSet {
                entity_id,
                file_entity_id,
                ..
            } => format!("{file_entity_id} depicts {entity_id}"),
            Self::RelationFailed {
                entity_id,
                file_entity_id,
                error,
                ..
            } => format!("Setting {file_entity_id} depicts {entity_id} failed: {error}"),
            Self::LabelSet {
                file_entity_id,
                language,
                ..
            } => format!("Label [{language}] set on {file_entity_id}"),
            Self::LabelFailed {
                file_entity_id,
                language,
                error,
                ..
            } => format!("Label [{language}] on {file_entity_id} failed: {error}"),
        }
    }

    /// Get the severity for this event.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Skipped { .. }
            | Self::ClaimCreated { .. }
            | Self::EditTagged { .. }
            | Self::FileEntityResolved { .. }
            | Self::FileEntityMissing { .. }
            | Self::RelationSet { .. }
            | Self::LabelSet { .. } => Severity::Info,

            Self::EditTagFailed { .. }
            | Self::FileEntityFailed { .. }
            | Self::RelationFailed { .. }
            | Self::LabelFailed { .. } => Severity::Warning,

            Self::ClaimRejected { .. } | Self::ClaimFailed { .. } => Severity::Critical,
        }
    }

    /// Get the timestamp for this event.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Skipped { timestamp, .. }
            | Self::ClaimCreated { timestamp, .. }
            | Self::ClaimRejected { timestamp, .. }
            | Self::ClaimFailed { timestamp, .. }
            | Self::EditTagged { timestamp, .. }
            | Self::EditTagFailed { timestamp, .. }
            | Self::FileEntityResolved { timestamp, .. }
            | Self::FileEntityMissing { timestamp, .. }
            | Self::FileEntityFailed { timestamp, .. }
            | Self::RelationSet { timestamp, .. }
            | Self::RelationFailed { timestamp, .. }
            | Self::LabelSet { timestamp, .. }
            | Self::LabelFailed { timestamp, .. } => *timestamp,
        }
    }
}
