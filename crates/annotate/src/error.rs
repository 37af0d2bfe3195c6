//! Error taxonomy of an annotation request.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use wikibase::{FileReference, GatewayError, RevisionId};

/// Why a request was dropped before any remote call. Never shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    #[error("entity id is empty")]
    MissingEntityId,

    #[error("file reference is empty")]
    MissingFile,

    #[error("no labels to attach")]
    NoLabels,

    #[error("image location does not match the nearby place")]
    GuardDenied,
}

/// Failure of one step of an annotation request.
#[derive(Debug, Clone, Error)]
pub enum EditError {
    /// The remote answered but refused the write
    #[error("{operation} rejected by remote")]
    Rejected { operation: &'static str },

    /// The call did not complete (network, HTTP status, decoding)
    #[error("{operation} failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: Arc<GatewayError>,
    },

    /// The file has no entity to attach to
    #[error("no entity found for {file}")]
    Unresolved { file: FileReference },

    /// The claim was made but the provenance tag was not applied
    #[error("revision {revision} was not tagged")]
    TagRejected { revision: RevisionId },
}

impl EditError {
    pub(crate) fn transport(operation: &'static str, source: GatewayError) -> Self {
        Self::Transport {
            operation,
            source: Arc::new(source),
        }
    }

    /// Short machine-readable name of the failure class.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Rejected { .. } | Self::TagRejected { .. } => "rejected",
            Self::Transport { .. } => "transport",
            Self::Unresolved { .. } => "unresolved",
        }
    }
}

/// The foreground context could not run a completion.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("foreground context is closed")]
    ForegroundClosed,
}

/// Errors reading the local preference file.
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} must contain a JSON object")]
    NotAnObject { path: String },
}

/// Invalid runtime configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}
