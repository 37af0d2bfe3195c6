//! Gateway to a Wikibase knowledge base and its media repository.
//!
//! This crate provides the remote write capability used to annotate
//! uploaded files with structured data:
//!
//! - create a claim on an item (`P18` image)
//! - tag a revision with the client's provenance tag
//! - resolve the entity id of a file (`M…`)
//! - record what a file depicts (`P180`)
//! - set localized labels on an entity
//!
//! # Architecture
//!
//! - [`RemoteEntityGateway`] trait defines the atomic operations
//! - [`WikibaseClient`] implements them over the MediaWiki Action API
//!
//! Neither retries nor sequences calls; that is the caller's job.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod error;
pub mod gateway;
mod models;
pub mod types;

pub use client::{ClientConfig, WikibaseClient, DEFAULT_COMMONS_API, DEFAULT_WIKIBASE_API};
pub use error::GatewayError;
pub use gateway::RemoteEntityGateway;
pub use types::{
    EditTag, EntityId, FileReference, Label, LabelSet, LanguageCode, ParseLabelError, RevisionId,
    DEPICTS_PROPERTY, FILE_NAMESPACE, IMAGE_PROPERTY,
};
