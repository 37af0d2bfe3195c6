//! Propagates the structured metadata of an uploaded file to a Wikibase
//! knowledge base.
//!
//! After an upload is published, [`EntityAnnotationOrchestrator::annotate`]
//! links the file to the item it was taken for (`P18`), tags that edit,
//! records what the file depicts (`P180`) and sets its localized labels.
//! Every call is made off the caller's task; only the image claim's
//! outcome is shown to the user, and it is shown from the foreground
//! context.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use annotate::{foreground, EntityAnnotationOrchestrator};
//! use notify::Notifier;
//! use wikibase::{ClientConfig, LabelSet, WikibaseClient};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let gateway = Arc::new(WikibaseClient::new(ClientConfig::default())?);
//! let (fg, ui) = foreground();
//! let ui = ui.spawn();
//!
//! let orchestrator = EntityAnnotationOrchestrator::new(gateway, Arc::new(Notifier::from_env()), fg);
//! let labels: LabelSet = [("en", "Cat")].into_iter().collect();
//! let report = orchestrator
//!     .annotate_and_wait("Q146", "File:Cat.jpg", labels)
//!     .await;
//! println!("{report:?}");
//!
//! drop(orchestrator);
//! ui.await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod guard;
pub mod orchestrator;
pub mod preferences;
pub mod scheduler;

pub use config::Config;
pub use error::{ConfigError, EditError, PreferenceError, SchedulerError, SkipReason};
pub use guard::{AlwaysAllow, EditGuardPolicy, LocationGuard, CORRECT_LOCATION_KEY};
pub use orchestrator::{
    AnnotationReport, EntityAnnotationOrchestrator, LabelResult, StepOutcome, SANDBOX_ENTITY,
};
pub use preferences::{JsonKvStore, PreferenceRead, TITLE_KEY};
pub use scheduler::{foreground, spawn_background, Foreground, ForegroundLoop};
