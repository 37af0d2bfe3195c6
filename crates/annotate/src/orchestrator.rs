//! Annotation orchestrator.
//!
//! One request fans out into three independent chains:
//!
//! - **claim**: create the `P18` claim on the item, then tag the revision.
//!   The only chain whose outcome reaches the user.
//! - **relation**: resolve the file's entity id, then record that the file
//!   depicts the item.
//! - **labels**: reuse the same resolution and set every label in parallel.
//!
//! The file entity id is looked up at most once per request and only if a
//! chain needs it. Chains never cancel each other.

use std::sync::Arc;

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Serialize, Serializer};
use tokio::runtime::Handle;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, info_span, Instrument};
use wikibase::{
    EditTag, EntityId, FileReference, LabelSet, LanguageCode, RemoteEntityGateway, RevisionId,
    IMAGE_PROPERTY,
};

use notify::{EditEvent, EditListener, EditOutcomeNotifier, MessageKey};

use crate::error::{EditError, SkipReason};
use crate::guard::{EditGuardPolicy, LocationGuard};
use crate::preferences::{JsonKvStore, PreferenceRead, TITLE_KEY};
use crate::scheduler::{spawn_background, Foreground};

/// Item used instead of the real subject when editing against the sandbox.
pub const SANDBOX_ENTITY: &str = "Q4115189";

type Resolution = Shared<BoxFuture<'static, Result<EntityId, EditError>>>;

// ============================================================================
// Report
// ============================================================================

/// Result of one remote write.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Done {
        revision: RevisionId,
    },
    Failed {
        kind: &'static str,
        #[serde(serialize_with = "error_text")]
        error: EditError,
    },
}

fn error_text<S: Serializer>(error: &EditError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

impl StepOutcome {
    fn failed(error: EditError) -> Self {
        Self::Failed {
            kind: error.kind(),
            error,
        }
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done { .. })
    }

    #[must_use]
    pub fn revision(&self) -> Option<RevisionId> {
        match self {
            Self::Done { revision } => Some(*revision),
            Self::Failed { .. } => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&EditError> {
        match self {
            Self::Done { .. } => None,
            Self::Failed { error, .. } => Some(error),
        }
    }
}

impl From<Result<RevisionId, EditError>> for StepOutcome {
    fn from(result: Result<RevisionId, EditError>) -> Self {
        match result {
            Ok(revision) => Self::Done { revision },
            Err(error) => Self::failed(error),
        }
    }
}

/// Outcome of one label write.
#[derive(Debug, Clone, Serialize)]
pub struct LabelResult {
    pub language: LanguageCode,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// Per-chain results of one request.
///
/// A `None` chain was never started (the request was skipped, or the entry
/// point does not run that chain).
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnnotationReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim: Option<StepOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<StepOutcome>,
    pub labels: Vec<LabelResult>,
}

impl AnnotationReport {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            skipped: Some(reason),
            ..Self::default()
        }
    }
}

/// Inputs of a request that passed every precondition.
#[derive(Debug, Clone)]
struct AnnotationPlan {
    entity_id: EntityId,
    file: FileReference,
    labels: LabelSet,
    /// Display title of the subject, read once per request.
    title: String,
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Propagates an upload's metadata to the knowledge base.
#[derive(Clone)]
pub struct EntityAnnotationOrchestrator {
    gateway: Arc<dyn RemoteEntityGateway>,
    notifier: Arc<dyn EditOutcomeNotifier>,
    guard: Arc<dyn EditGuardPolicy>,
    preferences: Arc<dyn PreferenceRead>,
    foreground: Foreground,
    listener: Option<Arc<dyn EditListener>>,
    tag: EditTag,
    auth_token: String,
    entity_override: Option<EntityId>,
}

impl EntityAnnotationOrchestrator {
    /// Create an orchestrator with an empty preference store and the
    /// location guard reading from it.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn RemoteEntityGateway>,
        notifier: Arc<dyn EditOutcomeNotifier>,
        foreground: Foreground,
    ) -> Self {
        let preferences: Arc<dyn PreferenceRead> = Arc::new(JsonKvStore::default());
        Self {
            gateway,
            notifier,
            guard: Arc::new(LocationGuard::new(Arc::clone(&preferences))),
            preferences,
            foreground,
            listener: None,
            tag: EditTag::default(),
            auth_token: String::new(),
            entity_override: None,
        }
    }

    #[must_use]
    pub fn with_guard(mut self, guard: Arc<dyn EditGuardPolicy>) -> Self {
        self.guard = guard;
        self
    }

    /// Replace the preference store. The guard is left untouched.
    #[must_use]
    pub fn with_preferences(mut self, preferences: Arc<dyn PreferenceRead>) -> Self {
        self.preferences = preferences;
        self
    }

    /// Invoked once per request whose image claim was created.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn EditListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    #[must_use]
    pub fn with_tag(mut self, tag: EditTag) -> Self {
        self.tag = tag;
        self
    }

    /// Credential passed to every label write.
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = token.into();
        self
    }

    /// Send every claim and relation to `entity_id` instead of the subject.
    #[must_use]
    pub fn with_entity_override(mut self, entity_id: Option<EntityId>) -> Self {
        self.entity_override = entity_id;
        self
    }

    // ------------------------------------------------------------------------
    // Entry points
    // ------------------------------------------------------------------------

    /// Start annotating `file` onto `entity_id` and return immediately.
    ///
    /// Outcomes surface through the notifier. Skipped requests are only
    /// logged.
    pub fn annotate(&self, entity_id: &str, file: &str, labels: LabelSet) {
        let Ok(plan) = self.prepare(entity_id, file, labels) else {
            return;
        };
        let Ok(runtime) = Handle::try_current() else {
            error!(entity_id, file, "annotate called outside a tokio runtime");
            return;
        };

        let span = info_span!("annotate", entity_id = %plan.entity_id, file = %plan.file);
        let this = self.clone();
        runtime.spawn(
            async move {
                let report = this.execute(plan).await;
                debug!(?report, "Annotation finished");
            }
            .instrument(span),
        );
    }

    /// Same as [`annotate`](Self::annotate), but wait for every chain and
    /// return what happened.
    pub async fn annotate_and_wait(
        &self,
        entity_id: &str,
        file: &str,
        labels: LabelSet,
    ) -> AnnotationReport {
        match self.prepare(entity_id, file, labels) {
            Ok(plan) => {
                let span = info_span!("annotate", entity_id = %plan.entity_id, file = %plan.file);
                self.clone().execute(plan).instrument(span).await
            }
            Err(reason) => AnnotationReport::skipped(reason),
        }
    }

    /// Start setting `labels` on the entity of `file` and return immediately.
    pub fn attach_labels(&self, file: &str, labels: LabelSet) {
        let Ok((file, labels)) = self.prepare_labels(file, labels) else {
            return;
        };
        let Ok(runtime) = Handle::try_current() else {
            error!(%file, "attach_labels called outside a tokio runtime");
            return;
        };

        let span = info_span!("attach_labels", file = %file);
        let this = self.clone();
        runtime.spawn(
            async move {
                let report = this.execute_labels(file, labels).await;
                debug!(?report, "Labels finished");
            }
            .instrument(span),
        );
    }

    /// Same as [`attach_labels`](Self::attach_labels), but wait for every
    /// label write.
    pub async fn attach_labels_and_wait(&self, file: &str, labels: LabelSet) -> AnnotationReport {
        match self.prepare_labels(file, labels) {
            Ok((file, labels)) => {
                let span = info_span!("attach_labels", file = %file);
                self.clone()
                    .execute_labels(file, labels)
                    .instrument(span)
                    .await
            }
            Err(reason) => AnnotationReport::skipped(reason),
        }
    }

    // ------------------------------------------------------------------------
    // Preconditions
    // ------------------------------------------------------------------------

    fn prepare(
        &self,
        entity_id: &str,
        file: &str,
        labels: LabelSet,
    ) -> Result<AnnotationPlan, SkipReason> {
        let checked = EntityId::parse(entity_id)
            .ok_or(SkipReason::MissingEntityId)
            .and_then(|entity_id| {
                let file = FileReference::parse(file).ok_or(SkipReason::MissingFile)?;
                self.check_guard()?;
                Ok((entity_id, file))
            });

        let (entity_id, file) = checked.map_err(|reason| self.skip(reason))?;
        let entity_id = match &self.entity_override {
            Some(sandbox) => {
                debug!(subject = %entity_id, target = %sandbox, "Redirecting edit");
                sandbox.clone()
            }
            None => entity_id,
        };

        Ok(AnnotationPlan {
            entity_id,
            file,
            labels,
            title: self.preferences.get_string(TITLE_KEY, ""),
        })
    }

    fn prepare_labels(
        &self,
        file: &str,
        labels: LabelSet,
    ) -> Result<(FileReference, LabelSet), SkipReason> {
        let checked = FileReference::parse(file)
            .ok_or(SkipReason::MissingFile)
            .and_then(|file| {
                if labels.is_empty() {
                    return Err(SkipReason::NoLabels);
                }
                self.check_guard()?;
                Ok(file)
            });

        let file = checked.map_err(|reason| self.skip(reason))?;
        Ok((file, labels))
    }

    fn check_guard(&self) -> Result<(), SkipReason> {
        if self.guard.allow() {
            Ok(())
        } else {
            Err(SkipReason::GuardDenied)
        }
    }

    fn skip(&self, reason: SkipReason) -> SkipReason {
        self.notifier.log(&EditEvent::Skipped {
            reason: reason.to_string(),
            timestamp: Utc::now(),
        });
        reason
    }

    // ------------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------------

    async fn execute(self, plan: AnnotationPlan) -> AnnotationReport {
        let AnnotationPlan {
            entity_id,
            file,
            labels,
            title,
        } = plan;

        let resolution = self.resolve_once(file.clone());

        let claim = spawn_background(self.clone().claim_chain(entity_id.clone(), file, title));
        let relation = spawn_background(self.clone().relation_chain(entity_id, resolution.clone()));
        let labels = spawn_background(self.label_chain(labels, resolution));

        let (claim, relation, labels) = tokio::join!(claim, relation, labels);

        AnnotationReport {
            skipped: None,
            claim: joined("claim", claim),
            relation: joined("relation", relation),
            labels: joined("labels", labels).unwrap_or_default(),
        }
    }

    async fn execute_labels(self, file: FileReference, labels: LabelSet) -> AnnotationReport {
        let resolution = self.resolve_once(file);
        let labels = spawn_background(self.label_chain(labels, resolution)).await;

        AnnotationReport {
            labels: joined("labels", labels).unwrap_or_default(),
            ..AnnotationReport::default()
        }
    }

    /// A lookup of the file's entity id, shared by every chain of a request.
    /// Nothing is sent until the first chain awaits it.
    fn resolve_once(&self, file: FileReference) -> Resolution {
        let gateway = Arc::clone(&self.gateway);
        let notifier = Arc::clone(&self.notifier);

        async move {
            match gateway.get_file_entity_id(&file).await {
                Ok(Some(file_entity_id)) => {
                    notifier.log(&EditEvent::FileEntityResolved {
                        file,
                        file_entity_id: file_entity_id.clone(),
                        timestamp: Utc::now(),
                    });
                    Ok(file_entity_id)
                }
                Ok(None) => {
                    notifier.log(&EditEvent::FileEntityMissing {
                        file: file.clone(),
                        timestamp: Utc::now(),
                    });
                    Err(EditError::Unresolved { file })
                }
                Err(e) => {
                    let error = EditError::transport("get_file_entity_id", e);
                    notifier.log(&EditEvent::FileEntityFailed {
                        file,
                        error: error.to_string(),
                        timestamp: Utc::now(),
                    });
                    Err(error)
                }
            }
        }
        .boxed()
        .shared()
    }

    // ------------------------------------------------------------------------
    // Claim chain
    // ------------------------------------------------------------------------

    async fn claim_chain(
        self,
        entity_id: EntityId,
        file: FileReference,
        title: String,
    ) -> StepOutcome {
        let result = self.create_and_tag(&entity_id, &file).await;

        let notifier = Arc::clone(&self.notifier);
        let listener = self.listener.clone();
        let succeeded = result.is_ok();
        let shown = self
            .foreground
            .run(move || {
                if succeeded {
                    notifier.notify_success(listener.as_deref());
                    notifier.notify_user_message(MessageKey::EditSuccess, &[title]);
                } else {
                    notifier.notify_user_message(MessageKey::EditFailure, &[]);
                }
            })
            .await;

        if let Err(e) = shown {
            error!(entity_id = %entity_id, error = %e, "Could not show edit outcome");
        }

        StepOutcome::from(result)
    }

    async fn create_and_tag(
        &self,
        entity_id: &EntityId,
        file: &FileReference,
    ) -> Result<RevisionId, EditError> {
        let value = file.property_value();

        let revision = match self
            .gateway
            .create_claim(entity_id, IMAGE_PROPERTY, &value)
            .await
        {
            Ok(revision) if revision.is_rejected() => {
                self.notifier.log(&EditEvent::ClaimRejected {
                    entity_id: entity_id.clone(),
                    timestamp: Utc::now(),
                });
                return Err(EditError::Rejected {
                    operation: "create_claim",
                });
            }
            Ok(revision) => {
                self.notifier.log(&EditEvent::ClaimCreated {
                    entity_id: entity_id.clone(),
                    revision,
                    timestamp: Utc::now(),
                });
                revision
            }
            Err(e) => {
                let error = EditError::transport("create_claim", e);
                self.notifier.log(&EditEvent::ClaimFailed {
                    entity_id: entity_id.clone(),
                    error: error.to_string(),
                    timestamp: Utc::now(),
                });
                return Err(error);
            }
        };

        let tagged = self
            .gateway
            .add_edit_tag(revision, &self.tag.name, &self.tag.reason)
            .await;

        match tagged {
            Ok(true) => {
                self.notifier.log(&EditEvent::EditTagged {
                    revision,
                    tag: self.tag.name.clone(),
                    timestamp: Utc::now(),
                });
                Ok(revision)
            }
            // The claim stands when the remote refuses the tag.
            Ok(false) => {
                self.tag_failed(revision, &EditError::TagRejected { revision });
                Ok(revision)
            }
            Err(e) => {
                let error = EditError::transport("add_edit_tag", e);
                self.tag_failed(revision, &error);
                Err(error)
            }
        }
    }

    fn tag_failed(&self, revision: RevisionId, error: &EditError) {
        self.notifier.log(&EditEvent::EditTagFailed {
            revision,
            tag: self.tag.name.clone(),
            error: error.to_string(),
            timestamp: Utc::now(),
        });
    }

    // ------------------------------------------------------------------------
    // Relation chain
    // ------------------------------------------------------------------------

    async fn relation_chain(self, entity_id: EntityId, resolution: Resolution) -> StepOutcome {
        let file_entity_id = match resolution.await {
            Ok(id) => id,
            Err(e) => return StepOutcome::failed(e),
        };

        let result = match self
            .gateway
            .set_entity_relation(&entity_id, &file_entity_id)
            .await
        {
            Ok(revision) if revision.is_rejected() => Err(EditError::Rejected {
                operation: "set_entity_relation",
            }),
            Ok(revision) => Ok(revision),
            Err(e) => Err(EditError::transport("set_entity_relation", e)),
        };

        let event = match &result {
            Ok(revision) => EditEvent::RelationSet {
                entity_id,
                file_entity_id,
                revision: *revision,
                timestamp: Utc::now(),
            },
            Err(error) => EditEvent::RelationFailed {
                entity_id,
                file_entity_id,
                error: error.to_string(),
                timestamp: Utc::now(),
            },
        };
        self.notifier.log(&event);

        StepOutcome::from(result)
    }

    // ------------------------------------------------------------------------
    // Label chain
    // ------------------------------------------------------------------------

    async fn label_chain(self, labels: LabelSet, resolution: Resolution) -> Vec<LabelResult> {
        if labels.is_empty() {
            return Vec::new();
        }

        let file_entity_id = match resolution.await {
            Ok(id) => id,
            Err(e) => {
                return labels
                    .into_iter()
                    .map(|label| LabelResult {
                        language: label.language,
                        outcome: StepOutcome::failed(e.clone()),
                    })
                    .collect();
            }
        };

        let mut writes = JoinSet::new();
        for label in labels {
            let gateway = Arc::clone(&self.gateway);
            let notifier = Arc::clone(&self.notifier);
            let file_entity_id = file_entity_id.clone();
            let auth_token = self.auth_token.clone();

            writes.spawn(async move {
                let result = match gateway
                    .set_entity_label(&file_entity_id, &auth_token, &label.language, &label.text)
                    .await
                {
                    Ok(revision) if revision.is_rejected() => Err(EditError::Rejected {
                        operation: "set_entity_label",
                    }),
                    Ok(revision) => Ok(revision),
                    Err(e) => Err(EditError::transport("set_entity_label", e)),
                };

                let event = match &result {
                    Ok(revision) => EditEvent::LabelSet {
                        file_entity_id,
                        language: label.language.clone(),
                        revision: *revision,
                        timestamp: Utc::now(),
                    },
                    Err(error) => EditEvent::LabelFailed {
                        file_entity_id,
                        language: label.language.clone(),
                        error: error.to_string(),
                        timestamp: Utc::now(),
                    },
                };
                notifier.log(&event);

                LabelResult {
                    language: label.language,
                    outcome: StepOutcome::from(result),
                }
            });
        }

        let mut results = Vec::with_capacity(writes.len());
        while let Some(joined) = writes.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => error!(error = %e, "Label write task failed"),
            }
        }

        let failed = results.iter().filter(|r| !r.outcome.is_done()).count();
        info!(
            file_entity_id = %file_entity_id,
            total = results.len(),
            failed,
            "Labels processed"
        );
        results
    }
}

fn joined<T>(chain: &'static str, result: Result<T, JoinError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            error!(chain, error = %e, "Annotation chain did not complete");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wikibase::GatewayError;

    #[test]
    fn test_step_outcome_serializes_error_text() {
        let outcome = StepOutcome::failed(EditError::Rejected {
            operation: "create_claim",
        });
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"], "rejected");
        assert_eq!(json["error"], "create_claim rejected by remote");
    }

    #[test]
    fn test_label_result_flattens_outcome() {
        let result = LabelResult {
            language: LanguageCode::new("fr"),
            outcome: StepOutcome::Done {
                revision: RevisionId::new(7),
            },
        };
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["language"], "fr");
        assert_eq!(json["status"], "done");
        assert_eq!(json["revision"], 7);
    }

    #[test]
    fn test_outcome_accessors() {
        let done = StepOutcome::from(Ok(RevisionId::new(3)));
        assert!(done.is_done());
        assert_eq!(done.revision(), Some(RevisionId::new(3)));
        assert!(done.error().is_none());

        let failed = StepOutcome::from(Err(EditError::transport(
            "create_claim",
            GatewayError::MissingField("pageinfo"),
        )));
        assert!(!failed.is_done());
        assert_eq!(failed.error().map(EditError::kind), Some("transport"));
    }

    #[test]
    fn test_skipped_report_omits_chains() {
        let report = AnnotationReport::skipped(SkipReason::GuardDenied);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["skipped"], "guard_denied");
        assert!(json.get("claim").is_none());
        assert!(json.get("relation").is_none());
        assert_eq!(json["labels"], serde_json::json!([]));
    }
}
