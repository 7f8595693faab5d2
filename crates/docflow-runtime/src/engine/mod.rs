//! The workflow engine: creates review chains, applies reviewer
//! decisions, and derives each document's aggregate status from its
//! steps.
//!
//! The engine is the only writer of step and document status. Aggregate
//! status is never patched incrementally; it is re-derived from the
//! full step set after every transition by a stateless reducer, so the
//! persisted value cannot drift from the steps.

mod locks;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use docflow_core::chain::ChainSpec;
use docflow_core::directory::ReviewerDirectory;
use docflow_core::error::{DocflowError, Result};
use docflow_core::model::{Decision, Document, DocumentStatus, StepStatus, WorkflowStep};
use docflow_core::notify::Notification;
use docflow_core::store::{DocumentStore, WorkflowStore};

use crate::audit::AuditRecorder;
use crate::notify::NotifierHandle;

use locks::DocumentLocks;

/// Document comment used when a rejecting reviewer left none.
pub const DEFAULT_REJECTION_COMMENT: &str = "Document rejected";

/// Aggregate outcome of a step set.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChainOutcome {
    /// At least one step is rejected; carries the derived comment.
    Rejected { comment: String },
    /// Every step is approved.
    Approved,
    /// Still waiting on at least one reviewer.
    Pending,
}

/// Reduce a step set to its aggregate outcome.
///
/// A single rejection dominates regardless of the other steps. The
/// derived comment is the first rejected step's non-empty comment in
/// sequence order, falling back to [`DEFAULT_REJECTION_COMMENT`].
/// Callers pass steps in sequence order.
fn reduce_status(steps: &[WorkflowStep]) -> ChainOutcome {
    if steps.iter().any(|s| s.status == StepStatus::Rejected) {
        let comment = steps
            .iter()
            .filter(|s| s.status == StepStatus::Rejected)
            .filter_map(|s| s.comment.as_deref())
            .map(str::trim)
            .find(|c| !c.is_empty())
            .unwrap_or(DEFAULT_REJECTION_COMMENT)
            .to_string();

        return ChainOutcome::Rejected { comment };
    }

    if !steps.is_empty() && steps.iter().all(|s| s.status == StepStatus::Approved) {
        return ChainOutcome::Approved;
    }

    ChainOutcome::Pending
}

/// Creates review chains and applies reviewer decisions.
pub struct WorkflowEngine {
    documents: Arc<dyn DocumentStore>,
    steps: Arc<dyn WorkflowStore>,
    directory: Arc<dyn ReviewerDirectory>,
    notifier: NotifierHandle,
    audit: AuditRecorder,
    chain: ChainSpec,
    locks: DocumentLocks,
}

impl WorkflowEngine {
    /// Create an engine over the given collaborators.
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        steps: Arc<dyn WorkflowStore>,
        directory: Arc<dyn ReviewerDirectory>,
        notifier: NotifierHandle,
        audit: AuditRecorder,
        chain: ChainSpec,
    ) -> Self {
        Self {
            documents,
            steps,
            directory,
            notifier,
            audit,
            chain,
            locks: DocumentLocks::new(),
        }
    }

    /// The chain this engine instantiates for new documents.
    pub fn chain(&self) -> &ChainSpec {
        &self.chain
    }

    /// Create the review chain for a freshly persisted document.
    ///
    /// Resolves one reviewer per chain role; any unstaffed role fails
    /// the whole call with [`DocflowError::RoleUnassigned`] before
    /// anything is persisted. The steps land as one atomic set, then
    /// the first stage's reviewer is notified (best-effort).
    pub async fn create_chain(&self, document: &Document) -> Result<Vec<WorkflowStep>> {
        let existing = self.steps.steps_for_document(document.id).await?;
        if !existing.is_empty() {
            return Err(DocflowError::Internal(format!(
                "document {} already has a review chain",
                document.id
            )));
        }

        let mut steps = Vec::with_capacity(self.chain.len());
        for (sequence, role) in self.chain.roles().iter().enumerate() {
            let reviewer = self
                .directory
                .find_reviewer(*role)
                .await?
                .ok_or(DocflowError::RoleUnassigned { role: *role })?;

            steps.push(WorkflowStep::new(
                document.id,
                *role,
                sequence as i32,
                reviewer,
            ));
        }

        self.steps.insert_chain(steps.clone()).await?;

        info!(
            document_id = %document.id,
            stages = steps.len(),
            "Review chain created"
        );

        if let Some(first) = steps.first() {
            self.notifier
                .notify(Notification::ReviewRequested {
                    reviewer: first.reviewer.clone(),
                    document_title: document.title.clone(),
                    uploader_name: document.owner.name.clone(),
                })
                .await;
        }

        Ok(steps)
    }

    /// Apply a reviewer's decision to a step.
    ///
    /// The whole unit (load step, record decision, recompute the
    /// document's aggregate status, persist both) runs under the
    /// document's update scope, so concurrent decisions on steps of the
    /// same document serialize. Audit and notification side effects are
    /// best-effort and never fail the call; persistence failures abort
    /// it with no partial writes observable to the caller.
    pub async fn apply_decision(
        &self,
        step_id: Uuid,
        decision: Decision,
        comment: Option<String>,
    ) -> Result<WorkflowStep> {
        // The document is only known after a first read; take the lock
        // on its id, then re-read the step inside the scope so a racing
        // decision can't slip between the two.
        let step = self
            .steps
            .get_step(step_id)
            .await?
            .ok_or(DocflowError::StepNotFound(step_id))?;

        let _scope = self.locks.acquire(step.document_id).await;

        let mut step = self
            .steps
            .get_step(step_id)
            .await?
            .ok_or(DocflowError::StepNotFound(step_id))?;

        let mut document = self
            .documents
            .get(step.document_id)
            .await?
            .ok_or(DocflowError::DocumentNotFound(step.document_id))?;

        let now = Utc::now();
        step.decide(decision, comment, now)?;
        self.steps.save_step(step.clone()).await?;

        debug!(
            step_id = %step.id,
            document_id = %document.id,
            decision = %decision,
            "Step decided"
        );

        self.audit.document_reviewed(&document, &step).await;

        self.notifier
            .notify(Notification::StatusChanged {
                owner: document.owner.clone(),
                document_title: document.title.clone(),
                decision,
            })
            .await;

        let steps = self.steps.steps_for_document(document.id).await?;

        if decision == Decision::Approved {
            self.advance_chain(&document, &steps).await;
        }

        // Re-derive the aggregate status from the full step set. This
        // also covers the rejection short-circuit: one rejected step
        // turns the document Rejected no matter what the rest say.
        if self.recompute_document(&mut document, &steps, now).await {
            self.documents.save(document.clone()).await?;

            info!(
                document_id = %document.id,
                status = %document.status,
                "Document status updated"
            );
        }

        Ok(step)
    }

    /// Notify the next pending stage's reviewer, if any remains.
    async fn advance_chain(&self, document: &Document, steps: &[WorkflowStep]) {
        let next = steps.iter().find(|s| s.status == StepStatus::Pending);

        if let Some(next) = next {
            self.notifier
                .notify(Notification::ReviewRequested {
                    reviewer: next.reviewer.clone(),
                    document_title: document.title.clone(),
                    uploader_name: document.owner.name.clone(),
                })
                .await;
        }
    }

    /// Fold the step set into the document's aggregate status.
    ///
    /// Returns whether the document changed and needs persisting. Safe
    /// to run any number of times: once terminal, the status and
    /// timestamp never move again, and an unchanged input produces no
    /// write. The derived rejection comment may still be refreshed when
    /// a later decision changes which step rejects first in sequence.
    async fn recompute_document(
        &self,
        document: &mut Document,
        steps: &[WorkflowStep],
        now: DateTime<Utc>,
    ) -> bool {
        match reduce_status(steps) {
            ChainOutcome::Rejected { comment } => match document.status {
                DocumentStatus::Pending => {
                    document.reject(comment, now);
                    true
                }
                DocumentStatus::Rejected => {
                    if document.comment.as_deref() != Some(comment.as_str()) {
                        document.comment = Some(comment);
                        true
                    } else {
                        false
                    }
                }
                // Unreachable while steps are one-shot: an approved
                // document has no step left to reject.
                DocumentStatus::Approved => false,
            },
            ChainOutcome::Approved => {
                if document.status == DocumentStatus::Pending {
                    document.approve(now);

                    self.notifier
                        .notify(Notification::FullyApproved {
                            owner: document.owner.clone(),
                            document_title: document.title.clone(),
                        })
                        .await;

                    true
                } else {
                    false
                }
            }
            ChainOutcome::Pending => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use docflow_core::model::{ReviewRole, UserRef};
    use docflow_core::progress::ReviewProgress;

    use crate::audit::MemoryAuditSink;
    use crate::directory::StaticDirectory;
    use crate::notify::RecordingSender;
    use crate::store::{MemoryDocumentStore, MemoryWorkflowStore};

    use super::*;

    struct Fixture {
        engine: Arc<WorkflowEngine>,
        documents: MemoryDocumentStore,
        steps: MemoryWorkflowStore,
        sender: RecordingSender,
        audit: MemoryAuditSink,
        officer: UserRef,
        manager: UserRef,
        admin: UserRef,
        owner: UserRef,
    }

    fn user(name: &str) -> UserRef {
        UserRef::new(Uuid::new_v4(), name, format!("{}@example.com", name))
    }

    fn fixture() -> Fixture {
        let documents = MemoryDocumentStore::new();
        let steps = MemoryWorkflowStore::new();
        let sender = RecordingSender::new();
        let audit = MemoryAuditSink::new();

        let officer = user("officer");
        let manager = user("manager");
        let admin = user("admin");

        let directory = StaticDirectory::new()
            .with_reviewer(ReviewRole::Officer, officer.clone())
            .with_reviewer(ReviewRole::Manager, manager.clone())
            .with_reviewer(ReviewRole::Admin, admin.clone());

        let engine = WorkflowEngine::new(
            Arc::new(documents.clone()),
            Arc::new(steps.clone()),
            Arc::new(directory),
            NotifierHandle::direct(Arc::new(sender.clone())),
            AuditRecorder::new(Arc::new(audit.clone())),
            ChainSpec::default(),
        );

        Fixture {
            engine: Arc::new(engine),
            documents,
            steps,
            sender,
            audit,
            officer,
            manager,
            admin,
            owner: user("sam"),
        }
    }

    async fn upload(fx: &Fixture) -> (Document, Vec<WorkflowStep>) {
        let document = Document::new("Q3 report", "uploads/q3.pdf", fx.owner.clone());
        fx.documents.insert(document.clone()).await.unwrap();
        let steps = fx.engine.create_chain(&document).await.unwrap();
        (document, steps)
    }

    fn review_requests_for<'a>(
        sent: &'a [Notification],
        reviewer: &UserRef,
    ) -> Vec<&'a Notification> {
        sent.iter()
            .filter(|n| {
                matches!(n, Notification::ReviewRequested { reviewer: r, .. } if r.id == reviewer.id)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_chain_creation() {
        let fx = fixture();
        let (document, steps) = upload(&fx).await;

        assert_eq!(steps.len(), 3);
        assert!(steps.iter().all(|s| s.status == StepStatus::Pending));
        assert!(steps.iter().all(|s| s.document_id == document.id));
        assert_eq!(
            steps.iter().map(|s| s.sequence).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(steps[0].reviewer.id, fx.officer.id);
        assert_eq!(steps[1].reviewer.id, fx.manager.id);
        assert_eq!(steps[2].reviewer.id, fx.admin.id);

        // Exactly one notification, addressed to the first stage.
        let sent = fx.sender.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(review_requests_for(&sent, &fx.officer).len(), 1);
        assert!(review_requests_for(&sent, &fx.manager).is_empty());
    }

    #[tokio::test]
    async fn test_unstaffed_role_creates_nothing() {
        let fx = fixture();
        let directory = StaticDirectory::new()
            .with_reviewer(ReviewRole::Officer, fx.officer.clone())
            .with_reviewer(ReviewRole::Admin, fx.admin.clone());
        let engine = WorkflowEngine::new(
            Arc::new(fx.documents.clone()),
            Arc::new(fx.steps.clone()),
            Arc::new(directory),
            NotifierHandle::direct(Arc::new(fx.sender.clone())),
            AuditRecorder::new(Arc::new(fx.audit.clone())),
            ChainSpec::default(),
        );

        let document = Document::new("Q3 report", "uploads/q3.pdf", fx.owner.clone());
        fx.documents.insert(document.clone()).await.unwrap();

        let err = engine.create_chain(&document).await.unwrap_err();
        assert!(
            matches!(err, DocflowError::RoleUnassigned { role } if role == ReviewRole::Manager)
        );

        // No partial chain, no notification.
        assert!(fx
            .steps
            .steps_for_document(document.id)
            .await
            .unwrap()
            .is_empty());
        assert!(fx.sender.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_chain_is_refused() {
        let fx = fixture();
        let (document, _) = upload(&fx).await;
        assert!(fx.engine.create_chain(&document).await.is_err());
    }

    #[tokio::test]
    async fn test_approval_notifies_next_stage_only() {
        let fx = fixture();
        let (document, steps) = upload(&fx).await;

        fx.engine
            .apply_decision(steps[0].id, Decision::Approved, None)
            .await
            .unwrap();

        let sent = fx.sender.sent().await;
        assert_eq!(review_requests_for(&sent, &fx.manager).len(), 1);
        assert!(review_requests_for(&sent, &fx.admin).is_empty());

        // Owner heard about the stage change.
        assert!(sent.iter().any(|n| matches!(
            n,
            Notification::StatusChanged { owner, decision: Decision::Approved, .. }
                if owner.id == fx.owner.id
        )));

        // One approval does not move the aggregate status.
        let document = fx.documents.get(document.id).await.unwrap().unwrap();
        assert_eq!(document.status, DocumentStatus::Pending);
    }

    #[tokio::test]
    async fn test_unanimous_approval() {
        let fx = fixture();
        let (document, steps) = upload(&fx).await;

        for step in &steps {
            fx.engine
                .apply_decision(step.id, Decision::Approved, None)
                .await
                .unwrap();
        }

        let document = fx.documents.get(document.id).await.unwrap().unwrap();
        assert_eq!(document.status, DocumentStatus::Approved);
        assert!(document.reviewed_at.is_some());
        assert!(document.comment.is_none());

        let sent = fx.sender.sent().await;
        assert!(sent.iter().any(|n| matches!(
            n,
            Notification::FullyApproved { owner, .. } if owner.id == fx.owner.id
        )));

        // The document record was written exactly once: the first two
        // approvals leave the aggregate pending, the last one lands it.
        assert_eq!(fx.documents.save_count(), 1);
    }

    #[tokio::test]
    async fn test_single_rejection_dominates() {
        let fx = fixture();
        let (document, steps) = upload(&fx).await;

        fx.engine
            .apply_decision(steps[0].id, Decision::Approved, None)
            .await
            .unwrap();
        fx.engine
            .apply_decision(steps[1].id, Decision::Rejected, Some("missing figures".into()))
            .await
            .unwrap();

        let document = fx.documents.get(document.id).await.unwrap().unwrap();
        assert_eq!(document.status, DocumentStatus::Rejected);
        assert_eq!(document.comment.as_deref(), Some("missing figures"));
        assert!(document.reviewed_at.is_some());

        // The admin step is left pending, not auto-cancelled.
        let steps = fx.steps.steps_for_document(document.id).await.unwrap();
        assert_eq!(steps[2].status, StepStatus::Pending);
        assert_eq!(fx.documents.save_count(), 1);
    }

    #[tokio::test]
    async fn test_first_stage_rejection_short_circuits() {
        let fx = fixture();
        let (document, steps) = upload(&fx).await;

        fx.engine
            .apply_decision(steps[0].id, Decision::Rejected, Some("wrong template".into()))
            .await
            .unwrap();

        let document = fx.documents.get(document.id).await.unwrap().unwrap();
        assert_eq!(document.status, DocumentStatus::Rejected);
        assert_eq!(document.comment.as_deref(), Some("wrong template"));
    }

    #[tokio::test]
    async fn test_rejection_without_comment_uses_default() {
        let fx = fixture();
        let (document, steps) = upload(&fx).await;

        fx.engine
            .apply_decision(steps[0].id, Decision::Rejected, None)
            .await
            .unwrap();

        let document = fx.documents.get(document.id).await.unwrap().unwrap();
        assert_eq!(document.comment.as_deref(), Some(DEFAULT_REJECTION_COMMENT));
    }

    #[tokio::test]
    async fn test_re_decision_is_a_conflict() {
        let fx = fixture();
        let (document, steps) = upload(&fx).await;

        fx.engine
            .apply_decision(steps[0].id, Decision::Approved, Some("fine".into()))
            .await
            .unwrap();

        let err = fx
            .engine
            .apply_decision(steps[0].id, Decision::Rejected, Some("changed my mind".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, DocflowError::AlreadyDecided { step_id } if step_id == steps[0].id));

        // The stored decision and the aggregate status are untouched.
        let stored = fx.steps.get_step(steps[0].id).await.unwrap().unwrap();
        assert_eq!(stored.status, StepStatus::Approved);
        assert_eq!(stored.comment.as_deref(), Some("fine"));

        let document = fx.documents.get(document.id).await.unwrap().unwrap();
        assert_eq!(document.status, DocumentStatus::Pending);
    }

    #[tokio::test]
    async fn test_terminal_document_never_returns_to_pending() {
        let fx = fixture();
        let (document, steps) = upload(&fx).await;

        fx.engine
            .apply_decision(steps[0].id, Decision::Rejected, Some("incomplete".into()))
            .await
            .unwrap();

        // Later stages may still decide; the document stays rejected.
        fx.engine
            .apply_decision(steps[1].id, Decision::Approved, None)
            .await
            .unwrap();
        fx.engine
            .apply_decision(steps[2].id, Decision::Approved, None)
            .await
            .unwrap();

        let document = fx.documents.get(document.id).await.unwrap().unwrap();
        assert_eq!(document.status, DocumentStatus::Rejected);
        assert_eq!(document.comment.as_deref(), Some("incomplete"));

        let steps = fx.steps.steps_for_document(document.id).await.unwrap();
        assert_eq!(
            ReviewProgress::for_document(&document, &steps).percent,
            100
        );
    }

    #[tokio::test]
    async fn test_notifier_failure_never_fails_the_transition() {
        let fx = fixture();
        let (document, steps) = upload(&fx).await;

        fx.sender.fail(true);

        fx.engine
            .apply_decision(steps[0].id, Decision::Approved, None)
            .await
            .unwrap();

        let stored = fx.steps.get_step(steps[0].id).await.unwrap().unwrap();
        assert_eq!(stored.status, StepStatus::Approved);

        // And a full run still lands the terminal status.
        fx.engine
            .apply_decision(steps[1].id, Decision::Approved, None)
            .await
            .unwrap();
        fx.engine
            .apply_decision(steps[2].id, Decision::Approved, None)
            .await
            .unwrap();
        let document = fx.documents.get(document.id).await.unwrap().unwrap();
        assert_eq!(document.status, DocumentStatus::Approved);
    }

    #[tokio::test]
    async fn test_unknown_step_is_not_found() {
        let fx = fixture();
        let err = fx
            .engine
            .apply_decision(Uuid::new_v4(), Decision::Approved, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DocflowError::StepNotFound(_)));
    }

    #[tokio::test]
    async fn test_decision_is_audited() {
        let fx = fixture();
        let (document, steps) = upload(&fx).await;

        fx.engine
            .apply_decision(steps[1].id, Decision::Approved, None)
            .await
            .unwrap();

        let entries = fx.audit.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entity_id, Some(document.id));
        assert_eq!(entries[0].actor_email, fx.manager.email);
    }

    #[tokio::test]
    async fn test_concurrent_approvals_all_land() {
        let fx = fixture();
        let (document, steps) = upload(&fx).await;

        let (a, b, c) = tokio::join!(
            fx.engine
                .apply_decision(steps[0].id, Decision::Approved, None),
            fx.engine
                .apply_decision(steps[1].id, Decision::Approved, None),
            fx.engine
                .apply_decision(steps[2].id, Decision::Approved, None),
        );
        a.unwrap();
        b.unwrap();
        c.unwrap();

        // All three decisions are reflected before the terminal
        // transition fires; none is lost to interleaving.
        let document = fx.documents.get(document.id).await.unwrap().unwrap();
        assert_eq!(document.status, DocumentStatus::Approved);
        assert_eq!(fx.documents.save_count(), 1);
    }

    #[test]
    fn test_reducer_all_pending_approved_combinations() {
        let owner = user("sam");
        let document = Document::new("Q3 report", "uploads/q3.pdf", owner);

        // Without a rejection, only three approvals reach Approved.
        for bits in 0..8u32 {
            let mut steps = vec![
                WorkflowStep::new(document.id, ReviewRole::Officer, 0, user("officer")),
                WorkflowStep::new(document.id, ReviewRole::Manager, 1, user("manager")),
                WorkflowStep::new(document.id, ReviewRole::Admin, 2, user("admin")),
            ];
            let mut approvals = 0;
            for (i, step) in steps.iter_mut().enumerate() {
                if bits & (1 << i) != 0 {
                    step.decide(Decision::Approved, None, Utc::now()).unwrap();
                    approvals += 1;
                }
            }

            let outcome = reduce_status(&steps);
            if approvals == 3 {
                assert_eq!(outcome, ChainOutcome::Approved);
            } else {
                assert_eq!(outcome, ChainOutcome::Pending);
            }
        }
    }

    #[test]
    fn test_reducer_any_rejection_dominates() {
        let document_id = Uuid::new_v4();
        for rejected_at in 0..3usize {
            for other_status in [StepStatus::Pending, StepStatus::Approved] {
                let mut steps = vec![
                    WorkflowStep::new(document_id, ReviewRole::Officer, 0, user("officer")),
                    WorkflowStep::new(document_id, ReviewRole::Manager, 1, user("manager")),
                    WorkflowStep::new(document_id, ReviewRole::Admin, 2, user("admin")),
                ];
                for (i, step) in steps.iter_mut().enumerate() {
                    if i == rejected_at {
                        step.decide(Decision::Rejected, Some("no".into()), Utc::now())
                            .unwrap();
                    } else if other_status == StepStatus::Approved {
                        step.decide(Decision::Approved, None, Utc::now()).unwrap();
                    }
                }

                assert_eq!(
                    reduce_status(&steps),
                    ChainOutcome::Rejected {
                        comment: "no".to_string()
                    }
                );
            }
        }
    }

    #[test]
    fn test_reducer_takes_first_rejected_comment_in_sequence_order() {
        let document_id = Uuid::new_v4();
        let mut steps = vec![
            WorkflowStep::new(document_id, ReviewRole::Officer, 0, user("officer")),
            WorkflowStep::new(document_id, ReviewRole::Manager, 1, user("manager")),
        ];
        steps[0]
            .decide(Decision::Rejected, Some("  ".into()), Utc::now())
            .unwrap();
        steps[1]
            .decide(Decision::Rejected, Some("bad formatting".into()), Utc::now())
            .unwrap();

        // Blank comments are skipped when deriving the document comment.
        assert_eq!(
            reduce_status(&steps),
            ChainOutcome::Rejected {
                comment: "bad formatting".to_string()
            }
        );
    }

    #[test]
    fn test_reducer_is_a_pure_fixed_point() {
        let document_id = Uuid::new_v4();
        let mut steps = vec![WorkflowStep::new(
            document_id,
            ReviewRole::Officer,
            0,
            user("officer"),
        )];
        steps[0]
            .decide(Decision::Rejected, Some("no".into()), Utc::now())
            .unwrap();

        assert_eq!(reduce_status(&steps), reduce_status(&steps));
    }
}
