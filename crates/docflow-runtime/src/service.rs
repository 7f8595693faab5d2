//! Uploader-facing document operations around the workflow engine.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use docflow_core::error::{DocflowError, Result};
use docflow_core::model::{Document, DocumentStatus, StepStatus, UserRef, WorkflowStep};
use docflow_core::progress::ReviewProgress;
use docflow_core::store::{DocumentStore, WorkflowStore};

use crate::audit::AuditRecorder;
use crate::engine::WorkflowEngine;

/// Input for a document upload. The file itself is already in storage;
/// only its opaque reference travels through here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    pub storage_ref: String,
    pub owner: UserRef,
}

/// A document together with its review progress, the read projection
/// handed to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOverview {
    pub document: Document,
    pub progress: ReviewProgress,
}

/// Document lifecycle operations: upload, lookup, deletion, and the
/// read projections callers consume. Decisions go through
/// [`WorkflowEngine::apply_decision`] directly.
pub struct DocumentService {
    documents: Arc<dyn DocumentStore>,
    steps: Arc<dyn WorkflowStore>,
    engine: Arc<WorkflowEngine>,
    audit: AuditRecorder,
}

impl DocumentService {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        steps: Arc<dyn WorkflowStore>,
        engine: Arc<WorkflowEngine>,
        audit: AuditRecorder,
    ) -> Self {
        Self {
            documents,
            steps,
            engine,
            audit,
        }
    }

    /// Persist a new pending document and instantiate its review chain.
    ///
    /// When chain creation fails (an unstaffed role, a store failure),
    /// the just-inserted document is removed again so no chain-less
    /// document survives.
    pub async fn create_document(&self, new: NewDocument) -> Result<Document> {
        let document = Document::new(new.title, new.storage_ref, new.owner);
        self.documents.insert(document.clone()).await?;

        if let Err(e) = self.engine.create_chain(&document).await {
            if let Err(cleanup) = self.documents.delete(document.id).await {
                warn!(
                    document_id = %document.id,
                    error = %cleanup,
                    "Failed to remove document after chain creation failure"
                );
            }
            return Err(e);
        }

        self.audit.document_uploaded(&document).await;

        info!(document_id = %document.id, title = %document.title, "Document created");
        Ok(document)
    }

    /// Fetch a document by ID.
    pub async fn get_document(&self, id: Uuid) -> Result<Document> {
        self.documents
            .get(id)
            .await?
            .ok_or(DocflowError::DocumentNotFound(id))
    }

    /// Documents uploaded by a user, newest first.
    pub async fn documents_for_owner(&self, owner_id: Uuid) -> Result<Vec<Document>> {
        self.documents.list_for_owner(owner_id).await
    }

    /// A document's steps in chain order.
    pub async fn list_steps(&self, document_id: Uuid) -> Result<Vec<WorkflowStep>> {
        // Surface missing documents as not-found rather than an empty
        // chain.
        self.get_document(document_id).await?;
        self.steps.steps_for_document(document_id).await
    }

    /// Steps waiting on a reviewer's decision.
    pub async fn pending_reviews(&self, reviewer_id: Uuid) -> Result<Vec<WorkflowStep>> {
        self.steps.pending_steps_for_reviewer(reviewer_id).await
    }

    /// Document plus progress projection.
    pub async fn document_overview(&self, document_id: Uuid) -> Result<DocumentOverview> {
        let document = self.get_document(document_id).await?;
        let steps = self.steps.steps_for_document(document_id).await?;

        let progress = ReviewProgress::for_document(&document, &steps);
        Ok(DocumentOverview { document, progress })
    }

    /// Delete a document.
    ///
    /// Only allowed while the document and every step are still
    /// pending; any recorded decision blocks deletion for good.
    pub async fn delete_document(&self, document_id: Uuid) -> Result<()> {
        let document = self.get_document(document_id).await?;
        let steps = self.steps.steps_for_document(document_id).await?;

        let untouched = document.status == DocumentStatus::Pending
            && steps.iter().all(|s| s.status == StepStatus::Pending);
        if !untouched {
            return Err(DocflowError::DeleteBlocked(document_id));
        }

        self.steps.delete_for_document(document_id).await?;
        self.documents.delete(document_id).await?;

        self.audit.document_deleted(&document).await;

        info!(document_id = %document_id, "Document deleted");
        Ok(())
    }
}
