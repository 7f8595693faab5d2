use std::future::Future;
use std::pin::Pin;

use uuid::Uuid;

use crate::error::Result;
use crate::model::{Document, WorkflowStep};

/// Persistence contract for documents.
///
/// The workflow engine is the only writer of document status; all other
/// components read.
pub trait DocumentStore: Send + Sync {
    /// Fetch a document by ID.
    fn get(&self, id: Uuid) -> Pin<Box<dyn Future<Output = Result<Option<Document>>> + Send + '_>>;

    /// Insert a new document.
    fn insert(&self, document: Document) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Persist the mutable fields of an existing document.
    fn save(&self, document: Document) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Remove a document. Callers enforce the fully-pending gate before
    /// deleting; step removal cascades.
    fn delete(&self, id: Uuid) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Documents uploaded by a user, newest first.
    fn list_for_owner(
        &self,
        owner_id: Uuid,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Document>>> + Send + '_>>;
}

/// Persistence contract for workflow steps.
pub trait WorkflowStore: Send + Sync {
    /// Insert a document's steps as one atomic set: either all land or
    /// none do. A partial chain is an invariant violation.
    fn insert_chain(
        &self,
        steps: Vec<WorkflowStep>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Fetch a step by ID.
    fn get_step(
        &self,
        id: Uuid,
    ) -> Pin<Box<dyn Future<Output = Result<Option<WorkflowStep>>> + Send + '_>>;

    /// Persist the mutable fields of an existing step.
    fn save_step(
        &self,
        step: WorkflowStep,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// All steps of a document, in sequence order.
    fn steps_for_document(
        &self,
        document_id: Uuid,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<WorkflowStep>>> + Send + '_>>;

    /// Steps awaiting a reviewer's decision.
    fn pending_steps_for_reviewer(
        &self,
        reviewer_id: Uuid,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<WorkflowStep>>> + Send + '_>>;

    /// Remove a document's steps (document deletion cascade).
    fn delete_for_document(
        &self,
        document_id: Uuid,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}
