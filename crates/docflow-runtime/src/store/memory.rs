//! In-memory stores for tests and embedded deployments.
//!
//! Write counters are exposed so tests can assert that recomputation is
//! a fixed point (no writes beyond the first).

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use docflow_core::error::{DocflowError, Result};
use docflow_core::model::{Document, StepStatus, WorkflowStep};
use docflow_core::store::{DocumentStore, WorkflowStore};

/// In-memory document store.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    documents: Arc<RwLock<HashMap<Uuid, Document>>>,
    saves: Arc<AtomicUsize>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `save` calls observed.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, id: Uuid) -> Pin<Box<dyn Future<Output = Result<Option<Document>>> + Send + '_>> {
        Box::pin(async move { Ok(self.documents.read().await.get(&id).cloned()) })
    }

    fn insert(&self, document: Document) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let mut documents = self.documents.write().await;
            if documents.contains_key(&document.id) {
                return Err(DocflowError::Internal(format!(
                    "document {} already exists",
                    document.id
                )));
            }
            documents.insert(document.id, document);
            Ok(())
        })
    }

    fn save(&self, document: Document) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let mut documents = self.documents.write().await;
            if !documents.contains_key(&document.id) {
                return Err(DocflowError::DocumentNotFound(document.id));
            }
            self.saves.fetch_add(1, Ordering::SeqCst);
            documents.insert(document.id, document);
            Ok(())
        })
    }

    fn delete(&self, id: Uuid) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.documents.write().await.remove(&id);
            Ok(())
        })
    }

    fn list_for_owner(
        &self,
        owner_id: Uuid,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Document>>> + Send + '_>> {
        Box::pin(async move {
            let mut documents: Vec<Document> = self
                .documents
                .read()
                .await
                .values()
                .filter(|d| d.owner.id == owner_id)
                .cloned()
                .collect();
            documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(documents)
        })
    }
}

/// In-memory workflow step store.
#[derive(Clone, Default)]
pub struct MemoryWorkflowStore {
    steps: Arc<RwLock<HashMap<Uuid, WorkflowStep>>>,
    saves: Arc<AtomicUsize>,
}

impl MemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `save_step` calls observed.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl WorkflowStore for MemoryWorkflowStore {
    fn insert_chain(
        &self,
        steps: Vec<WorkflowStep>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let mut stored = self.steps.write().await;
            // All-or-nothing: validate before the first write.
            for step in &steps {
                if stored.contains_key(&step.id) {
                    return Err(DocflowError::Internal(format!(
                        "step {} already exists",
                        step.id
                    )));
                }
            }
            for step in steps {
                stored.insert(step.id, step);
            }
            Ok(())
        })
    }

    fn get_step(
        &self,
        id: Uuid,
    ) -> Pin<Box<dyn Future<Output = Result<Option<WorkflowStep>>> + Send + '_>> {
        Box::pin(async move { Ok(self.steps.read().await.get(&id).cloned()) })
    }

    fn save_step(
        &self,
        step: WorkflowStep,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let mut steps = self.steps.write().await;
            if !steps.contains_key(&step.id) {
                return Err(DocflowError::StepNotFound(step.id));
            }
            self.saves.fetch_add(1, Ordering::SeqCst);
            steps.insert(step.id, step);
            Ok(())
        })
    }

    fn steps_for_document(
        &self,
        document_id: Uuid,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<WorkflowStep>>> + Send + '_>> {
        Box::pin(async move {
            let mut steps: Vec<WorkflowStep> = self
                .steps
                .read()
                .await
                .values()
                .filter(|s| s.document_id == document_id)
                .cloned()
                .collect();
            steps.sort_by_key(|s| s.sequence);
            Ok(steps)
        })
    }

    fn pending_steps_for_reviewer(
        &self,
        reviewer_id: Uuid,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<WorkflowStep>>> + Send + '_>> {
        Box::pin(async move {
            let mut steps: Vec<WorkflowStep> = self
                .steps
                .read()
                .await
                .values()
                .filter(|s| s.reviewer.id == reviewer_id && s.status == StepStatus::Pending)
                .cloned()
                .collect();
            steps.sort_by_key(|s| s.created_at);
            Ok(steps)
        })
    }

    fn delete_for_document(
        &self,
        document_id: Uuid,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.steps
                .write()
                .await
                .retain(|_, s| s.document_id != document_id);
            Ok(())
        })
    }
}
