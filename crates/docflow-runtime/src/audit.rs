//! Audit trail recording.
//!
//! The recorder is a best-effort side channel: sink failures are logged
//! and swallowed, never propagated, and never roll back a committed
//! transition.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::RwLock;

use docflow_core::audit::AuditSink;
use docflow_core::error::Result;
use docflow_core::model::{AuditAction, AuditEntry, Document, WorkflowStep};

/// PostgreSQL-backed audit sink.
#[derive(Clone)]
pub struct PgAuditSink {
    pool: PgPool,
}

impl PgAuditSink {
    /// Create a new audit sink.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AuditSink for PgAuditSink {
    fn record(&self, entry: AuditEntry) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            sqlx::query(
                r#"
                INSERT INTO docflow_audit_log (
                    id, action, entity_type, entity_id, actor_email, actor_name,
                    details, recorded_at
                ) VALUES (
                    $1, $2, $3, $4, $5, $6, $7, $8
                )
                "#,
            )
            .bind(entry.id)
            .bind(entry.action.as_str())
            .bind(&entry.entity_type)
            .bind(entry.entity_id)
            .bind(&entry.actor_email)
            .bind(&entry.actor_name)
            .bind(&entry.details)
            .bind(entry.recorded_at)
            .execute(&self.pool)
            .await?;

            Ok(())
        })
    }
}

/// In-memory audit sink for tests.
#[derive(Clone, Default)]
pub struct MemoryAuditSink {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries recorded so far.
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, entry: AuditEntry) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.entries.write().await.push(entry);
            Ok(())
        })
    }
}

/// Builds audit entries for workflow events and records them,
/// swallowing sink failures.
#[derive(Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
}

const ENTITY_DOCUMENT: &str = "document";

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Record a document upload, attributed to the owner.
    pub async fn document_uploaded(&self, document: &Document) {
        let entry = AuditEntry::new(
            AuditAction::DocumentUploaded,
            ENTITY_DOCUMENT,
            Some(document.id),
            &document.owner.email,
            &document.owner.name,
            format!("Document uploaded: {}", document.title),
        );
        self.record(entry).await;
    }

    /// Record a step decision, attributed to the deciding reviewer.
    pub async fn document_reviewed(&self, document: &Document, step: &WorkflowStep) {
        let mut details = format!("Document reviewed with status {}", step.status.as_str());
        if let Some(comment) = step.comment.as_deref().filter(|c| !c.is_empty()) {
            details.push_str(". Comment: ");
            details.push_str(comment);
        }

        let entry = AuditEntry::new(
            AuditAction::DocumentReviewed,
            ENTITY_DOCUMENT,
            Some(document.id),
            &step.reviewer.email,
            &step.reviewer.name,
            details,
        );
        self.record(entry).await;
    }

    /// Record a document deletion, attributed to the owner.
    pub async fn document_deleted(&self, document: &Document) {
        let entry = AuditEntry::new(
            AuditAction::DocumentDeleted,
            ENTITY_DOCUMENT,
            Some(document.id),
            &document.owner.email,
            &document.owner.name,
            format!("Document deleted: {}", document.title),
        );
        self.record(entry).await;
    }

    async fn record(&self, entry: AuditEntry) {
        if let Err(e) = self.sink.record(entry).await {
            tracing::warn!(error = %e, "Failed to record audit entry");
        }
    }
}
