use std::future::Future;
use std::pin::Pin;

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use docflow_core::error::{DocflowError, Result};
use docflow_core::model::{UserRef, WorkflowStep};
use docflow_core::store::WorkflowStore;

/// PostgreSQL-backed workflow step store.
#[derive(Clone)]
pub struct PgWorkflowStore {
    pool: PgPool,
}

impl PgWorkflowStore {
    /// Create a new workflow store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> Result<WorkflowStep> {
        Ok(WorkflowStep {
            id: row.get("id"),
            document_id: row.get("document_id"),
            role: row.get::<String, _>("role").parse().map_err(|_| {
                DocflowError::Database(format!(
                    "workflow step {} carries an unknown role",
                    row.get::<Uuid, _>("id")
                ))
            })?,
            sequence: row.get("sequence"),
            reviewer: UserRef {
                id: row.get("reviewer_id"),
                name: row.get("reviewer_name"),
                email: row.get("reviewer_email"),
            },
            status: row.get::<String, _>("status").parse().unwrap(),
            comment: row.get("comment"),
            reviewed_at: row.get("reviewed_at"),
            created_at: row.get("created_at"),
        })
    }
}

const SELECT_COLUMNS: &str = "id, document_id, role, sequence, reviewer_id, reviewer_name, \
                              reviewer_email, status, comment, reviewed_at, created_at";

impl WorkflowStore for PgWorkflowStore {
    fn insert_chain(
        &self,
        steps: Vec<WorkflowStep>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            // One transaction: either the whole chain lands or none of it.
            let mut tx = self.pool.begin().await?;

            for step in &steps {
                sqlx::query(
                    r#"
                    INSERT INTO docflow_workflow_steps (
                        id, document_id, role, sequence, reviewer_id, reviewer_name,
                        reviewer_email, status, comment, reviewed_at, created_at
                    ) VALUES (
                        $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11
                    )
                    "#,
                )
                .bind(step.id)
                .bind(step.document_id)
                .bind(step.role.as_str())
                .bind(step.sequence)
                .bind(step.reviewer.id)
                .bind(&step.reviewer.name)
                .bind(&step.reviewer.email)
                .bind(step.status.as_str())
                .bind(&step.comment)
                .bind(step.reviewed_at)
                .bind(step.created_at)
                .execute(&mut *tx)
                .await?;
            }

            tx.commit().await?;
            Ok(())
        })
    }

    fn get_step(
        &self,
        id: Uuid,
    ) -> Pin<Box<dyn Future<Output = Result<Option<WorkflowStep>>> + Send + '_>> {
        Box::pin(async move {
            let row = sqlx::query(&format!(
                "SELECT {} FROM docflow_workflow_steps WHERE id = $1",
                SELECT_COLUMNS
            ))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

            row.map(|r| Self::map_row(&r)).transpose()
        })
    }

    fn save_step(
        &self,
        step: WorkflowStep,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            sqlx::query(
                r#"
                UPDATE docflow_workflow_steps
                SET status = $2, comment = $3, reviewed_at = $4
                WHERE id = $1
                "#,
            )
            .bind(step.id)
            .bind(step.status.as_str())
            .bind(&step.comment)
            .bind(step.reviewed_at)
            .execute(&self.pool)
            .await?;

            Ok(())
        })
    }

    fn steps_for_document(
        &self,
        document_id: Uuid,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<WorkflowStep>>> + Send + '_>> {
        Box::pin(async move {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM docflow_workflow_steps WHERE document_id = $1 ORDER BY sequence",
                SELECT_COLUMNS
            ))
            .bind(document_id)
            .fetch_all(&self.pool)
            .await?;

            rows.iter().map(Self::map_row).collect()
        })
    }

    fn pending_steps_for_reviewer(
        &self,
        reviewer_id: Uuid,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<WorkflowStep>>> + Send + '_>> {
        Box::pin(async move {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM docflow_workflow_steps \
                 WHERE reviewer_id = $1 AND status = 'pending' \
                 ORDER BY created_at",
                SELECT_COLUMNS
            ))
            .bind(reviewer_id)
            .fetch_all(&self.pool)
            .await?;

            rows.iter().map(Self::map_row).collect()
        })
    }

    fn delete_for_document(
        &self,
        document_id: Uuid,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            sqlx::query("DELETE FROM docflow_workflow_steps WHERE document_id = $1")
                .bind(document_id)
                .execute(&self.pool)
                .await?;

            Ok(())
        })
    }
}
