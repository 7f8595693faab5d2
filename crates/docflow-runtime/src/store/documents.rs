use std::future::Future;
use std::pin::Pin;

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use docflow_core::error::Result;
use docflow_core::model::{Document, UserRef};
use docflow_core::store::DocumentStore;

/// PostgreSQL-backed document store.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Create a new document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> Document {
        Document {
            id: row.get("id"),
            title: row.get("title"),
            storage_ref: row.get("storage_ref"),
            owner: UserRef {
                id: row.get("owner_id"),
                name: row.get("owner_name"),
                email: row.get("owner_email"),
            },
            status: row.get::<String, _>("status").parse().unwrap(),
            comment: row.get("comment"),
            reviewed_at: row.get("reviewed_at"),
            created_at: row.get("created_at"),
        }
    }
}

const SELECT_COLUMNS: &str = "id, title, storage_ref, owner_id, owner_name, owner_email, \
                              status, comment, reviewed_at, created_at";

impl DocumentStore for PgDocumentStore {
    fn get(&self, id: Uuid) -> Pin<Box<dyn Future<Output = Result<Option<Document>>> + Send + '_>> {
        Box::pin(async move {
            let row = sqlx::query(&format!(
                "SELECT {} FROM docflow_documents WHERE id = $1",
                SELECT_COLUMNS
            ))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

            Ok(row.map(|r| Self::map_row(&r)))
        })
    }

    fn insert(&self, document: Document) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            sqlx::query(
                r#"
                INSERT INTO docflow_documents (
                    id, title, storage_ref, owner_id, owner_name, owner_email,
                    status, comment, reviewed_at, created_at
                ) VALUES (
                    $1, $2, $3, $4, $5, $6, $7, $8, $9, $10
                )
                "#,
            )
            .bind(document.id)
            .bind(&document.title)
            .bind(&document.storage_ref)
            .bind(document.owner.id)
            .bind(&document.owner.name)
            .bind(&document.owner.email)
            .bind(document.status.as_str())
            .bind(&document.comment)
            .bind(document.reviewed_at)
            .bind(document.created_at)
            .execute(&self.pool)
            .await?;

            Ok(())
        })
    }

    fn save(&self, document: Document) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            sqlx::query(
                r#"
                UPDATE docflow_documents
                SET status = $2, comment = $3, reviewed_at = $4
                WHERE id = $1
                "#,
            )
            .bind(document.id)
            .bind(document.status.as_str())
            .bind(&document.comment)
            .bind(document.reviewed_at)
            .execute(&self.pool)
            .await?;

            Ok(())
        })
    }

    fn delete(&self, id: Uuid) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            // Steps cascade via the document_id foreign key.
            sqlx::query("DELETE FROM docflow_documents WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;

            Ok(())
        })
    }

    fn list_for_owner(
        &self,
        owner_id: Uuid,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Document>>> + Send + '_>> {
        Box::pin(async move {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM docflow_documents WHERE owner_id = $1 ORDER BY created_at DESC",
                SELECT_COLUMNS
            ))
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

            Ok(rows.iter().map(Self::map_row).collect())
        })
    }
}
