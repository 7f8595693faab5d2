//! Reviewer directory implementations.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use sqlx::{PgPool, Row};

use docflow_core::directory::ReviewerDirectory;
use docflow_core::error::Result;
use docflow_core::model::{ReviewRole, UserRef};

/// PostgreSQL-backed reviewer directory.
#[derive(Clone)]
pub struct PgReviewerDirectory {
    pool: PgPool,
}

impl PgReviewerDirectory {
    /// Create a new directory over the users table.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ReviewerDirectory for PgReviewerDirectory {
    fn find_reviewer(
        &self,
        role: ReviewRole,
    ) -> Pin<Box<dyn Future<Output = Result<Option<UserRef>>> + Send + '_>> {
        Box::pin(async move {
            // First-by-insertion per role: ties on created_at break on id
            // so the pick stays deterministic.
            let row = sqlx::query(
                r#"
                SELECT id, name, email FROM docflow_users
                WHERE role = $1
                ORDER BY created_at, id
                LIMIT 1
                "#,
            )
            .bind(role.as_str())
            .fetch_optional(&self.pool)
            .await?;

            Ok(row.map(|r| UserRef {
                id: r.get("id"),
                name: r.get("name"),
                email: r.get("email"),
            }))
        })
    }
}

/// Fixed role-to-reviewer mapping for tests and embedded deployments.
#[derive(Clone, Default)]
pub struct StaticDirectory {
    reviewers: HashMap<ReviewRole, UserRef>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enroll a reviewer for a role, replacing any previous enrollment.
    pub fn with_reviewer(mut self, role: ReviewRole, reviewer: UserRef) -> Self {
        self.reviewers.insert(role, reviewer);
        self
    }
}

impl ReviewerDirectory for StaticDirectory {
    fn find_reviewer(
        &self,
        role: ReviewRole,
    ) -> Pin<Box<dyn Future<Output = Result<Option<UserRef>>> + Send + '_>> {
        let reviewer = self.reviewers.get(&role).cloned();
        Box::pin(async move { Ok(reviewer) })
    }
}
