use thiserror::Error;
use uuid::Uuid;

use crate::model::ReviewRole;

/// Core error type for docflow operations.
#[derive(Error, Debug)]
pub enum DocflowError {
    /// A chain role has no enrolled reviewer. Fatal at chain-creation
    /// time; no partial chain is persisted and the call is not retried.
    #[error("no reviewer enrolled for role '{role}'")]
    RoleUnassigned { role: ReviewRole },

    #[error("document {0} not found")]
    DocumentNotFound(Uuid),

    #[error("workflow step {0} not found")]
    StepNotFound(Uuid),

    /// The step already carries a decision. The stored decision is left
    /// unchanged; callers surface this as a conflict.
    #[error("step {step_id} is already decided")]
    AlreadyDecided { step_id: Uuid },

    /// Documents can only be deleted while the document and every step
    /// are still pending.
    #[error("document {0} has review activity and cannot be deleted")]
    DeleteBlocked(Uuid),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("notification delivery error: {0}")]
    Notify(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for DocflowError {
    fn from(e: serde_json::Error) -> Self {
        DocflowError::Serialization(e.to_string())
    }
}

/// Result type alias using DocflowError.
pub type Result<T> = std::result::Result<T, DocflowError>;
