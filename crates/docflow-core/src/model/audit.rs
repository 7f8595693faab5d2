use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Actions recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    DocumentUploaded,
    DocumentReviewed,
    DocumentDeleted,
}

impl AuditAction {
    /// Convert to string for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentUploaded => "document_uploaded",
            Self::DocumentReviewed => "document_reviewed",
            Self::DocumentDeleted => "document_deleted",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single audit trail record.
///
/// Recording is best-effort: sinks may fail and callers swallow the
/// failure, so an entry must never carry state the workflow depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry ID.
    pub id: Uuid,
    /// What happened.
    pub action: AuditAction,
    /// Entity kind the entry refers to (e.g. "document").
    pub entity_type: String,
    /// Entity ID the entry refers to.
    pub entity_id: Option<Uuid>,
    /// Acting user's email.
    pub actor_email: String,
    /// Acting user's display name.
    pub actor_name: String,
    /// Free-form detail line.
    pub details: String,
    /// When the entry was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Create an entry stamped with the current time.
    pub fn new(
        action: AuditAction,
        entity_type: impl Into<String>,
        entity_id: Option<Uuid>,
        actor_email: impl Into<String>,
        actor_name: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            entity_type: entity_type.into(),
            entity_id,
            actor_email: actor_email.into(),
            actor_name: actor_name.into(),
            details: details.into(),
            recorded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let id = Uuid::new_v4();
        let entry = AuditEntry::new(
            AuditAction::DocumentReviewed,
            "document",
            Some(id),
            "riley@example.com",
            "Riley Officer",
            "Document reviewed with status approved",
        );

        assert_eq!(entry.action, AuditAction::DocumentReviewed);
        assert_eq!(entry.entity_type, "document");
        assert_eq!(entry.entity_id, Some(id));
        assert_eq!(entry.action.as_str(), "document_reviewed");
    }
}
