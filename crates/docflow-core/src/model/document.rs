use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::UserRef;

/// Aggregate status of a document, derived from its step statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    /// At least one step is still undecided and none is rejected.
    Pending,
    /// Every step is approved.
    Approved,
    /// At least one step is rejected.
    Rejected,
}

impl DocumentStatus {
    /// Convert to string for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Whether the status is terminal. Terminal documents never return
    /// to `Pending`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl FromStr for DocumentStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            _ => Self::Pending,
        })
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A document routed through the review chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID.
    pub id: Uuid,
    /// Display title.
    pub title: String,
    /// Opaque storage reference (path or object key); resolution is the
    /// storage layer's concern.
    pub storage_ref: String,
    /// Uploading user.
    pub owner: UserRef,
    /// Aggregate status, written only by the workflow engine.
    pub status: DocumentStatus,
    /// Rejection reason copied from the deciding step, if any.
    pub comment: Option<String>,
    /// When the aggregate status last reached a terminal state.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// When the document was uploaded.
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Create a pending document.
    pub fn new(title: impl Into<String>, storage_ref: impl Into<String>, owner: UserRef) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            storage_ref: storage_ref.into(),
            owner,
            status: DocumentStatus::Pending,
            comment: None,
            reviewed_at: None,
            created_at: Utc::now(),
        }
    }

    /// Mark the document approved. No-op once terminal.
    pub fn approve(&mut self, now: DateTime<Utc>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = DocumentStatus::Approved;
        self.reviewed_at = Some(now);
    }

    /// Mark the document rejected with the deciding comment. No-op once
    /// terminal.
    pub fn reject(&mut self, comment: impl Into<String>, now: DateTime<Utc>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = DocumentStatus::Rejected;
        self.comment = Some(comment.into());
        self.reviewed_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> UserRef {
        UserRef::new(Uuid::new_v4(), "Sam Uploader", "sam@example.com")
    }

    #[test]
    fn test_status_round_trip() {
        assert_eq!(
            "approved".parse::<DocumentStatus>().unwrap(),
            DocumentStatus::Approved
        );
        assert_eq!(
            "rejected".parse::<DocumentStatus>().unwrap(),
            DocumentStatus::Rejected
        );
        assert_eq!(
            "pending".parse::<DocumentStatus>().unwrap(),
            DocumentStatus::Pending
        );
    }

    #[test]
    fn test_new_document_is_pending() {
        let doc = Document::new("Q3 report", "uploads/q3.pdf", owner());
        assert_eq!(doc.status, DocumentStatus::Pending);
        assert!(doc.comment.is_none());
        assert!(doc.reviewed_at.is_none());
    }

    #[test]
    fn test_terminal_status_is_immutable() {
        let mut doc = Document::new("Q3 report", "uploads/q3.pdf", owner());
        let now = Utc::now();

        doc.reject("missing figures", now);
        assert_eq!(doc.status, DocumentStatus::Rejected);

        // A later approval attempt cannot leave the terminal state.
        doc.approve(Utc::now());
        assert_eq!(doc.status, DocumentStatus::Rejected);
        assert_eq!(doc.comment.as_deref(), Some("missing figures"));
        assert_eq!(doc.reviewed_at, Some(now));

        let mut doc = Document::new("Q3 report", "uploads/q3.pdf", owner());
        doc.approve(now);
        doc.reject("too late", Utc::now());
        assert_eq!(doc.status, DocumentStatus::Approved);
        assert!(doc.comment.is_none());
    }
}
