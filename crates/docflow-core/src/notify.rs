use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Decision, UserRef};

/// A notification the workflow emits while moving a document through
/// its chain.
///
/// Delivery is best-effort: the engine fires these and carries on
/// regardless of the outcome, so a notification must never carry state
/// the workflow depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Notification {
    /// A stage is waiting on its reviewer.
    ReviewRequested {
        reviewer: UserRef,
        document_title: String,
        uploader_name: String,
    },
    /// A stage was decided; addressed to the document owner.
    StatusChanged {
        owner: UserRef,
        document_title: String,
        decision: Decision,
    },
    /// Every stage approved; addressed to the document owner.
    FullyApproved {
        owner: UserRef,
        document_title: String,
    },
}

impl Notification {
    /// Who the notification is addressed to.
    pub fn recipient(&self) -> &UserRef {
        match self {
            Self::ReviewRequested { reviewer, .. } => reviewer,
            Self::StatusChanged { owner, .. } => owner,
            Self::FullyApproved { owner, .. } => owner,
        }
    }

    /// Rendered subject line.
    pub fn subject(&self) -> String {
        match self {
            Self::ReviewRequested { document_title, .. } => {
                format!("New document for review: {}", document_title)
            }
            Self::StatusChanged {
                document_title,
                decision,
                ..
            } => format!("Document {}: {}", decision, document_title),
            Self::FullyApproved { document_title, .. } => {
                format!("Document approved: {}", document_title)
            }
        }
    }

    /// Rendered message body.
    pub fn body(&self) -> String {
        match self {
            Self::ReviewRequested {
                document_title,
                uploader_name,
                ..
            } => format!(
                "A document titled '{}' was uploaded by {} and is pending your review.",
                document_title, uploader_name
            ),
            Self::StatusChanged {
                document_title,
                decision,
                ..
            } => format!(
                "Your document '{}' has been {} by a reviewer.",
                document_title, decision
            ),
            Self::FullyApproved { document_title, .. } => format!(
                "Your document '{}' has been approved by all reviewers.",
                document_title
            ),
        }
    }
}

/// Delivery seam for notifications.
///
/// Implementations may talk to a webhook, an email relay, or a test
/// recorder. Errors are reported to the immediate caller (the queue
/// worker or the synchronous fallback), which logs and swallows them;
/// a failed send never reaches the workflow engine.
pub trait NotificationSender: Send + Sync {
    fn send<'a>(
        &'a self,
        notification: &'a Notification,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}
