use serde::{Deserialize, Serialize};

use crate::model::{Document, DocumentStatus, WorkflowStep};

/// Read-only projection of how far a document has moved through its
/// chain. Pure function of already-persisted state; computing it has no
/// side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewProgress {
    /// Steps that carry a decision.
    pub completed_steps: u32,
    /// Total steps in the chain.
    pub total_steps: u32,
    /// Percentage shown to callers.
    pub percent: u8,
}

impl ReviewProgress {
    /// Project progress for a document and its steps.
    ///
    /// Terminal documents always read 100%. Otherwise the percentage is
    /// `floor(completed * 100 / total)`, floored at one stage's worth
    /// for a freshly created chain so a pending document never shows 0%.
    pub fn for_document(document: &Document, steps: &[WorkflowStep]) -> Self {
        let total = steps.len() as u32;
        let completed = steps.iter().filter(|s| s.status.is_decided()).count() as u32;

        let percent = if document.status.is_terminal() {
            100
        } else if total == 0 {
            0
        } else {
            let raw = completed * 100 / total;
            if raw == 0 && document.status == DocumentStatus::Pending {
                (100 / total) as u8
            } else {
                raw.min(100) as u8
            }
        };

        Self {
            completed_steps: completed,
            total_steps: total,
            percent,
        }
    }
}
