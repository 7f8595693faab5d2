use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DocflowError, Result};
use crate::model::UserRef;

/// Review roles a chain stage can be assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewRole {
    Officer,
    Manager,
    Admin,
}

impl ReviewRole {
    /// Convert to string for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Officer => "officer",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for ReviewRole {
    type Err = DocflowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "officer" => Ok(Self::Officer),
            "manager" => Ok(Self::Manager),
            "admin" => Ok(Self::Admin),
            other => Err(DocflowError::Config(format!(
                "unknown review role '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ReviewRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a single workflow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Waiting on the assigned reviewer.
    Pending,
    /// Reviewer approved the stage.
    Approved,
    /// Reviewer rejected the stage.
    Rejected,
}

impl StepStatus {
    /// Convert to string for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Whether the step carries a decision.
    pub fn is_decided(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl FromStr for StepStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            _ => Self::Pending,
        })
    }
}

/// A reviewer's verdict on a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    /// The step status this decision resolves to.
    pub fn status(&self) -> StepStatus {
        match self {
            Self::Approved => StepStatus::Approved,
            Self::Rejected => StepStatus::Rejected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.status().as_str()
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single stage of a document's review chain.
///
/// Steps are created together as a set, one per chain role, and ordered
/// by the explicit `sequence` field. A step is decided at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// Unique step ID.
    pub id: Uuid,
    /// Owning document.
    pub document_id: Uuid,
    /// Chain role this stage belongs to.
    pub role: ReviewRole,
    /// Position in the chain. This is the ordering contract; it is
    /// never derived from insertion order.
    pub sequence: i32,
    /// Reviewer assigned at chain-creation time.
    pub reviewer: UserRef,
    /// Current status.
    pub status: StepStatus,
    /// Reviewer comment recorded with the decision.
    pub comment: Option<String>,
    /// When the decision was recorded.
    pub reviewed_at: Option<DateTime<Utc>>,
    /// When the step was created.
    pub created_at: DateTime<Utc>,
}

impl WorkflowStep {
    /// Create a pending step for a chain position.
    pub fn new(document_id: Uuid, role: ReviewRole, sequence: i32, reviewer: UserRef) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            role,
            sequence,
            reviewer,
            status: StepStatus::Pending,
            comment: None,
            reviewed_at: None,
            created_at: Utc::now(),
        }
    }

    /// Record the reviewer's decision.
    ///
    /// A step transitions `Pending -> Approved` or `Pending -> Rejected`
    /// exactly once; a second decision fails with `AlreadyDecided` and
    /// leaves the stored decision untouched.
    pub fn decide(
        &mut self,
        decision: Decision,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.status.is_decided() {
            return Err(DocflowError::AlreadyDecided { step_id: self.id });
        }

        self.status = decision.status();
        self.comment = comment;
        self.reviewed_at = Some(now);
        Ok(())
    }
}
