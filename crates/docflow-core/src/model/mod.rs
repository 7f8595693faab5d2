mod audit;
mod document;
mod step;
mod user;

pub use audit::{AuditAction, AuditEntry};
pub use document::{Document, DocumentStatus};
pub use step::{Decision, ReviewRole, StepStatus, WorkflowStep};
pub use user::UserRef;
