pub mod audit;
pub mod chain;
pub mod config;
pub mod directory;
pub mod error;
pub mod model;
pub mod notify;
pub mod progress;
pub mod store;

pub use audit::AuditSink;
pub use chain::ChainSpec;
pub use config::DocflowConfig;
pub use directory::ReviewerDirectory;
pub use error::{DocflowError, Result};
pub use model::{
    AuditAction, AuditEntry, Decision, Document, DocumentStatus, ReviewRole, StepStatus, UserRef,
    WorkflowStep,
};
pub use notify::{Notification, NotificationSender};
pub use progress::ReviewProgress;
pub use store::{DocumentStore, WorkflowStore};
