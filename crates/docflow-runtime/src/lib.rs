pub mod audit;
pub mod db;
pub mod directory;
pub mod engine;
pub mod migrations;
pub mod notify;
pub mod service;
pub mod store;
pub mod telemetry;

pub use audit::{AuditRecorder, MemoryAuditSink, PgAuditSink};
pub use db::Database;
pub use directory::{PgReviewerDirectory, StaticDirectory};
pub use engine::WorkflowEngine;
pub use migrations::{Migration, MigrationRunner};
pub use notify::{NotifierHandle, RecordingSender, WebhookSender};
pub use service::{DocumentOverview, DocumentService, NewDocument};
pub use store::{
    MemoryDocumentStore, MemoryWorkflowStore, PgDocumentStore, PgWorkflowStore,
};
