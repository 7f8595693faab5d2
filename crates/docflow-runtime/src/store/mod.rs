//! Store implementations: PostgreSQL-backed for deployments, in-memory
//! for tests and embedded use.

mod documents;
mod memory;
mod steps;

pub use documents::PgDocumentStore;
pub use memory::{MemoryDocumentStore, MemoryWorkflowStore};
pub use steps::PgWorkflowStore;
