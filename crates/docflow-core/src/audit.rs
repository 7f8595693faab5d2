use std::future::Future;
use std::pin::Pin;

use crate::error::Result;
use crate::model::AuditEntry;

/// Persistence seam for the audit trail.
///
/// Sinks are best-effort collaborators: callers swallow and log
/// failures, and a failed record never rolls back a committed
/// transition.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}
