use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Per-document update scopes.
///
/// Decisions on different documents run concurrently; decisions on the
/// same document serialize so the recomputed aggregate status never
/// loses an update.
#[derive(Default)]
pub(crate) struct DocumentLocks {
    inner: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl DocumentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the update scope for a document. The returned guard must
    /// span the whole load -> mutate -> recompute -> persist unit.
    pub async fn acquire(&self, document_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut registry = self.inner.lock().await;
            registry
                .entry(document_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        lock.lock_owned().await
    }
}
