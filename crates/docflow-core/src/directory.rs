use std::future::Future;
use std::pin::Pin;

use crate::error::Result;
use crate::model::{ReviewRole, UserRef};

/// Resolves the canonical reviewer for a chain role.
///
/// Consulted once per role at chain-creation time. When several users
/// hold the same role, the first by insertion order wins; assignment is
/// deliberately not round-robin or random.
pub trait ReviewerDirectory: Send + Sync {
    /// Find the reviewer enrolled for a role, or `None` when the role
    /// has no enrolled users (which callers treat as a fatal
    /// configuration error).
    fn find_reviewer(
        &self,
        role: ReviewRole,
    ) -> Pin<Box<dyn Future<Output = Result<Option<UserRef>>> + Send + '_>>;
}
