use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lightweight reference to a directory user.
///
/// Carries exactly the fields the core reads: the identity for store
/// lookups and the name/email pair used to address notifications and
/// attribute audit entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// Directory user ID.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Email address notifications are sent to.
    pub email: String,
}

impl UserRef {
    /// Create a reference for an existing directory user.
    pub fn new(id: Uuid, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }
}
