use std::collections::HashSet;

use crate::error::{DocflowError, Result};
use crate::model::ReviewRole;

/// The ordered list of roles a document's review chain runs through.
///
/// Chain length and order are configuration, not structure: each step
/// carries an explicit sequence number taken from its position here, so
/// nothing downstream depends on insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSpec {
    roles: Vec<ReviewRole>,
}

impl ChainSpec {
    /// Build a chain from an ordered role list.
    ///
    /// The list must be non-empty and free of duplicates; a role cannot
    /// review the same document twice.
    pub fn new(roles: Vec<ReviewRole>) -> Result<Self> {
        if roles.is_empty() {
            return Err(DocflowError::Config(
                "review chain must contain at least one role".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for role in &roles {
            if !seen.insert(*role) {
                return Err(DocflowError::Config(format!(
                    "review chain lists role '{}' more than once",
                    role
                )));
            }
        }

        Ok(Self { roles })
    }

    /// Roles in chain order.
    pub fn roles(&self) -> &[ReviewRole] {
        &self.roles
    }

    /// Number of stages in the chain.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl Default for ChainSpec {
    /// The stock three-stage chain: Officer, then Manager, then Admin.
    fn default() -> Self {
        Self {
            roles: vec![ReviewRole::Officer, ReviewRole::Manager, ReviewRole::Admin],
        }
    }
}
