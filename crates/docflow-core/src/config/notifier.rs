use serde::{Deserialize, Serialize};

/// Notifier configuration.
///
/// With no webhook URL configured, notifications are logged and
/// dropped; the workflow itself never depends on delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Webhook endpoint notifications are POSTed to.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Delivery timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Bounded queue capacity; notifications beyond it are dropped.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: default_timeout(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}

fn default_queue_capacity() -> usize {
    256
}
