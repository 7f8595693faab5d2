//! Best-effort notification dispatch.
//!
//! The preferred shape is a bounded queue drained by a worker task, so
//! delivery latency and failures stay off the engine's critical path. A
//! synchronous fallback (`direct`) calls the sender in-line with errors
//! swallowed, and `disabled` drops everything, which is useful in
//! tests and one-shot tools.

mod webhook;

pub use webhook::WebhookSender;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use docflow_core::error::Result;
use docflow_core::notify::{Notification, NotificationSender};

enum Dispatch {
    Queue(mpsc::Sender<Notification>),
    Direct(Arc<dyn NotificationSender>),
    Disabled,
}

/// Handle the engine fires notifications through.
///
/// `notify` never fails and never blocks on delivery: the queue path
/// drops on overflow, the direct path swallows sender errors.
#[derive(Clone)]
pub struct NotifierHandle {
    dispatch: Arc<Dispatch>,
}

impl NotifierHandle {
    /// Spawn a queue worker around a sender and return the handle.
    ///
    /// The worker exits once every handle clone is dropped and the
    /// queue drains.
    pub fn spawn(sender: Arc<dyn NotificationSender>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        tokio::spawn(run_worker(rx, sender));

        Self {
            dispatch: Arc::new(Dispatch::Queue(tx)),
        }
    }

    /// Synchronous fallback: deliver in-line, swallowing errors.
    pub fn direct(sender: Arc<dyn NotificationSender>) -> Self {
        Self {
            dispatch: Arc::new(Dispatch::Direct(sender)),
        }
    }

    /// Drop every notification. Logged at debug level only.
    pub fn disabled() -> Self {
        Self {
            dispatch: Arc::new(Dispatch::Disabled),
        }
    }

    /// Fire a notification.
    pub async fn notify(&self, notification: Notification) {
        match self.dispatch.as_ref() {
            Dispatch::Queue(tx) => {
                if let Err(e) = tx.try_send(notification) {
                    // Queue full or worker gone; the contract is
                    // best-effort, so drop and log.
                    tracing::warn!(error = %e, "Dropping notification");
                }
            }
            Dispatch::Direct(sender) => {
                if let Err(e) = sender.send(&notification).await {
                    tracing::warn!(
                        error = %e,
                        recipient = %notification.recipient().email,
                        "Notification delivery failed"
                    );
                }
            }
            Dispatch::Disabled => {
                tracing::debug!(
                    recipient = %notification.recipient().email,
                    "Notifier disabled; dropping notification"
                );
            }
        }
    }
}

async fn run_worker(mut rx: mpsc::Receiver<Notification>, sender: Arc<dyn NotificationSender>) {
    while let Some(notification) = rx.recv().await {
        if let Err(e) = sender.send(&notification).await {
            tracing::warn!(
                error = %e,
                recipient = %notification.recipient().email,
                "Notification delivery failed"
            );
        }
    }
    tracing::debug!("Notification worker stopped");
}

/// Recording sender for tests: captures every notification and can be
/// told to fail.
#[derive(Clone, Default)]
pub struct RecordingSender {
    sent: Arc<RwLock<Vec<Notification>>>,
    failing: Arc<std::sync::atomic::AtomicBool>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications delivered so far.
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.read().await.clone()
    }

    /// Make every subsequent send fail.
    pub fn fail(&self, failing: bool) {
        self.failing
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }
}

impl NotificationSender for RecordingSender {
    fn send<'a>(
        &'a self,
        notification: &'a Notification,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(docflow_core::DocflowError::Notify(
                    "recording sender set to fail".to_string(),
                ));
            }
            self.sent.write().await.push(notification.clone());
            Ok(())
        })
    }
}
