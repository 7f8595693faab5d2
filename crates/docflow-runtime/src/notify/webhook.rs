use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use docflow_core::error::{DocflowError, Result};
use docflow_core::notify::{Notification, NotificationSender};

/// Delivers notifications as JSON POSTs to a webhook endpoint.
#[derive(Clone)]
pub struct WebhookSender {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookSender {
    /// Create a sender for an endpoint.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DocflowError::Notify(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl NotificationSender for WebhookSender {
    fn send<'a>(
        &'a self,
        notification: &'a Notification,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let recipient = notification.recipient();
            let payload = serde_json::json!({
                "recipient_email": recipient.email,
                "recipient_name": recipient.name,
                "subject": notification.subject(),
                "body": notification.body(),
            });

            self.client
                .post(&self.endpoint)
                .json(&payload)
                .send()
                .await
                .map_err(|e| DocflowError::Notify(format!("Webhook request failed: {}", e)))?
                .error_for_status()
                .map_err(|e| DocflowError::Notify(format!("Webhook returned error: {}", e)))?;

            Ok(())
        })
    }
}
