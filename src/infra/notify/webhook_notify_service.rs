use crate::domain::models::job::Notification;
use crate::domain::ports::NotificationDispatcher;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use tracing::error;

/// Posts notifications to a downstream delivery system (email/push is its
/// problem, not ours).
pub struct WebhookNotifyService {
    client: Client,
    webhook_url: String,
    token: String,
}

impl WebhookNotifyService {
    pub fn new(webhook_url: String, token: String) -> Self {
        Self {
            client: Client::new(),
            webhook_url,
            token,
        }
    }
}

#[async_trait]
impl NotificationDispatcher for WebhookNotifyService {
    async fn dispatch(&self, notification: &Notification) -> Result<(), AppError> {
        let res = self.client.post(&self.webhook_url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(notification)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Notification webhook connection error: {}", e);
                error!("{}", msg);
                AppError::InternalWithMsg(msg)
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Notification webhook failed. Status: {}, Body: {}", status, text);
            error!("{}", msg);
            return Err(AppError::InternalWithMsg(msg));
        }

        Ok(())
    }
}
