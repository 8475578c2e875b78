use crate::domain::models::job::Notification;
use crate::domain::ports::NotificationDispatcher;
use crate::error::AppError;
use async_trait::async_trait;
use tracing::info;

/// Fallback dispatcher when no webhook is configured: log and succeed.
pub struct LogNotifyService;

#[async_trait]
impl NotificationDispatcher for LogNotifyService {
    async fn dispatch(&self, notification: &Notification) -> Result<(), AppError> {
        info!(
            kind = %notification.kind,
            recipient = %notification.recipient_email,
            event = %notification.event_title,
            "notification (no webhook configured)"
        );
        Ok(())
    }
}
