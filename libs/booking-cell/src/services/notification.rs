// libs/booking-cell/src/services/notification.rs
use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use shared_config::AppConfig;
use shared_models::NotificationId;

use crate::models::PushNotification;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Push gateway not configured")]
    NotConfigured,

    #[error("Push gateway error ({status}): {body}")]
    Gateway { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Fire-and-forget push delivery. Callers on the confirm path log failures
/// and never roll back on them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationPort: Send + Sync {
    async fn send(
        &self,
        device_id: String,
        notification: PushNotification,
    ) -> Result<NotificationId, NotificationError>;
}

pub struct PushGatewayNotifier {
    client: reqwest::Client,
    gateway_url: String,
    api_key: String,
}

impl PushGatewayNotifier {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            gateway_url: config.push_gateway_url.clone(),
            api_key: config.push_gateway_api_key.clone(),
        }
    }
}

#[async_trait]
impl NotificationPort for PushGatewayNotifier {
    async fn send(
        &self,
        device_id: String,
        notification: PushNotification,
    ) -> Result<NotificationId, NotificationError> {
        if self.gateway_url.is_empty() {
            return Err(NotificationError::NotConfigured);
        }

        debug!("Dispatching push notification to device {}", device_id);

        let notification_id = NotificationId::new();
        let payload = json!({
            "notification_id": notification_id,
            "device_id": device_id,
            "title": notification.title,
            "body": notification.body,
        });

        let response = self
            .client
            .post(format!("{}/v1/push", self.gateway_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Gateway {
                status: status.as_u16(),
                body,
            });
        }

        // The gateway may echo its own id; ours is authoritative for logs.
        let _: Value = response.json().await.unwrap_or(Value::Null);

        Ok(notification_id)
    }
}
