//! Messaging platform webhooks: signature check and event dispatch

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;

use crate::db::{DbError, IntakeStore};
use crate::model::MessageReceipt;

/// Header carrying the hex-encoded HMAC-SHA256 of the raw body
pub const SIGNATURE_HEADER: &str = "x-kapso-signature";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Firma inválida")]
    InvalidSignature,

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    DbError(#[from] DbError),
}

/// Check `signature` against the HMAC-SHA256 of `body` keyed with `secret`
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Webhook envelope
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl WebhookEvent {
    fn message_id(&self) -> Option<&str> {
        self.data.get("message_id").and_then(Value::as_str)
    }

    /// Event time, falling back to the time of receipt
    fn occurred_at(&self) -> DateTime<Utc> {
        self.timestamp
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(Utc::now)
    }
}

pub struct WebhookService {
    store: Arc<dyn IntakeStore>,
    secret: Option<String>,
    verify: bool,
}

impl WebhookService {
    pub fn new(store: Arc<dyn IntakeStore>, secret: Option<String>, verify: bool) -> Self {
        if !verify {
            tracing::warn!("Webhook signature verification is disabled");
        }
        Self {
            store,
            secret,
            verify,
        }
    }

    /// Reject the request unless verification is off or the signature matches
    pub fn authenticate(&self, body: &[u8], signature: Option<&str>) -> Result<(), WebhookError> {
        if !self.verify {
            return Ok(());
        }
        match (self.secret.as_deref(), signature) {
            (Some(secret), Some(signature)) if verify_signature(secret, body, signature) => Ok(()),
            _ => Err(WebhookError::InvalidSignature),
        }
    }

    /// Verify and process one webhook delivery
    pub async fn receive(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<(), WebhookError> {
        self.authenticate(body, signature)?;
        let event: WebhookEvent = serde_json::from_slice(body)?;
        self.handle(&event).await
    }

    pub async fn handle(&self, event: &WebhookEvent) -> Result<(), WebhookError> {
        tracing::info!(event = %event.event, timestamp = ?event.timestamp, "Webhook event received");

        match event.event.as_str() {
            "message.received" | "message.sent" => {
                tracing::info!(event = %event.event, message_id = ?event.message_id(), "Message event");
            }
            "message.delivered" => {
                self.apply_receipt(event, MessageReceipt::Delivered(event.occurred_at()))
                    .await?;
            }
            "message.read" => {
                self.apply_receipt(event, MessageReceipt::Read(event.occurred_at()))
                    .await?;
            }
            "media.received" => {
                let media_id = event
                    .data
                    .pointer("/media/id")
                    .and_then(Value::as_str);
                tracing::info!(media_id = ?media_id, "Media received");
            }
            other => {
                tracing::info!(event = %other, "Unhandled webhook event");
            }
        }

        Ok(())
    }

    async fn apply_receipt(
        &self,
        event: &WebhookEvent,
        receipt: MessageReceipt,
    ) -> Result<(), WebhookError> {
        let Some(message_id) = event.message_id() else {
            tracing::warn!(event = %event.event, "Receipt without message_id");
            return Ok(());
        };

        let updated = self.store.update_message_receipt(message_id, receipt).await?;
        if updated == 0 {
            tracing::debug!(message_id, "Receipt for unknown message");
        } else {
            tracing::info!(message_id, updated, event = %event.event, "Message receipt recorded");
        }
        Ok(())
    }
}
