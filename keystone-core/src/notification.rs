use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::payment::Metadata;
use crate::{CoreResult, RequestContext};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EmailRequest {
    pub to: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<String>,
    pub subject: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<EmailAttachment>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailAttachment {
    pub filename: String,
    pub content: Vec<u8>,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailResponse {
    pub id: String,
    pub status: String,
    pub sent_at: DateTime<Utc>,
    pub message_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BulkEmailRequest {
    pub emails: Vec<EmailRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BulkEmailResponse {
    pub id: String,
    pub status: String,
    pub total_emails: u32,
    pub sent_emails: u32,
    pub failed_emails: u32,
    pub created_at: DateTime<Utc>,
}

/// Delivery tracking for one email. Each timestamp is present only once the
/// vendor has reported that event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailStatus {
    pub id: String,
    pub status: String,
    pub delivered_at: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
    pub clicked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SmsRequest {
    pub to: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SmsResponse {
    pub id: String,
    pub status: String,
    pub sent_at: DateTime<Utc>,
    pub message_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PushNotificationRequest {
    pub device_tokens: Vec<String>,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub data: Metadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PushNotificationResponse {
    pub id: String,
    pub status: String,
    pub sent_at: DateTime<Utc>,
    pub success_count: u32,
    pub failure_count: u32,
}

/// The notification capability the order workflow depends on.
#[async_trait]
pub trait NotificationAdapter: Send + Sync {
    async fn send_email(
        &self,
        ctx: &RequestContext,
        request: &EmailRequest,
    ) -> CoreResult<EmailResponse>;

    async fn send_sms(&self, ctx: &RequestContext, request: &SmsRequest) -> CoreResult<SmsResponse>;

    /// May be a no-op: callers treat zero successes as "nothing was sent",
    /// not as an error.
    async fn send_push_notification(
        &self,
        ctx: &RequestContext,
        request: &PushNotificationRequest,
    ) -> CoreResult<PushNotificationResponse>;
}

/// Email channel, with the bulk and tracking operations the unified
/// notifier does not expose.
#[async_trait]
pub trait EmailAdapter: Send + Sync {
    async fn send_email(
        &self,
        ctx: &RequestContext,
        request: &EmailRequest,
    ) -> CoreResult<EmailResponse>;

    async fn send_bulk_email(
        &self,
        ctx: &RequestContext,
        request: &BulkEmailRequest,
    ) -> CoreResult<BulkEmailResponse>;

    async fn get_email_status(&self, ctx: &RequestContext, email_id: &str) -> CoreResult<EmailStatus>;
}

#[async_trait]
pub trait SmsAdapter: Send + Sync {
    async fn send_sms(&self, ctx: &RequestContext, request: &SmsRequest) -> CoreResult<SmsResponse>;
}
