use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use keystone_core::notification::{
    BulkEmailRequest, BulkEmailResponse, EmailAdapter, EmailRequest, EmailResponse, EmailStatus,
};
use keystone_core::payment::Metadata;
use keystone_core::{CoreResult, RequestContext};
use keystone_shared::Masked;
use keystone_store::app_config::EmailSettings;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::http::VendorClient;

pub const VENDOR: &str = "email_service";

/// Transactional email over a JSON HTTP API. The configured from-address is
/// always the sender.
pub struct EmailClient {
    http: VendorClient,
    api_key: Masked<String>,
    from_address: String,
}

#[derive(Serialize)]
struct OutgoingEmail<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    cc: &'a [String],
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    bcc: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<OutgoingAttachment<'a>>,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    metadata: &'a Metadata,
}

#[derive(Serialize)]
struct OutgoingAttachment<'a> {
    filename: &'a str,
    /// Base64, standard alphabet with padding.
    content: String,
    #[serde(rename = "type")]
    mime_type: &'a str,
}

#[derive(Serialize)]
struct BulkBody<'a> {
    emails: Vec<OutgoingEmail<'a>>,
}

#[derive(Deserialize)]
struct SendReceipt {
    id: String,
    status: String,
    #[serde(default)]
    message_id: String,
}

#[derive(Deserialize)]
struct BulkReceipt {
    id: String,
    status: String,
    total_emails: u32,
    sent_emails: u32,
    failed_emails: u32,
}

#[derive(Deserialize)]
struct StatusBody {
    id: String,
    status: String,
    #[serde(default)]
    delivered_at: Option<String>,
    #[serde(default)]
    opened_at: Option<String>,
    #[serde(default)]
    clicked_at: Option<String>,
}

/// Absent, null and malformed timestamps all read as "not yet".
fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|t| t.with_timezone(&Utc))
}

impl EmailClient {
    pub fn new(settings: &EmailSettings) -> CoreResult<Self> {
        Ok(Self {
            http: VendorClient::new(VENDOR, &settings.base_url, settings.timeout())?,
            api_key: settings.api_key.clone(),
            from_address: settings.from_address.clone(),
        })
    }

    fn request(&self, ctx: &RequestContext, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.http.request(ctx, method, path).bearer_auth(self.api_key.expose())
    }

    fn outgoing<'a>(&'a self, email: &'a EmailRequest) -> OutgoingEmail<'a> {
        OutgoingEmail {
            from: &self.from_address,
            to: &email.to,
            subject: &email.subject,
            text: &email.body,
            cc: &email.cc,
            bcc: &email.bcc,
            html: email.body_html.as_deref(),
            attachments: email
                .attachments
                .iter()
                .map(|a| OutgoingAttachment {
                    filename: &a.filename,
                    content: general_purpose::STANDARD.encode(&a.content),
                    mime_type: &a.mime_type,
                })
                .collect(),
            metadata: &email.metadata,
        }
    }
}

#[async_trait]
impl EmailAdapter for EmailClient {
    async fn send_email(&self, ctx: &RequestContext, request: &EmailRequest) -> CoreResult<EmailResponse> {
        tracing::info!(
            provider = VENDOR,
            operation = "send_email",
            request_id = %ctx.request_id,
            to_count = request.to.len(),
            subject = %request.subject,
            "Sending email"
        );

        let receipt: SendReceipt = self
            .http
            .send(
                ctx,
                "send_email",
                self.request(ctx, Method::POST, "/send").json(&self.outgoing(request)),
            )
            .await?;

        tracing::info!(
            provider = VENDOR,
            email_id = %receipt.id,
            status = %receipt.status,
            message_id = %receipt.message_id,
            "Email sent"
        );

        Ok(EmailResponse {
            id: receipt.id,
            status: receipt.status,
            sent_at: Utc::now(),
            message_id: receipt.message_id,
        })
    }

    async fn send_bulk_email(
        &self,
        ctx: &RequestContext,
        request: &BulkEmailRequest,
    ) -> CoreResult<BulkEmailResponse> {
        tracing::info!(
            provider = VENDOR,
            operation = "send_bulk_email",
            request_id = %ctx.request_id,
            email_count = request.emails.len(),
            "Sending bulk email"
        );

        let body = BulkBody {
            emails: request.emails.iter().map(|e| self.outgoing(e)).collect(),
        };
        let receipt: BulkReceipt = self
            .http
            .send(
                ctx,
                "send_bulk_email",
                self.request(ctx, Method::POST, "/send-bulk").json(&body),
            )
            .await?;

        Ok(BulkEmailResponse {
            id: receipt.id,
            status: receipt.status,
            total_emails: receipt.total_emails,
            sent_emails: receipt.sent_emails,
            failed_emails: receipt.failed_emails,
            created_at: Utc::now(),
        })
    }

    async fn get_email_status(&self, ctx: &RequestContext, email_id: &str) -> CoreResult<EmailStatus> {
        tracing::info!(
            provider = VENDOR,
            operation = "get_email_status",
            request_id = %ctx.request_id,
            email_id,
            "Getting email status"
        );

        let path = format!("/status/{}", email_id);
        let body: StatusBody = self
            .http
            .send(ctx, "get_email_status", self.request(ctx, Method::GET, &path))
            .await?;

        Ok(EmailStatus {
            delivered_at: parse_timestamp(body.delivered_at.as_deref()),
            opened_at: parse_timestamp(body.opened_at.as_deref()),
            clicked_at: parse_timestamp(body.clicked_at.as_deref()),
            id: body.id,
            status: body.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_core::notification::EmailAttachment;

    fn client() -> EmailClient {
        EmailClient::new(&EmailSettings {
            from_address: "shop@example.com".to_string(),
            ..EmailSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn test_outgoing_uses_configured_sender_and_base64() {
        let client = client();
        let email = EmailRequest {
            to: vec!["a@example.com".to_string()],
            subject: "Hi".to_string(),
            body: "plain".to_string(),
            body_html: Some("<p>plain</p>".to_string()),
            attachments: vec![EmailAttachment {
                filename: "r.txt".to_string(),
                content: b"hello".to_vec(),
                mime_type: "text/plain".to_string(),
            }],
            ..EmailRequest::default()
        };

        let json = serde_json::to_value(client.outgoing(&email)).unwrap();
        assert_eq!(json["from"], "shop@example.com");
        assert_eq!(json["text"], "plain");
        assert_eq!(json["html"], "<p>plain</p>");
        assert_eq!(json["attachments"][0]["content"], "aGVsbG8=");
        assert_eq!(json["attachments"][0]["type"], "text/plain");
        assert!(json.get("cc").is_none());
    }

    #[test]
    fn test_parse_timestamp_ignores_garbage() {
        assert!(parse_timestamp(None).is_none());
        assert!(parse_timestamp(Some("yesterday")).is_none());
        assert!(parse_timestamp(Some("2024-05-01T10:00:00Z")).is_some());
    }
}
