use async_trait::async_trait;
use chrono::Utc;
use keystone_core::notification::{SmsAdapter, SmsRequest, SmsResponse};
use keystone_core::{CoreResult, RequestContext};
use keystone_shared::Masked;
use keystone_store::app_config::SmsSettings;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::http::VendorClient;

pub const VENDOR: &str = "sms_service";

pub struct SmsClient {
    http: VendorClient,
    api_key: Masked<String>,
    from_number: String,
}

#[derive(Serialize)]
struct OutgoingSms<'a> {
    to: &'a str,
    message: &'a str,
    from: &'a str,
}

#[derive(Deserialize)]
struct SendReceipt {
    id: String,
    status: String,
    #[serde(default)]
    message_id: String,
}

impl SmsClient {
    pub fn new(settings: &SmsSettings) -> CoreResult<Self> {
        Ok(Self {
            http: VendorClient::new(VENDOR, &settings.base_url, settings.timeout())?,
            api_key: settings.api_key.clone(),
            from_number: settings.from_number.clone(),
        })
    }
}

#[async_trait]
impl SmsAdapter for SmsClient {
    async fn send_sms(&self, ctx: &RequestContext, request: &SmsRequest) -> CoreResult<SmsResponse> {
        tracing::info!(
            provider = VENDOR,
            operation = "send_sms",
            request_id = %ctx.request_id,
            to = %request.to,
            "Sending SMS"
        );

        // A sender on the request wins over the configured number.
        let from = request
            .from
            .as_deref()
            .filter(|f| !f.is_empty())
            .unwrap_or(&self.from_number);

        let body = OutgoingSms {
            to: &request.to,
            message: &request.message,
            from,
        };
        let call = self
            .http
            .request(ctx, Method::POST, "/send")
            .bearer_auth(self.api_key.expose())
            .json(&body);
        let receipt: SendReceipt = self.http.send(ctx, "send_sms", call).await?;

        tracing::info!(
            provider = VENDOR,
            sms_id = %receipt.id,
            status = %receipt.status,
            "SMS sent"
        );

        Ok(SmsResponse {
            id: receipt.id,
            status: receipt.status,
            sent_at: Utc::now(),
            message_id: receipt.message_id,
        })
    }
}
