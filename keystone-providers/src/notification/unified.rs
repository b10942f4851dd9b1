use async_trait::async_trait;
use chrono::Utc;
use keystone_core::notification::{
    EmailAdapter, EmailRequest, EmailResponse, NotificationAdapter, PushNotificationRequest,
    PushNotificationResponse, SmsAdapter, SmsRequest, SmsResponse,
};
use keystone_core::{CoreResult, RequestContext};
use std::sync::Arc;
use uuid::Uuid;

/// Routes each channel to its own adapter.
pub struct UnifiedNotifier {
    email: Arc<dyn EmailAdapter>,
    sms: Arc<dyn SmsAdapter>,
}

impl UnifiedNotifier {
    pub fn new(email: Arc<dyn EmailAdapter>, sms: Arc<dyn SmsAdapter>) -> Self {
        Self { email, sms }
    }
}

#[async_trait]
impl NotificationAdapter for UnifiedNotifier {
    async fn send_email(&self, ctx: &RequestContext, request: &EmailRequest) -> CoreResult<EmailResponse> {
        self.email.send_email(ctx, request).await
    }

    async fn send_sms(&self, ctx: &RequestContext, request: &SmsRequest) -> CoreResult<SmsResponse> {
        self.sms.send_sms(ctx, request).await
    }

    /// No push vendor is wired in. Every token counts as a failure and no
    /// network call is made.
    async fn send_push_notification(
        &self,
        ctx: &RequestContext,
        request: &PushNotificationRequest,
    ) -> CoreResult<PushNotificationResponse> {
        tracing::warn!(
            operation = "send_push_notification",
            request_id = %ctx.request_id,
            device_count = request.device_tokens.len(),
            "Push notifications are not implemented"
        );

        Ok(PushNotificationResponse {
            id: Uuid::new_v4().to_string(),
            status: "not_implemented".to_string(),
            sent_at: Utc::now(),
            success_count: 0,
            failure_count: u32::try_from(request.device_tokens.len()).unwrap_or(u32::MAX),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keystone_core::notification::{BulkEmailRequest, BulkEmailResponse, EmailStatus};
    use keystone_core::CoreError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingChannel {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmailAdapter for CountingChannel {
        async fn send_email(&self, _: &RequestContext, _: &EmailRequest) -> CoreResult<EmailResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(EmailResponse {
                id: "e-1".to_string(),
                status: "queued".to_string(),
                sent_at: Utc::now(),
                message_id: "m-1".to_string(),
            })
        }

        async fn send_bulk_email(&self, _: &RequestContext, _: &BulkEmailRequest) -> CoreResult<BulkEmailResponse> {
            Err(CoreError::InternalError("unused".to_string()))
        }

        async fn get_email_status(&self, _: &RequestContext, _: &str) -> CoreResult<EmailStatus> {
            Err(CoreError::InternalError("unused".to_string()))
        }
    }

    #[async_trait]
    impl SmsAdapter for CountingChannel {
        async fn send_sms(&self, _: &RequestContext, _: &SmsRequest) -> CoreResult<SmsResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CoreError::vendor("sms_service", "send_sms", "unexpected status 500"))
        }
    }

    #[tokio::test]
    async fn test_push_stub_reports_every_token_failed() {
        let channel = Arc::new(CountingChannel::default());
        let notifier = UnifiedNotifier::new(channel.clone(), channel.clone());
        let request = PushNotificationRequest {
            device_tokens: vec!["a".into(), "b".into(), "c".into()],
            title: "t".into(),
            body: "b".into(),
            ..Default::default()
        };

        let response = notifier
            .send_push_notification(&RequestContext::background(), &request)
            .await
            .unwrap();

        assert_eq!(response.status, "not_implemented");
        assert_eq!(response.success_count, 0);
        assert_eq!(response.failure_count, 3);
        assert_eq!(channel.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_channels_are_delegated() {
        let channel = Arc::new(CountingChannel::default());
        let notifier = UnifiedNotifier::new(channel.clone(), channel.clone());
        let ctx = RequestContext::background();

        let email = notifier.send_email(&ctx, &EmailRequest::default()).await.unwrap();
        assert_eq!(email.message_id, "m-1");

        let sms = notifier.send_sms(&ctx, &SmsRequest::default()).await;
        assert!(matches!(sms, Err(CoreError::VendorError { .. })));
        assert_eq!(channel.calls.load(Ordering::SeqCst), 2);
    }
}
