use keystone_core::notification::{EmailRequest, NotificationAdapter};
use keystone_core::RequestContext;
use keystone_shared::NoticeKind;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Fire-and-forget email delivery.
///
/// Each notice runs on its own spawned task, detached from the request that
/// produced it: the caller never waits for the vendor, and the send carries on
/// if the request future is dropped. Failures are logged and go nowhere else.
#[derive(Clone)]
pub struct NotificationDispatcher {
    adapter: Arc<dyn NotificationAdapter>,
}

impl NotificationDispatcher {
    pub fn new(adapter: Arc<dyn NotificationAdapter>) -> Self {
        Self { adapter }
    }

    /// Spawn the send. The handle is only useful to tests; dropping it does
    /// not cancel the task.
    pub fn dispatch(&self, ctx: &RequestContext, kind: NoticeKind, email: EmailRequest) -> JoinHandle<()> {
        let adapter = Arc::clone(&self.adapter);
        let ctx = ctx.clone();

        tokio::spawn(async move {
            match adapter.send_email(&ctx, &email).await {
                Ok(response) => tracing::info!(
                    request_id = %ctx.request_id,
                    notice = %kind,
                    email_id = %response.id,
                    "Notification sent"
                ),
                Err(e) => tracing::error!(
                    request_id = %ctx.request_id,
                    notice = %kind,
                    error = %e,
                    "Failed to send notification"
                ),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use keystone_core::notification::{
        EmailResponse, PushNotificationRequest, PushNotificationResponse, SmsRequest, SmsResponse,
    };
    use keystone_core::{CoreError, CoreResult};

    struct FailingNotifier;

    #[async_trait]
    impl NotificationAdapter for FailingNotifier {
        async fn send_email(&self, _: &RequestContext, _: &EmailRequest) -> CoreResult<EmailResponse> {
            Err(CoreError::vendor("email_service", "send_email", "unexpected status 503"))
        }

        async fn send_sms(&self, _: &RequestContext, _: &SmsRequest) -> CoreResult<SmsResponse> {
            Err(CoreError::InternalError("unused".to_string()))
        }

        async fn send_push_notification(
            &self,
            _: &RequestContext,
            _: &PushNotificationRequest,
        ) -> CoreResult<PushNotificationResponse> {
            Err(CoreError::InternalError("unused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_send_failure_is_swallowed() {
        let dispatcher = NotificationDispatcher::new(Arc::new(FailingNotifier));
        let handle = dispatcher.dispatch(
            &RequestContext::background(),
            NoticeKind::PaymentFailure,
            EmailRequest::default(),
        );

        // The task completes normally; the error never escapes it.
        assert!(handle.await.is_ok());
    }
}
