use chrono::Utc;
use keystone_core::notification::NotificationAdapter;
use keystone_core::payment::{
    Metadata, PaymentAdapter, PaymentIntent, PaymentIntentRequest, PaymentRequest, PaymentStatus,
    RefundResponse,
};
use keystone_core::repository::UserRepository;
use keystone_core::user::User;
use keystone_core::{CoreError, CoreResult, RequestContext};
use keystone_shared::NoticeKind;
use serde_json::json;
use std::sync::Arc;

use crate::dispatch::NotificationDispatcher;
use crate::models::{CreateOrderRequest, OrderResponse, OrderStatus, RefundOrderRequest};
use crate::notices;

/// Order processing: user lookup, payment intent, charge, then a detached
/// notice.
///
/// Every vendor call is attempted once. Lookup, intent, charge and refund
/// failures end the call; notification failures are only logged.
pub struct OrderWorkflow {
    users: Arc<dyn UserRepository>,
    payments: Arc<dyn PaymentAdapter>,
    notifier: NotificationDispatcher,
}

impl OrderWorkflow {
    pub fn new(
        users: Arc<dyn UserRepository>,
        payments: Arc<dyn PaymentAdapter>,
        notifications: Arc<dyn NotificationAdapter>,
    ) -> Self {
        Self {
            users,
            payments,
            notifier: NotificationDispatcher::new(notifications),
        }
    }

    async fn find_user(&self, user_id: i64) -> CoreResult<User> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("user", user_id))
    }

    pub async fn process_order(
        &self,
        ctx: &RequestContext,
        user_id: i64,
        request: &CreateOrderRequest,
    ) -> CoreResult<OrderResponse> {
        request.validate()?;
        tracing::info!(
            request_id = %ctx.request_id,
            user_id,
            order_id = %request.order_id,
            amount = %request.amount,
            currency = %request.currency,
            provider = self.payments.name(),
            "Processing order"
        );

        let user = self.find_user(user_id).await?;

        let intent_request = PaymentIntentRequest {
            amount: request.amount,
            currency: request.currency.clone(),
            customer_id: user.id.to_string(),
            description: format!("Order for user {}", user.username),
        };

        let mut metadata = Metadata::new();
        metadata.insert("user_id".to_string(), json!(user.id));
        metadata.insert("username".to_string(), json!(user.username));
        metadata.insert("order_id".to_string(), json!(request.order_id));

        let charge = PaymentRequest {
            order_id: request.order_id.clone(),
            amount: request.amount,
            currency: request.currency.clone(),
            description: format!("Order {} for {}", request.order_id, user.username),
            customer_id: user.id.to_string(),
            metadata,
        };

        // Both vendor payloads are checked before the first vendor call.
        intent_request.validate()?;
        charge.validate()?;

        let intent = self
            .payments
            .create_payment_intent(ctx, &intent_request)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    request_id = %ctx.request_id,
                    order_id = %request.order_id,
                    error = %e,
                    "Failed to create payment intent"
                )
            })?;

        let payment = match self.payments.process_payment(ctx, &charge).await {
            Ok(payment) => payment,
            Err(e) => {
                tracing::error!(
                    request_id = %ctx.request_id,
                    order_id = %request.order_id,
                    payment_intent_id = %intent.id,
                    error = %e,
                    "Payment failed"
                );
                self.notifier.dispatch(
                    ctx,
                    NoticeKind::PaymentFailure,
                    notices::payment_failure(&user, &request.order_id, &e.to_string()),
                );
                return Err(e);
            }
        };

        self.notifier.dispatch(
            ctx,
            NoticeKind::OrderConfirmation,
            notices::order_confirmation(
                &user,
                &request.order_id,
                &payment.id,
                request.amount,
                &request.currency,
            ),
        );

        tracing::info!(
            request_id = %ctx.request_id,
            order_id = %request.order_id,
            payment_id = %payment.id,
            payment_intent_id = %intent.id,
            "Order completed"
        );

        Ok(OrderResponse {
            order_id: request.order_id.clone(),
            payment_id: payment.id,
            payment_intent_id: intent.id,
            status: OrderStatus::Completed,
            amount: request.amount,
            currency: request.currency.clone(),
            processed_at: Utc::now(),
            user,
        })
    }

    pub async fn refund_order(
        &self,
        ctx: &RequestContext,
        user_id: i64,
        request: &RefundOrderRequest,
    ) -> CoreResult<RefundResponse> {
        request.validate()?;
        tracing::info!(
            request_id = %ctx.request_id,
            user_id,
            payment_id = %request.payment_id,
            reason = request.reason.as_deref().unwrap_or(""),
            "Processing refund"
        );

        let user = self.find_user(user_id).await?;

        let refund = self
            .payments
            .refund_payment(ctx, &request.payment_id)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    request_id = %ctx.request_id,
                    payment_id = %request.payment_id,
                    error = %e,
                    "Refund failed"
                )
            })?;

        self.notifier.dispatch(
            ctx,
            NoticeKind::RefundConfirmation,
            notices::refund_confirmation(&user, &request.payment_id, &refund.id),
        );

        tracing::info!(
            request_id = %ctx.request_id,
            payment_id = %request.payment_id,
            refund_id = %refund.id,
            "Refund completed"
        );
        Ok(refund)
    }

    pub async fn get_payment_status(&self, ctx: &RequestContext, payment_id: &str) -> CoreResult<PaymentStatus> {
        if payment_id.trim().is_empty() {
            return Err(CoreError::ValidationError("payment_id is required".to_string()));
        }
        self.payments.get_payment_status(ctx, payment_id).await
    }

    /// Intent for the caller. The customer on the intent is always the
    /// caller's id, whatever the request says.
    pub async fn create_payment_intent(
        &self,
        ctx: &RequestContext,
        user_id: i64,
        request: &PaymentIntentRequest,
    ) -> CoreResult<PaymentIntent> {
        request.validate()?;
        let user = self.find_user(user_id).await?;

        let request = PaymentIntentRequest {
            customer_id: user.id.to_string(),
            description: if request.description.is_empty() {
                format!("Payment intent for user {}", user.username)
            } else {
                request.description.clone()
            },
            ..request.clone()
        };
        self.payments.create_payment_intent(ctx, &request).await
    }
}
