use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keystone_core::payment::{
    Metadata, PaymentAdapter, PaymentIntent, PaymentIntentRequest, PaymentRequest, PaymentResponse,
    PaymentStatus, RefundResponse,
};
use keystone_core::{CoreError, CoreResult, RequestContext};
use keystone_shared::Masked;
use keystone_store::app_config::StripeSettings;
use reqwest::Method;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::http::VendorClient;

pub const VENDOR: &str = "stripe";

/// Stripe adapter. Amounts travel as integer minor units.
pub struct StripeAdapter {
    http: VendorClient,
    api_key: Masked<String>,
}

impl StripeAdapter {
    pub fn new(settings: &StripeSettings) -> CoreResult<Self> {
        Ok(Self {
            http: VendorClient::new(VENDOR, &settings.base_url, settings.timeout())?,
            api_key: settings.api_key.clone(),
        })
    }

    fn request(&self, ctx: &RequestContext, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.http.request(ctx, method, path).bearer_auth(self.api_key.expose())
    }

    fn timestamp(&self, ctx: &RequestContext, operation: &str, secs: i64) -> CoreResult<DateTime<Utc>> {
        DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| self.http.invalid(ctx, operation, format!("invalid created timestamp {}", secs)))
    }
}

/// Major units to minor units, rounding half away from zero.
pub fn to_minor_units(amount: Decimal) -> CoreResult<i64> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|cents| cents.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| CoreError::ValidationError(format!("amount {} out of range", amount)))
}

pub fn from_minor_units(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct ChargeBody<'a> {
    amount: i64,
    currency: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer: Option<&'a str>,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    metadata: &'a Metadata,
}

#[derive(Serialize)]
struct IntentBody<'a> {
    amount: i64,
    currency: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer: Option<&'a str>,
}

#[derive(Serialize)]
struct RefundBody<'a> {
    charge: &'a str,
}

#[derive(Deserialize)]
struct Charge {
    id: String,
    status: String,
    amount: i64,
    #[serde(default)]
    currency: String,
    #[serde(default)]
    balance_transaction: Option<String>,
    #[serde(default)]
    created: Option<i64>,
    #[serde(default)]
    metadata: Option<Metadata>,
}

#[derive(Deserialize)]
struct Refund {
    id: String,
    charge: String,
    amount: i64,
    status: String,
    created: i64,
}

#[derive(Deserialize)]
struct Intent {
    id: String,
    client_secret: String,
    status: String,
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

#[async_trait]
impl PaymentAdapter for StripeAdapter {
    fn name(&self) -> &'static str {
        VENDOR
    }

    async fn process_payment(
        &self,
        ctx: &RequestContext,
        request: &PaymentRequest,
    ) -> CoreResult<PaymentResponse> {
        tracing::info!(
            provider = VENDOR,
            operation = "process_payment",
            request_id = %ctx.request_id,
            order_id = %request.order_id,
            amount = %request.amount,
            currency = %request.currency,
            "Processing payment"
        );

        request.validate()?;

        let body = ChargeBody {
            amount: to_minor_units(request.amount)?,
            currency: &request.currency,
            description: &request.description,
            customer: non_empty(&request.customer_id),
            metadata: &request.metadata,
        };

        let charge: Charge = self
            .http
            .send(ctx, "process_payment", self.request(ctx, Method::POST, "/charges").json(&body))
            .await?;

        let created_at = match charge.created {
            Some(secs) => self.timestamp(ctx, "process_payment", secs)?,
            None => Utc::now(),
        };

        let response = PaymentResponse {
            id: charge.id,
            status: charge.status,
            amount: from_minor_units(charge.amount),
            currency: charge.currency,
            transaction_id: charge.balance_transaction.unwrap_or_default(),
            created_at,
            metadata: charge.metadata.filter(|m| !m.is_empty()),
        };

        tracing::info!(
            provider = VENDOR,
            payment_id = %response.id,
            status = %response.status,
            amount = %response.amount,
            "Payment processed"
        );
        Ok(response)
    }

    async fn refund_payment(&self, ctx: &RequestContext, payment_id: &str) -> CoreResult<RefundResponse> {
        tracing::info!(
            provider = VENDOR,
            operation = "refund_payment",
            request_id = %ctx.request_id,
            payment_id,
            "Processing refund"
        );

        let refund: Refund = self
            .http
            .send(
                ctx,
                "refund_payment",
                self.request(ctx, Method::POST, "/refunds")
                    .json(&RefundBody { charge: payment_id }),
            )
            .await?;

        Ok(RefundResponse {
            created_at: self.timestamp(ctx, "refund_payment", refund.created)?,
            id: refund.id,
            payment_id: refund.charge,
            amount: from_minor_units(refund.amount),
            status: refund.status,
        })
    }

    async fn get_payment_status(&self, ctx: &RequestContext, payment_id: &str) -> CoreResult<PaymentStatus> {
        tracing::info!(
            provider = VENDOR,
            operation = "get_payment_status",
            request_id = %ctx.request_id,
            payment_id,
            "Getting payment status"
        );

        let path = format!("/charges/{}", payment_id);
        let charge: Charge = self
            .http
            .send(ctx, "get_payment_status", self.request(ctx, Method::GET, &path))
            .await?;

        Ok(PaymentStatus {
            id: charge.id,
            status: charge.status,
            amount: from_minor_units(charge.amount),
            updated_at: Utc::now(),
        })
    }

    async fn create_payment_intent(
        &self,
        ctx: &RequestContext,
        request: &PaymentIntentRequest,
    ) -> CoreResult<PaymentIntent> {
        tracing::info!(
            provider = VENDOR,
            operation = "create_payment_intent",
            request_id = %ctx.request_id,
            amount = %request.amount,
            currency = %request.currency,
            customer_id = %request.customer_id,
            "Creating payment intent"
        );

        request.validate()?;

        let body = IntentBody {
            amount: to_minor_units(request.amount)?,
            currency: &request.currency,
            description: &request.description,
            customer: non_empty(&request.customer_id),
        };

        let intent: Intent = self
            .http
            .send(
                ctx,
                "create_payment_intent",
                self.request(ctx, Method::POST, "/payment_intents").json(&body),
            )
            .await?;

        Ok(PaymentIntent {
            id: intent.id,
            client_secret: intent.client_secret,
            status: intent.status,
        })
    }
}
