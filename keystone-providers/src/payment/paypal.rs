use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use keystone_core::payment::{
    PaymentAdapter, PaymentIntent, PaymentIntentRequest, PaymentRequest, PaymentResponse,
    PaymentStatus, RefundResponse,
};
use keystone_core::{CoreResult, RequestContext};
use keystone_shared::Masked;
use keystone_store::app_config::PayPalSettings;
use reqwest::Method;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tokio::sync::RwLock;

use crate::http::VendorClient;

pub const VENDOR: &str = "paypal";

/// Tokens are refreshed this long before PayPal says they expire.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;
// Longest we trust a token, however long the vendor says it lives.
const MAX_TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

// ============================================================================
// Token cache
// ============================================================================

#[derive(Clone)]
struct CachedToken {
    access_token: Masked<String>,
    expires_at: DateTime<Utc>,
}

/// OAuth access token shared by all calls of one adapter.
///
/// Readers take the read lock only. A caller that finds the token stale
/// fetches a new one without holding any lock, so two concurrent callers may
/// both refresh; the last write wins and both tokens are valid.
#[derive(Default)]
pub struct TokenCache {
    slot: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached token if it is still fresh at `now`.
    pub async fn get(&self, now: DateTime<Utc>) -> Option<String> {
        self.slot
            .read()
            .await
            .as_ref()
            .filter(|t| now < t.expires_at)
            .map(|t| t.access_token.expose().clone())
    }

    /// Cache a token for `expires_in` seconds minus the safety margin. The
    /// lifetime is clamped to `[0, MAX_TOKEN_LIFETIME_SECS]` whatever the
    /// vendor sends.
    pub async fn store(&self, access_token: String, expires_in: i64, now: DateTime<Utc>) {
        let lifetime = expires_in
            .saturating_sub(TOKEN_EXPIRY_MARGIN_SECS)
            .clamp(0, MAX_TOKEN_LIFETIME_SECS);
        let expires_at = now
            .checked_add_signed(ChronoDuration::seconds(lifetime))
            .unwrap_or(now);
        *self.slot.write().await = Some(CachedToken {
            access_token: Masked(access_token),
            expires_at,
        });
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize, Deserialize)]
struct Money {
    currency_code: String,
    value: String,
}

#[derive(Serialize)]
struct CheckoutOrderBody<'a> {
    intent: &'static str,
    purchase_units: Vec<PurchaseUnitBody<'a>>,
}

#[derive(Serialize)]
struct PurchaseUnitBody<'a> {
    amount: Money,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Deserialize)]
struct CheckoutOrder {
    id: String,
    status: String,
    #[serde(default)]
    links: Vec<Link>,
}

#[derive(Deserialize)]
struct Link {
    href: String,
    rel: String,
}

#[derive(Deserialize)]
struct CapturedOrder {
    id: String,
    #[serde(default)]
    purchase_units: Vec<CapturedUnit>,
}

#[derive(Deserialize)]
struct CapturedUnit {
    payments: CapturedPayments,
}

#[derive(Deserialize)]
struct CapturedPayments {
    #[serde(default)]
    captures: Vec<Capture>,
}

/// A capture or refund resource; both carry id, status and amount.
#[derive(Deserialize)]
struct Capture {
    id: String,
    status: String,
    amount: Money,
}

fn format_amount(amount: Decimal) -> String {
    format!(
        "{:.2}",
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

// ============================================================================
// Adapter
// ============================================================================

/// PayPal adapter: OAuth client credentials, decimal-string amounts.
pub struct PayPalAdapter {
    http: VendorClient,
    client_id: String,
    client_secret: Masked<String>,
    token: TokenCache,
}

impl PayPalAdapter {
    pub fn new(settings: &PayPalSettings) -> CoreResult<Self> {
        Ok(Self {
            http: VendorClient::new(VENDOR, &settings.base_url, settings.timeout())?,
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            token: TokenCache::new(),
        })
    }

    async fn access_token(&self, ctx: &RequestContext) -> CoreResult<String> {
        if let Some(token) = self.token.get(Utc::now()).await {
            return Ok(token);
        }

        tracing::debug!(provider = VENDOR, request_id = %ctx.request_id, "Refreshing access token");

        let request = self
            .http
            .request(ctx, Method::POST, "/v1/oauth2/token")
            .basic_auth(&self.client_id, Some(self.client_secret.expose()))
            .form(&[("grant_type", "client_credentials")]);

        let response: TokenResponse = self.http.send(ctx, "get_access_token", request).await?;
        self.token
            .store(response.access_token.clone(), response.expires_in, Utc::now())
            .await;
        Ok(response.access_token)
    }

    async fn request(
        &self,
        ctx: &RequestContext,
        method: Method,
        path: &str,
    ) -> CoreResult<reqwest::RequestBuilder> {
        let token = self.access_token(ctx).await?;
        Ok(self
            .http
            .request(ctx, method, path)
            .bearer_auth(token)
            .header("Accept", "application/json"))
    }

    async fn create_checkout_order(
        &self,
        ctx: &RequestContext,
        operation: &str,
        body: &CheckoutOrderBody<'_>,
    ) -> CoreResult<CheckoutOrder> {
        let request = self
            .request(ctx, Method::POST, "/v2/checkout/orders")
            .await?
            .json(body);
        self.http.send(ctx, operation, request).await
    }

    fn parse_amount(&self, ctx: &RequestContext, operation: &str, value: &str) -> CoreResult<Decimal> {
        Decimal::from_str(value)
            .map_err(|e| self.http.invalid(ctx, operation, format!("invalid amount {:?}: {}", value, e)))
    }
}

#[async_trait]
impl PaymentAdapter for PayPalAdapter {
    fn name(&self) -> &'static str {
        VENDOR
    }

    /// Creates a checkout order and captures it straight away. Both calls
    /// must succeed; there is no buyer-approval step in between.
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

        let body = CheckoutOrderBody {
            intent: "CAPTURE",
            purchase_units: vec![PurchaseUnitBody {
                amount: Money {
                    currency_code: request.currency.clone(),
                    value: format_amount(request.amount),
                },
                description: &request.description,
                reference_id: Some(&request.order_id),
            }],
        };
        let order = self.create_checkout_order(ctx, "process_payment", &body).await?;

        let path = format!("/v2/checkout/orders/{}/capture", order.id);
        let request = self
            .request(ctx, Method::POST, &path)
            .await?
            .json(&serde_json::json!({}));
        let captured: CapturedOrder = self.http.send(ctx, "capture_order", request).await?;

        let capture = captured
            .purchase_units
            .into_iter()
            .flat_map(|unit| unit.payments.captures)
            .next()
            .ok_or_else(|| self.http.invalid(ctx, "capture_order", "response has no capture"))?;

        let response = PaymentResponse {
            amount: self.parse_amount(ctx, "capture_order", &capture.amount.value)?,
            id: capture.id,
            status: capture.status,
            currency: capture.amount.currency_code,
            transaction_id: captured.id,
            created_at: Utc::now(),
            metadata: None,
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

        let path = format!("/v2/payments/captures/{}/refund", payment_id);
        let request = self
            .request(ctx, Method::POST, &path)
            .await?
            .json(&serde_json::json!({}));
        let refund: Capture = self.http.send(ctx, "refund_payment", request).await?;

        Ok(RefundResponse {
            amount: self.parse_amount(ctx, "refund_payment", &refund.amount.value)?,
            id: refund.id,
            payment_id: payment_id.to_string(),
            status: refund.status,
            created_at: Utc::now(),
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

        let path = format!("/v2/payments/captures/{}", payment_id);
        let request = self.request(ctx, Method::GET, &path).await?;
        let capture: Capture = self.http.send(ctx, "get_payment_status", request).await?;

        Ok(PaymentStatus {
            amount: self.parse_amount(ctx, "get_payment_status", &capture.amount.value)?,
            id: capture.id,
            status: capture.status,
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

        let body = CheckoutOrderBody {
            intent: "CAPTURE",
            purchase_units: vec![PurchaseUnitBody {
                amount: Money {
                    currency_code: request.currency.clone(),
                    value: format_amount(request.amount),
                },
                description: &request.description,
                reference_id: None,
            }],
        };
        let order = self
            .create_checkout_order(ctx, "create_payment_intent", &body)
            .await?;

        let approve = order
            .links
            .into_iter()
            .find(|link| link.rel == "approve")
            .ok_or_else(|| {
                self.http
                    .invalid(ctx, "create_payment_intent", "response has no approve link")
            })?;

        Ok(PaymentIntent {
            id: order.id,
            client_secret: approve.href,
            status: order.status,
        })
    }
}
