use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult, RequestContext};

/// Opaque key/value pairs forwarded to vendors untouched.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A charge against a customer for one order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRequest {
    pub order_id: String,
    /// Major currency units (e.g. 99.99 USD).
    pub amount: Decimal,
    pub currency: String,
    pub description: String,
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl PaymentRequest {
    pub fn validate(&self) -> CoreResult<()> {
        validate_amount(self.amount)?;
        validate_currency(&self.currency)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentResponse {
    pub id: String,
    /// Vendor-defined, e.g. "succeeded" (Stripe) or "COMPLETED" (PayPal).
    pub status: String,
    pub amount: Decimal,
    pub currency: String,
    pub transaction_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefundResponse {
    pub id: String,
    pub payment_id: String,
    pub amount: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentStatus {
    pub id: String,
    pub status: String,
    pub amount: Decimal,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentIntentRequest {
    pub amount: Decimal,
    pub currency: String,
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub description: String,
}

impl PaymentIntentRequest {
    pub fn validate(&self) -> CoreResult<()> {
        validate_amount(self.amount)?;
        validate_currency(&self.currency)
    }
}

/// A vendor-side pre-authorization that precedes the charge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentIntent {
    pub id: String,
    /// What the client needs to continue the payment: a client secret for
    /// Stripe, an approval URL for PayPal. Never interpreted server-side.
    pub client_secret: String,
    pub status: String,
}

/// Amounts are positive and expressible in whole cents. Anything finer
/// would be rounded by the vendor wire format, possibly down to zero.
pub fn validate_amount(amount: Decimal) -> CoreResult<()> {
    if amount <= Decimal::ZERO {
        return Err(CoreError::ValidationError(format!(
            "amount must be greater than zero, got {}",
            amount
        )));
    }
    if amount.normalize().scale() > 2 {
        return Err(CoreError::ValidationError(format!(
            "amount must have at most two decimal places, got {}",
            amount
        )));
    }
    Ok(())
}

fn validate_currency(currency: &str) -> CoreResult<()> {
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CoreError::ValidationError(format!(
            "currency must be a three-letter ISO code, got {:?}",
            currency
        )));
    }
    Ok(())
}

/// The payment capability. One implementation per vendor, chosen at startup.
///
/// Every method is a single attempt: no retries and no idempotency keys.
/// Failures come back as [`CoreError::VendorError`].
#[async_trait]
pub trait PaymentAdapter: Send + Sync {
    /// Vendor label used in logs and errors.
    fn name(&self) -> &'static str;

    /// Charge the customer for an order.
    async fn process_payment(
        &self,
        ctx: &RequestContext,
        request: &PaymentRequest,
    ) -> CoreResult<PaymentResponse>;

    /// Refund a previous payment in full.
    async fn refund_payment(
        &self,
        ctx: &RequestContext,
        payment_id: &str,
    ) -> CoreResult<RefundResponse>;

    /// Read-only status lookup.
    async fn get_payment_status(
        &self,
        ctx: &RequestContext,
        payment_id: &str,
    ) -> CoreResult<PaymentStatus>;

    /// Create the pre-authorization the client continues with.
    async fn create_payment_intent(
        &self,
        ctx: &RequestContext,
        request: &PaymentIntentRequest,
    ) -> CoreResult<PaymentIntent>;
}
