use chrono::{DateTime, Utc};
use keystone_core::payment::validate_amount;
use keystone_core::user::User;
use keystone_core::{CoreError, CoreResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Body of `POST /orders`. The paying user is the authenticated caller, not
/// a field of the request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateOrderRequest {
    pub order_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub user_email: String,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> CoreResult<()> {
        if self.order_id.trim().is_empty() {
            return Err(CoreError::ValidationError("order_id is required".to_string()));
        }
        validate_amount(self.amount)?;
        if self.currency.trim().is_empty() {
            return Err(CoreError::ValidationError("currency is required".to_string()));
        }
        if !self.user_email.contains('@') {
            return Err(CoreError::ValidationError(
                "user_email must be a valid email address".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefundOrderRequest {
    pub payment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RefundOrderRequest {
    pub fn validate(&self) -> CoreResult<()> {
        if self.payment_id.trim().is_empty() {
            return Err(CoreError::ValidationError("payment_id is required".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Completed,
}

/// The outcome of a successful order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderResponse {
    pub order_id: String,
    pub payment_id: String,
    pub payment_intent_id: String,
    pub status: OrderStatus,
    pub amount: Decimal,
    pub currency: String,
    pub processed_at: DateTime<Utc>,
    pub user: User,
}
