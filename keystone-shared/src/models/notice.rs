use serde::{Deserialize, Serialize};

/// The customer-facing notices the order workflow sends.
///
/// The snake_case name travels as the `type` entry of the email metadata so
/// vendors (and whoever reads their dashboards) can group messages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    OrderConfirmation,
    PaymentFailure,
    RefundConfirmation,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeKind::OrderConfirmation => "order_confirmation",
            NoticeKind::PaymentFailure => "payment_failure",
            NoticeKind::RefundConfirmation => "refund_confirmation",
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            NoticeKind::OrderConfirmation => "Order Confirmation",
            NoticeKind::PaymentFailure => "Payment Failed",
            NoticeKind::RefundConfirmation => "Refund Processed",
        }
    }
}

impl std::fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_name_matches_metadata_tag() {
        for kind in [
            NoticeKind::OrderConfirmation,
            NoticeKind::PaymentFailure,
            NoticeKind::RefundConfirmation,
        ] {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, serde_json::Value::String(kind.as_str().to_string()));
        }
    }
}
