use keystone_core::notification::EmailRequest;
use keystone_core::payment::Metadata;
use keystone_core::user::User;
use keystone_shared::NoticeKind;
use rust_decimal::Decimal;
use serde_json::json;

const SIGNATURE: &str = "Best regards,\nKeystone Team";

fn base(kind: NoticeKind, user: &User, body: String, mut metadata: Metadata) -> EmailRequest {
    metadata.insert("user_id".to_string(), json!(user.id));
    metadata.insert("type".to_string(), json!(kind.as_str()));
    EmailRequest {
        to: vec![user.email.clone()],
        subject: kind.subject().to_string(),
        body,
        metadata,
        ..EmailRequest::default()
    }
}

pub fn order_confirmation(
    user: &User,
    order_id: &str,
    payment_id: &str,
    amount: Decimal,
    currency: &str,
) -> EmailRequest {
    let body = format!(
        "Hello {},\n\nYour order has been confirmed!\n\nOrder Details:\n\
         - Order ID: {}\n- Payment ID: {}\n- Amount: {:.2} {}\n- Status: Completed\n\n\
         Thank you for your business!\n\n{}",
        user.username, order_id, payment_id, amount, currency, SIGNATURE
    );

    let mut metadata = Metadata::new();
    metadata.insert("order_id".to_string(), json!(order_id));
    metadata.insert("payment_id".to_string(), json!(payment_id));
    base(NoticeKind::OrderConfirmation, user, body, metadata)
}

pub fn payment_failure(user: &User, order_id: &str, reason: &str) -> EmailRequest {
    let body = format!(
        "Hello {},\n\nWe encountered an issue processing your payment for order {}.\n\n\
         Please try again or contact our support team.\n\nError: {}\n\n{}",
        user.username, order_id, reason, SIGNATURE
    );

    let mut metadata = Metadata::new();
    metadata.insert("order_id".to_string(), json!(order_id));
    base(NoticeKind::PaymentFailure, user, body, metadata)
}

pub fn refund_confirmation(user: &User, payment_id: &str, refund_id: &str) -> EmailRequest {
    let body = format!(
        "Hello {},\n\nYour refund has been processed successfully.\n\nRefund Details:\n\
         - Original Payment ID: {}\n- Refund ID: {}\n\n\
         The refund will appear in your account within 3-5 business days.\n\n{}",
        user.username, payment_id, refund_id, SIGNATURE
    );

    let mut metadata = Metadata::new();
    metadata.insert("payment_id".to_string(), json!(payment_id));
    metadata.insert("refund_id".to_string(), json!(refund_id));
    base(NoticeKind::RefundConfirmation, user, body, metadata)
}
