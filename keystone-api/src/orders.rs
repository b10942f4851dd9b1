use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use keystone_core::payment::{PaymentIntent, PaymentIntentRequest, PaymentStatus, RefundResponse};
use keystone_core::RequestContext;
use keystone_order::{CreateOrderRequest, OrderResponse, RefundOrderRequest};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::middleware::Claims;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/payment/{id}/status", get(payment_status))
        .route("/refund", post(refund_order))
        .route("/payment-intent", post(create_payment_intent))
}

async fn create_order(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<CreateOrderRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let result = state.orders.process_order(&ctx, claims.user_id, &req).await;
    state.metrics.record_order("process_order", result.is_ok());
    Ok(Json(result?))
}

async fn payment_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(payment_id): Path<String>,
) -> Result<Json<PaymentStatus>, AppError> {
    let status = state.orders.get_payment_status(&ctx, &payment_id).await?;
    Ok(Json(status))
}

async fn refund_order(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<RefundOrderRequest>,
) -> Result<Json<RefundResponse>, AppError> {
    let result = state.orders.refund_order(&ctx, claims.user_id, &req).await;
    state.metrics.record_order("refund_order", result.is_ok());
    Ok(Json(result?))
}

async fn create_payment_intent(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<PaymentIntentRequest>,
) -> Result<Json<PaymentIntent>, AppError> {
    let intent = state
        .orders
        .create_payment_intent(&ctx, claims.user_id, &req)
        .await?;
    Ok(Json(intent))
}
