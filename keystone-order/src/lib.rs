pub mod dispatch;
pub mod models;
pub mod notices;
pub mod workflow;

pub use dispatch::NotificationDispatcher;
pub use models::{CreateOrderRequest, OrderResponse, OrderStatus, RefundOrderRequest};
pub use workflow::OrderWorkflow;
