//! Vendor adapters for the payment and notification capabilities, and the
//! factory that picks them from configuration.

pub mod factory;
pub mod http;
pub mod notification;
pub mod payment;

pub use factory::ProviderFactory;
pub use http::VendorClient;
