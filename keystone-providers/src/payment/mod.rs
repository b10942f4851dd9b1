pub mod paypal;
pub mod stripe;

pub use paypal::PayPalAdapter;
pub use stripe::StripeAdapter;
