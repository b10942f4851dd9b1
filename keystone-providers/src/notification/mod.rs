pub mod email;
pub mod sms;
pub mod unified;

pub use email::EmailClient;
pub use sms::SmsClient;
pub use unified::UnifiedNotifier;
