pub mod models;
pub mod pii;

pub use models::notice::NoticeKind;
pub use pii::Masked;
