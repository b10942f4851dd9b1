pub mod context;
pub mod notification;
pub mod payment;
pub mod repository;
pub mod user;

pub use context::RequestContext;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Validation failed: {0}")]
    ValidationError(String),
    /// A vendor call failed: transport error, non-success status or a body we
    /// could not decode. `operation` names the adapter step that failed.
    #[error("{vendor} {operation} failed: {message}")]
    VendorError {
        vendor: &'static str,
        operation: String,
        message: String,
    },
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl CoreError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound { resource, id: id.to_string() }
    }

    pub fn vendor(vendor: &'static str, operation: impl Into<String>, message: impl ToString) -> Self {
        CoreError::VendorError {
            vendor,
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_error_names_vendor_and_operation() {
        let err = CoreError::vendor("stripe", "process_payment", "status 402");
        assert_eq!(err.to_string(), "stripe process_payment failed: status 402");
    }

    #[test]
    fn test_not_found_message() {
        let err = CoreError::not_found("user", 42);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "user not found: 42");
    }
}
