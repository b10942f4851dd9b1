use uuid::Uuid;

/// Per-request correlation data, passed explicitly down the call chain.
///
/// The HTTP layer builds one per inbound request; the order workflow copies it
/// into detached notification tasks so their log lines still carry the
/// originating request id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub request_id: String,
    pub user_id: Option<i64>,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            user_id: None,
        }
    }

    /// A context with a fresh request id, for work that did not start from an
    /// HTTP request (startup checks, tests).
    pub fn background() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::background()
    }
}
