use keystone_core::{CoreError, CoreResult, RequestContext};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

const USER_AGENT: &str = concat!("keystone/", env!("CARGO_PKG_VERSION"));

// Error bodies are logged, not returned; keep the log line bounded.
const MAX_ERROR_BODY: usize = 512;

/// HTTP plumbing shared by every vendor adapter.
///
/// Owns the `reqwest` client (with the adapter's timeout), the vendor base
/// URL and the vendor label. Every failure mode of a round trip comes back as
/// [`CoreError::VendorError`] tagged with the vendor and the operation name.
#[derive(Clone)]
pub struct VendorClient {
    vendor: &'static str,
    base_url: String,
    client: Client,
}

impl VendorClient {
    pub fn new(vendor: &'static str, base_url: &str, timeout: Duration) -> CoreResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CoreError::InternalError(format!("{} http client: {}", vendor, e)))?;

        Ok(Self {
            vendor,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn vendor(&self) -> &'static str {
        self.vendor
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Start a request against `base_url + path`, carrying the request id.
    pub fn request(&self, ctx: &RequestContext, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .header("X-Request-ID", &ctx.request_id)
    }

    /// Send a prepared request and decode a 2xx JSON body into `T`.
    pub async fn send<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        operation: &str,
        request: RequestBuilder,
    ) -> CoreResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| self.fail(ctx, operation, format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            tracing::warn!(
                provider = self.vendor,
                operation,
                request_id = %ctx.request_id,
                status = status.as_u16(),
                body = %body,
                "Vendor returned an error status"
            );
            return Err(self.fail(ctx, operation, format!("unexpected status {}", status.as_u16())));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| self.fail(ctx, operation, format!("invalid response body: {}", e)))
    }

    fn fail(&self, ctx: &RequestContext, operation: &str, message: String) -> CoreError {
        tracing::error!(
            provider = self.vendor,
            operation,
            request_id = %ctx.request_id,
            error = %message,
            "Vendor operation failed"
        );
        CoreError::vendor(self.vendor, operation, message)
    }

    /// Wrap a response-shape problem found after decoding (missing link,
    /// unparseable amount) as a vendor error, logging it the same way.
    pub fn invalid(&self, ctx: &RequestContext, operation: &str, message: impl Into<String>) -> CoreError {
        self.fail(ctx, operation, message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = VendorClient::new("stripe", "https://api.stripe.com/v1/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.url("/charges"), "https://api.stripe.com/v1/charges");
        assert_eq!(client.url("refunds"), "https://api.stripe.com/v1/refunds");
    }
}
