use keystone_core::notification::NotificationAdapter;
use keystone_core::payment::PaymentAdapter;
use keystone_core::{CoreError, CoreResult};
use keystone_store::app_config::ProvidersConfig;
use std::sync::Arc;

use crate::notification::{EmailClient, SmsClient, UnifiedNotifier};
use crate::payment::{PayPalAdapter, StripeAdapter};

/// Builds the vendor adapters named in configuration. Called once at startup.
pub struct ProviderFactory {
    config: ProvidersConfig,
}

impl ProviderFactory {
    pub fn new(config: ProvidersConfig) -> Self {
        Self { config }
    }

    /// Reject configurations that cannot take a payment: unknown vendor or
    /// missing credentials. Missing notification keys only warn.
    pub fn validate(&self) -> CoreResult<()> {
        let payment = &self.config.payment;
        match payment.provider.as_str() {
            "stripe" => {
                if payment.stripe.api_key.is_empty() {
                    return Err(CoreError::ValidationError(
                        "stripe api_key is required".to_string(),
                    ));
                }
            }
            "paypal" => {
                if payment.paypal.client_id.is_empty() || payment.paypal.client_secret.is_empty() {
                    return Err(CoreError::ValidationError(
                        "paypal client_id and client_secret are required".to_string(),
                    ));
                }
            }
            other => return Err(unsupported(other)),
        }

        let notification = &self.config.notification;
        if notification.email.api_key.is_empty() {
            tracing::warn!("Email API key not configured, email notifications will fail");
        }
        if notification.sms.api_key.is_empty() {
            tracing::warn!("SMS API key not configured, SMS notifications will fail");
        }
        Ok(())
    }

    pub fn create_payment_adapter(&self) -> CoreResult<Arc<dyn PaymentAdapter>> {
        let payment = &self.config.payment;
        match payment.provider.as_str() {
            "stripe" => {
                tracing::info!(
                    provider = "stripe",
                    base_url = %payment.stripe.base_url,
                    timeout = ?payment.stripe.timeout(),
                    "Initializing payment adapter"
                );
                Ok(Arc::new(StripeAdapter::new(&payment.stripe)?))
            }
            "paypal" => {
                tracing::info!(
                    provider = "paypal",
                    base_url = %payment.paypal.base_url,
                    timeout = ?payment.paypal.timeout(),
                    "Initializing payment adapter"
                );
                Ok(Arc::new(PayPalAdapter::new(&payment.paypal)?))
            }
            other => Err(unsupported(other)),
        }
    }

    pub fn create_notification_adapter(&self) -> CoreResult<Arc<dyn NotificationAdapter>> {
        let notification = &self.config.notification;
        let email = EmailClient::new(&notification.email)?;
        let sms = SmsClient::new(&notification.sms)?;

        tracing::info!(
            email_base_url = %notification.email.base_url,
            sms_base_url = %notification.sms.base_url,
            "Initializing notification adapter"
        );
        Ok(Arc::new(UnifiedNotifier::new(Arc::new(email), Arc::new(sms))))
    }
}

fn unsupported(name: &str) -> CoreError {
    CoreError::ValidationError(format!("unsupported payment provider: {:?}", name))
}
