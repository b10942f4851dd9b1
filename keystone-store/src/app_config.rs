use keystone_shared::Masked;
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Postgres connection string. When absent the service runs on the
    /// in-memory user store.
    pub url: Option<Masked<String>>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: Masked<String>,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 100,
            burst: 20,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProvidersConfig {
    pub payment: PaymentProvidersConfig,
    #[serde(default)]
    pub notification: NotificationProvidersConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentProvidersConfig {
    /// "stripe" or "paypal".
    pub provider: String,
    #[serde(default)]
    pub stripe: StripeSettings,
    #[serde(default)]
    pub paypal: PayPalSettings,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NotificationProvidersConfig {
    #[serde(default)]
    pub email: EmailSettings,
    #[serde(default)]
    pub sms: SmsSettings,
}

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StripeSettings {
    pub base_url: String,
    pub api_key: Masked<String>,
    pub timeout_seconds: u64,
}

impl Default for StripeSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.stripe.com/v1".to_string(),
            api_key: Masked::default(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl StripeSettings {
    pub fn timeout(&self) -> Duration {
        timeout_or_default(self.timeout_seconds)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PayPalSettings {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: Masked<String>,
    pub timeout_seconds: u64,
}

impl Default for PayPalSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.paypal.com".to_string(),
            client_id: String::new(),
            client_secret: Masked::default(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl PayPalSettings {
    pub fn timeout(&self) -> Duration {
        timeout_or_default(self.timeout_seconds)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmailSettings {
    pub base_url: String,
    pub api_key: Masked<String>,
    pub from_address: String,
    pub timeout_seconds: u64,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.mailgun.net/v3".to_string(),
            api_key: Masked::default(),
            from_address: "noreply@keystone.local".to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl EmailSettings {
    pub fn timeout(&self) -> Duration {
        timeout_or_default(self.timeout_seconds)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SmsSettings {
    pub base_url: String,
    pub api_key: Masked<String>,
    pub from_number: String,
    pub timeout_seconds: u64,
}

impl Default for SmsSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.twilio.com/2010-04-01".to_string(),
            api_key: Masked::default(),
            from_number: "+1234567890".to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl SmsSettings {
    pub fn timeout(&self) -> Duration {
        timeout_or_default(self.timeout_seconds)
    }
}

// A zero timeout would make every vendor call fail instantly.
fn timeout_or_default(seconds: u64) -> Duration {
    if seconds == 0 {
        Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)
    } else {
        Duration::from_secs(seconds)
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `KEYSTONE_PROVIDERS__PAYMENT__PROVIDER=paypal`
            .add_source(config::Environment::with_prefix("KEYSTONE").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Build a config from an inline TOML document, without touching the
    /// filesystem or environment.
    pub fn from_toml(source: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [server]
        port = 8080

        [auth]
        jwt_secret = "dev-secret"
        jwt_expiration_seconds = 86400

        [providers.payment]
        provider = "stripe"

        [providers.payment.stripe]
        api_key = "sk_test_123"
    "#;

    #[test]
    fn test_minimal_config_fills_defaults() {
        let config = Config::from_toml(MINIMAL).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.database.url.is_none());
        assert_eq!(config.rate_limit.requests_per_second, 100);
        assert_eq!(config.providers.payment.provider, "stripe");
        assert_eq!(config.providers.payment.stripe.base_url, "https://api.stripe.com/v1");
        assert_eq!(config.providers.payment.stripe.timeout(), Duration::from_secs(30));
        assert_eq!(config.providers.notification.email.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_secrets_are_masked_in_debug_output() {
        let config = Config::from_toml(MINIMAL).unwrap();
        let dump = format!("{:?}", config);

        assert!(!dump.contains("sk_test_123"));
        assert!(!dump.contains("dev-secret"));
        assert_eq!(config.providers.payment.stripe.api_key.expose(), "sk_test_123");
    }

    #[test]
    fn test_zero_timeout_falls_back_to_default() {
        let settings = SmsSettings {
            timeout_seconds: 0,
            ..SmsSettings::default()
        };
        assert_eq!(settings.timeout(), Duration::from_secs(30));
    }
}
