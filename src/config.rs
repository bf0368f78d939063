use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_CURRENCY: &str = "INR";
const DEFAULT_COD_EXPIRY_MINUTES: i64 = 15;
const DEFAULT_CACHE_CAPACITY: usize = 1000;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}
fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}
fn default_cod_expiry_minutes() -> i64 {
    DEFAULT_COD_EXPIRY_MINUTES
}
fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}
fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}
fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_shipping_rate() -> rust_decimal::Decimal {
    rust_decimal::Decimal::new(7000, 2) // 70.00
}

/// Carrier rate provider settings
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct ShippingConfig {
    pub base_url: String,
    pub api_token: String,
    /// Origin postal code packages ship from
    #[validate(length(min = 4))]
    pub pickup_postal_code: String,
    /// Flat rate charged when the carrier API cannot be reached
    #[serde(default = "default_shipping_rate")]
    pub fallback_rate: rust_decimal::Decimal,
}

impl Default for ShippingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://carrier.example.com".to_string(),
            api_token: String::new(),
            pickup_postal_code: "400001".to_string(),
            fallback_rate: default_shipping_rate(),
        }
    }
}

/// Payment provider (hosted order + client handoff) settings
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct PaymentConfig {
    pub base_url: String,
    /// Publishable key returned to the client for the payment sheet
    pub key_id: String,
    pub key_secret: String,
    pub webhook_secret: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.payments.example.com".to_string(),
            key_id: String::new(),
            key_secret: String::new(),
            webhook_secret: String::new(),
        }
    }
}

/// Transactional email channel settings
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct EmailConfig {
    pub base_url: String,
    pub api_key: String,
    #[validate(email)]
    pub from_address: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            base_url: "https://mail.example.com".to_string(),
            api_key: String::new(),
            from_address: "orders@storefront.example".to_string(),
        }
    }
}

/// In-memory cache settings (shipping rate quotes)
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct CacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
    #[serde(default = "default_cache_ttl_secs")]
    pub default_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            default_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Application configuration with validation
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,

    #[serde(default)]
    pub auto_migrate: bool,

    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// ISO currency code orders are charged in
    #[serde(default = "default_currency")]
    #[validate(length(equal = 3))]
    pub currency: String,

    /// State the business ships from; the intra-state GST boundary
    #[validate(length(min = 2))]
    pub business_state: String,

    /// Minutes a COD verification code stays valid
    #[serde(default = "default_cod_expiry_minutes")]
    pub cod_expiry_minutes: i64,

    #[serde(default)]
    #[validate]
    pub shipping: ShippingConfig,

    #[serde(default)]
    #[validate]
    pub payment: PaymentConfig,

    #[serde(default)]
    #[validate]
    pub email: EmailConfig,

    #[serde(default)]
    #[validate]
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Minimal constructor used by tests and local tooling.
    pub fn new(database_url: String, host: String, port: u16, business_state: String) -> Self {
        Self {
            database_url,
            host,
            port,
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            currency: default_currency(),
            business_state,
            cod_expiry_minutes: default_cod_expiry_minutes(),
            shipping: ShippingConfig::default(),
            payment: PaymentConfig::default(),
            email: EmailConfig::default(),
            cache: CacheConfig::default(),
        }
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn cache_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cache.default_ttl_secs)
    }

    pub fn cod_expiry(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.cod_expiry_minutes)
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Loads configuration from `config/{env}.toml` layered under
/// `APP__`-prefixed environment variables.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    let mut builder = Config::builder();

    if Path::new(CONFIG_DIR).exists() {
        builder = builder
            .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
            .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false));
    }

    let settings = builder
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Initializes the global tracing subscriber.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("storefront_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);
    let filter = EnvFilter::try_new(filter_directive).unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init()
            .ok();
    }
}
