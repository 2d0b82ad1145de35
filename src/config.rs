use serde::Deserialize;

/// Process configuration, loaded once from the environment at startup.
/// Shared verbatim between the API process and the worker process so the
/// two never disagree about test-mode behavior or backoff tables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub database_url: String,
    #[serde(default)]
    pub test_mode: bool,
    pub test_processing_delay: Option<u64>,
    pub test_payment_success: Option<bool>,
    #[serde(default)]
    pub webhook_retry_intervals_test: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Config {
    /// Loads `.env` (if present) then reads the process environment.
    /// Env vars already set win over `.env`, matching `dotenvy`'s default.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let raw = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;

        raw.try_deserialize()
    }

    /// Whether the webhook deliverer should use the fast test backoff row
    /// instead of the production one.
    pub fn use_test_backoff(&self) -> bool {
        self.test_mode || self.webhook_retry_intervals_test
    }
}
