use std::time::Duration;

#[derive(Debug, Clone)]
pub struct NutritionApiConfig {
    pub base_url: String,
    pub language: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

impl NutritionApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for NutritionApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://world.openfoodfacts.org".into(),
            language: "es".into(),
            user_agent: concat!("smartcloth/", env!("CARGO_PKG_VERSION")).into(),
            timeout_secs: 10,
            max_retries: 3,
            initial_backoff_ms: 200,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub request_timeout_secs: u64,
    // Total time all catalog lookups of one request may take.
    pub lookup_budget_secs: u64,
    pub nutrition: NutritionApiConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let defaults = NutritionApiConfig::default();
        let nutrition = NutritionApiConfig {
            base_url: std::env::var("OFF_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            language: std::env::var("OFF_LANGUAGE").unwrap_or(defaults.language),
            user_agent: std::env::var("OFF_USER_AGENT").unwrap_or(defaults.user_agent),
            timeout_secs: env_parse("OFF_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
            max_retries: env_parse("OFF_MAX_RETRIES").unwrap_or(defaults.max_retries),
            initial_backoff_ms: env_parse("OFF_INITIAL_BACKOFF_MS")
                .unwrap_or(defaults.initial_backoff_ms),
        };
        Self {
            database_url,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS").unwrap_or(10),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS").unwrap_or(30),
            lookup_budget_secs: env_parse("OFF_LOOKUP_BUDGET_SECS").unwrap_or(20),
            nutrition,
        }
        .checked()
    }

    /// The lookup budget has to run out before the request timeout does.
    pub fn checked(self) -> anyhow::Result<Self> {
        if self.lookup_budget_secs == 0 || self.lookup_budget_secs >= self.request_timeout_secs {
            anyhow::bail!(
                "OFF_LOOKUP_BUDGET_SECS ({}) must be between 1 and REQUEST_TIMEOUT_SECS ({}) - 1",
                self.lookup_budget_secs,
                self.request_timeout_secs
            );
        }
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn lookup_budget(&self) -> Duration {
        Duration::from_secs(self.lookup_budget_secs)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
