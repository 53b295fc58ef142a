/// Application configuration module
use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub nasa_api_key: String,
    pub endpoint_timeout: Duration,
    pub cache: CacheSettings,
    pub analysis: AnalysisSettings,
}

#[derive(Clone, Debug)]
pub struct CacheSettings {
    pub max_entries: usize,
    pub ttl: Duration,
}

#[derive(Clone, Debug)]
pub struct AnalysisSettings {
    pub delay: Duration,
    pub timeout: Duration,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let nasa_api_key = env::var("NASA_API_KEY").unwrap_or_default();

        let cache = CacheSettings {
            max_entries: (env_u64("CACHE_MAX_ENTRIES", 256) as usize).max(1),
            ttl: Duration::from_secs(env_u64("CACHE_TTL_SECONDS", 3600)),
        };

        let analysis = AnalysisSettings {
            delay: Duration::from_millis(env_u64("ANALYSIS_DELAY_MS", 1500)),
            timeout: Duration::from_millis(env_u64("ANALYSIS_TIMEOUT_MS", 10_000)),
        };

        Ok(Self {
            bind_addr,
            nasa_api_key,
            endpoint_timeout: Duration::from_millis(env_u64("ENDPOINT_TIMEOUT_MS", 8000)),
            cache,
            analysis,
        })
    }

    /// Key sent upstream; NASA accepts `DEMO_KEY` for low-volume use
    pub fn api_key(&self) -> &str {
        if self.nasa_api_key.is_empty() {
            "DEMO_KEY"
        } else {
            &self.nasa_api_key
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            nasa_api_key: String::new(),
            endpoint_timeout: Duration::from_millis(8000),
            cache: CacheSettings {
                max_entries: 256,
                ttl: Duration::from_secs(3600),
            },
            analysis: AnalysisSettings {
                delay: Duration::from_millis(1500),
                timeout: Duration::from_millis(10_000),
            },
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
