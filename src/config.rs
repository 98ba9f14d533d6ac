use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_days: i64,
}

/// Upstream feed providers: base URLs are overridable so tests can point
/// adapters at a mock server; API keys are all optional.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub coingecko_base_url: String,
    pub coingecko_api_key: Option<String>,
    pub cryptopanic_base_url: String,
    pub cryptopanic_api_key: Option<String>,
    pub reddit_base_url: String,
    pub openai_base_url: String,
    pub openai_api_key: Option<String>,
    pub upstream_timeout_secs: u64,
    pub prices_ttl_secs: u64,
    pub news_ttl_secs: u64,
    pub meme_ttl_secs: u64,
    pub insight_ttl_secs: u64,
}

impl FeedConfig {
    pub fn prices_ttl(&self) -> Duration {
        Duration::from_secs(self.prices_ttl_secs)
    }
    pub fn news_ttl(&self) -> Duration {
        Duration::from_secs(self.news_ttl_secs)
    }
    pub fn meme_ttl(&self) -> Duration {
        Duration::from_secs(self.meme_ttl_secs)
    }
    pub fn insight_ttl(&self) -> Duration {
        Duration::from_secs(self.insight_ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub feeds: FeedConfig,
    /// Empty list means permissive CORS (local development).
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://coinboard.db".into());
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "coinboard".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "coinboard-users".into()),
            ttl_days: std::env::var("JWT_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(7),
        };
        let feeds = FeedConfig {
            coingecko_base_url: std::env::var("COINGECKO_BASE_URL")
                .unwrap_or_else(|_| "https://api.coingecko.com".into()),
            coingecko_api_key: env_opt("COINGECKO_API_KEY"),
            cryptopanic_base_url: std::env::var("CRYPTOPANIC_BASE_URL")
                .unwrap_or_else(|_| "https://cryptopanic.com".into()),
            cryptopanic_api_key: env_opt("CRYPTOPANIC_API_KEY"),
            reddit_base_url: std::env::var("REDDIT_BASE_URL")
                .unwrap_or_else(|_| "https://www.reddit.com".into()),
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com".into()),
            openai_api_key: env_opt("OPENAI_API_KEY"),
            upstream_timeout_secs: env_parse("UPSTREAM_TIMEOUT_SECS", 10),
            prices_ttl_secs: env_parse("PRICES_TTL_SECS", 60),
            news_ttl_secs: env_parse("NEWS_TTL_SECS", 90),
            meme_ttl_secs: env_parse("MEME_TTL_SECS", 60),
            insight_ttl_secs: env_parse("INSIGHT_TTL_SECS", 300),
        };
        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self {
            database_url,
            jwt,
            feeds,
            allowed_origins,
        })
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parse(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}
