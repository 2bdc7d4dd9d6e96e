use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Settings for the official-results service.
#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Base of the official API; per-game endpoints live at `{base}/{slug}`.
    pub official_base_url: String,
    pub lookup_url: String,
    /// Sent as `X-Proxy-Key` when the base URL points at an edge relay.
    pub official_proxy_key: Option<String>,
    pub official_timeout_ms: u64,
    pub results_ttl_ms: u64,
    pub official_max_attempts: u32,
    pub official_backoff_ms: u64,
    pub official_batch_size: usize,
    pub allowed_origins: Vec<String>,
    pub rate_limit_per_minute: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("official_base_url", &self.official_base_url)
            .field("lookup_url", &self.lookup_url)
            .field(
                "official_proxy_key",
                &self.official_proxy_key.as_ref().map(|_| "[redacted]"),
            )
            .field("official_timeout_ms", &self.official_timeout_ms)
            .field("results_ttl_ms", &self.results_ttl_ms)
            .field("official_max_attempts", &self.official_max_attempts)
            .field("official_backoff_ms", &self.official_backoff_ms)
            .field("official_batch_size", &self.official_batch_size)
            .field("allowed_origins", &self.allowed_origins)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .finish()
    }
}

/// Settings for the edge relay.
#[derive(Clone)]
pub struct RelayConfig {
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub upstream_base_url: String,
    pub proxy_key: Option<String>,
    pub request_timeout_ms: u64,
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("upstream_base_url", &self.upstream_base_url)
            .field("proxy_key", &self.proxy_key.as_ref().map(|_| "[redacted]"))
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

/// Settings for the caller-side fallback client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Intermediate service bases, tried in order.
    pub api_base_urls: Vec<String>,
    pub official_base_url: String,
    pub timeout_ms: u64,
}
