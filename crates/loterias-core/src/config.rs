use std::env::VarError;
use std::net::SocketAddr;
use std::ops::RangeInclusive;

use crate::app_config::{AppConfig, ClientConfig, Environment, RelayConfig};
use crate::ConfigError;

pub const DEFAULT_OFFICIAL_BASE_URL: &str = "https://servicebus2.caixa.gov.br/portaldeloterias/api";
pub const DEFAULT_LOOKUP_URL: &str = "https://lottolookup.com.br/api";
pub const DEFAULT_RELAY_UPSTREAM_BASE_URL: &str = "https://servicebus2.caixa.gov.br";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8787";

const DEFAULT_ALLOWED_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost",
    "https://localhost",
    "capacitor://localhost",
];

/// Upper bound for any outbound request timeout.
const MAX_TIMEOUT_MS: u64 = 60_000;

/// Load the service configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if the bind address is not a valid socket address.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load the service configuration from variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if the bind address is not a valid socket address.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Load the edge relay configuration.
///
/// # Errors
///
/// Returns `ConfigError` if the bind address is not a valid socket address.
pub fn load_relay_config() -> Result<RelayConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_relay_config(|key| std::env::var(key))
}

/// Load the fallback client configuration. Never fails: every value has a default.
pub fn load_client_config() -> ClientConfig {
    dotenvy::dotenv().ok();
    build_client_config(|key| std::env::var(key))
}

/// Core parsing logic, decoupled from the process environment so tests can use
/// a plain `HashMap` lookup.
///
/// Tuning knobs never fail: out-of-range values are clamped and unparsable ones
/// fall back to their default, both with a warning.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let env = parse_environment(&or_default("LOTERIAS_ENV", "development"));
    let bind_addr = parse_socket_addr(&lookup, "LOTERIAS_BIND_ADDR", "0.0.0.0:8787")?;
    let log_level = or_default("LOTERIAS_LOG_LEVEL", "info");

    let official_base_url = normalize_base_url(
        lookup("LOTERIAS_OFFICIAL_BASE_URL").ok().as_deref(),
        DEFAULT_OFFICIAL_BASE_URL,
    );
    let lookup_url = normalize_base_url(
        lookup("LOTERIAS_LOOKUP_URL").ok().as_deref(),
        DEFAULT_LOOKUP_URL,
    );
    let official_proxy_key = non_blank(lookup("LOTERIAS_OFFICIAL_PROXY_KEY").ok());

    let official_timeout_ms =
        bounded_or_default(&lookup, "LOTERIAS_OFFICIAL_TIMEOUT_MS", 12_000, 1..=MAX_TIMEOUT_MS);
    let results_ttl_ms = clamped(
        &lookup,
        "LOTERIAS_RESULTS_TTL_MS",
        120_000,
        1_000..=3_600_000,
    );
    let official_max_attempts = clamped(&lookup, "LOTERIAS_OFFICIAL_MAX_ATTEMPTS", 2, 1..=5);
    let official_backoff_ms = clamped(&lookup, "LOTERIAS_OFFICIAL_BACKOFF_MS", 200, 0..=5_000);
    let official_batch_size = clamped(&lookup, "LOTERIAS_OFFICIAL_BATCH_SIZE", 3, 1..=10);
    let rate_limit_per_minute = clamped(
        &lookup,
        "LOTERIAS_RATE_LIMIT_PER_MINUTE",
        120,
        1..=10_000,
    );

    let allowed_origins = parse_allowed_origins(lookup("LOTERIAS_ALLOWED_ORIGINS").ok().as_deref());

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        official_base_url,
        lookup_url,
        official_proxy_key,
        official_timeout_ms,
        results_ttl_ms,
        official_max_attempts: u32::try_from(official_max_attempts).unwrap_or(2),
        official_backoff_ms,
        official_batch_size: usize::try_from(official_batch_size).unwrap_or(3),
        allowed_origins,
        rate_limit_per_minute: usize::try_from(rate_limit_per_minute).unwrap_or(120),
    })
}

fn build_relay_config<F>(lookup: F) -> Result<RelayConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let bind_addr = parse_socket_addr(&lookup, "RELAY_BIND_ADDR", "0.0.0.0:8788")?;
    let log_level = lookup("RELAY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let upstream_base_url = normalize_base_url(
        lookup("RELAY_UPSTREAM_BASE_URL").ok().as_deref(),
        DEFAULT_RELAY_UPSTREAM_BASE_URL,
    );
    let proxy_key = non_blank(lookup("RELAY_PROXY_KEY").ok());
    let request_timeout_ms =
        bounded_or_default(&lookup, "RELAY_REQUEST_TIMEOUT_MS", 12_000, 1..=MAX_TIMEOUT_MS);

    Ok(RelayConfig {
        bind_addr,
        log_level,
        upstream_base_url,
        proxy_key,
        request_timeout_ms,
    })
}

fn build_client_config<F>(lookup: F) -> ClientConfig
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let mut api_base_urls: Vec<String> = lookup("LOTERIAS_API_BASE_URLS")
        .unwrap_or_default()
        .split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_end_matches('/').to_string())
        .collect();
    if api_base_urls.is_empty() {
        api_base_urls.push(DEFAULT_API_BASE_URL.to_string());
    }

    ClientConfig {
        api_base_urls,
        official_base_url: normalize_base_url(
            lookup("LOTERIAS_OFFICIAL_BASE_URL").ok().as_deref(),
            DEFAULT_OFFICIAL_BASE_URL,
        ),
        timeout_ms: bounded_or_default(
            &lookup,
            "LOTERIAS_CLIENT_TIMEOUT_MS",
            15_000,
            1..=MAX_TIMEOUT_MS,
        ),
    }
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s.trim() {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_socket_addr<F>(lookup: &F, var: &str, default: &str) -> Result<SocketAddr, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let raw = lookup(var).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Reads `var` as an integer and clamps it into `range`.
fn clamped<F>(lookup: &F, var: &str, default: u64, range: RangeInclusive<u64>) -> u64
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let Ok(raw) = lookup(var) else {
        return default;
    };
    match raw.trim().parse::<u64>() {
        Ok(value) if range.contains(&value) => value,
        Ok(value) => {
            let clamped = value.clamp(*range.start(), *range.end());
            tracing::warn!(var, value, clamped, "config value out of range; clamping");
            clamped
        }
        Err(e) => {
            tracing::warn!(var, raw = %raw, default, error = %e, "config value unparsable; using default");
            default
        }
    }
}

/// Reads `var` as an integer; anything outside `range` falls back to `default`.
fn bounded_or_default<F>(lookup: &F, var: &str, default: u64, range: RangeInclusive<u64>) -> u64
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let Ok(raw) = lookup(var) else {
        return default;
    };
    match raw.trim().parse::<u64>() {
        Ok(value) if range.contains(&value) => value,
        _ => {
            tracing::warn!(var, raw = %raw, default, "config value invalid; using default");
            default
        }
    }
}

/// Trims the candidate, falls back to `default` when blank, and strips trailing slashes.
pub fn normalize_base_url(raw: Option<&str>, default: &str) -> String {
    let candidate = raw.map(str::trim).unwrap_or_default();
    let base = if candidate.is_empty() {
        default
    } else {
        candidate
    };
    base.trim_end_matches('/').to_string()
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Splits a `,`/`;` separated origin list. Wildcards are dropped: origins must be explicit.
fn parse_allowed_origins(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return DEFAULT_ALLOWED_ORIGINS
            .iter()
            .map(ToString::to_string)
            .collect();
    };

    if raw.contains('*') {
        tracing::warn!("ignoring wildcard '*' in LOTERIAS_ALLOWED_ORIGINS; list origins explicitly");
    }

    raw.split([',', ';'])
        .map(str::trim)
        .filter(|origin| !origin.is_empty() && *origin != "*")
        .map(ToString::to_string)
        .collect()
}
