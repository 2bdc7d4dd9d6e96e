//! Request headers that make outbound calls look like the official web client.
//!
//! The official API rejects requests that do not resemble a browser session.

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";
pub const ACCEPT: &str = "application/json";
pub const ACCEPT_LANGUAGE: &str = "pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7";
pub const ORIGIN: &str = "https://loterias.caixa.gov.br";
pub const REFERER: &str = "https://loterias.caixa.gov.br/";

/// Shared-secret header checked by the edge relay.
pub const PROXY_KEY_HEADER: &str = "x-proxy-key";
