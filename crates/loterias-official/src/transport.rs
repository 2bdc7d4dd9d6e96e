//! Outbound JSON GETs against the official provider and the lookup feed.
//!
//! Every call goes through two strategies: a regular `reqwest` client that
//! negotiates and decompresses transparently, then (on any failure) a bare
//! HTTP/1.1 client that advertises `gzip, deflate, br` itself and decodes the
//! body by hand. Upstream hosts disagree on which of these they accept. Both
//! strategies report failures as [`FetchError`].

use std::io::Read;
use std::time::Duration;

use async_trait::async_trait;
use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use loterias_core::identity;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::error::{self, FetchError};
use crate::retry::RetryPolicy;

const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MANUAL_ACCEPT_ENCODING: &str = "gzip, deflate, br";
const BROTLI_BUFFER: usize = 4096;

/// Source of upstream JSON documents.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn get_json(&self, url: &Url) -> Result<Value, FetchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Negotiated,
    ManualDecode,
}

impl Strategy {
    fn for_attempt(attempt: u32) -> Self {
        if attempt <= 1 {
            Strategy::Negotiated
        } else {
            Strategy::ManualDecode
        }
    }
}

/// Dual-strategy HTTP implementation of [`Upstream`].
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    negotiated: Client,
    manual: Client,
    strategies: RetryPolicy,
}

impl HttpUpstream {
    /// Builds both clients with the browser identity headers and, when given,
    /// the relay key.
    ///
    /// # Errors
    ///
    /// Returns [`reqwest::Error`] if a client cannot be constructed or the
    /// proxy key is not a valid header value.
    pub fn new(timeout: Duration, proxy_key: Option<&str>) -> Result<Self, reqwest::Error> {
        let headers = identity_headers(proxy_key);
        let connect_timeout = timeout.min(MAX_CONNECT_TIMEOUT);

        let negotiated = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .user_agent(identity::USER_AGENT)
            .default_headers(headers.clone())
            .build()?;

        let mut manual_headers = headers;
        manual_headers.insert(
            header::ACCEPT_ENCODING,
            HeaderValue::from_static(MANUAL_ACCEPT_ENCODING),
        );
        let manual = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .user_agent(identity::USER_AGENT)
            .default_headers(manual_headers)
            .no_gzip()
            .no_brotli()
            .no_deflate()
            .http1_only()
            .build()?;

        Ok(Self {
            negotiated,
            manual,
            strategies: RetryPolicy::immediate(2),
        })
    }

    async fn fetch_with(&self, strategy: Strategy, url: &Url) -> Result<Value, FetchError> {
        let client = match strategy {
            Strategy::Negotiated => &self.negotiated,
            Strategy::ManualDecode => &self.manual,
        };
        let url_str = url.as_str();

        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url_str, e))?;

        let status = response.status();
        let encoding = response
            .headers()
            .get(header::CONTENT_ENCODING)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned);
        let raw = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url_str, e))?;

        let body = match (strategy, encoding.as_deref()) {
            (Strategy::ManualDecode, Some(encoding)) => {
                decode_body(encoding, &raw).map_err(|reason| FetchError::InvalidPayload {
                    context: url_str.to_owned(),
                    reason,
                    preview: None,
                })?
            }
            _ => raw.to_vec(),
        };

        if !status.is_success() {
            return Err(FetchError::UpstreamHttp {
                status: status.as_u16(),
                url: url_str.to_owned(),
                preview: error::preview(&String::from_utf8_lossy(&body)),
            });
        }

        serde_json::from_slice(&body)
            .map_err(|e| FetchError::invalid_json(url_str, &e, &String::from_utf8_lossy(&body)))
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn get_json(&self, url: &Url) -> Result<Value, FetchError> {
        self.strategies
            .run(url.as_str(), |attempt| {
                self.fetch_with(Strategy::for_attempt(attempt), url)
            })
            .await
    }
}

fn identity_headers(proxy_key: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static(identity::ACCEPT));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static(identity::ACCEPT_LANGUAGE),
    );
    headers.insert(header::ORIGIN, HeaderValue::from_static(identity::ORIGIN));
    headers.insert(header::REFERER, HeaderValue::from_static(identity::REFERER));
    if let Some(key) = proxy_key {
        match HeaderValue::from_str(key) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(identity::PROXY_KEY_HEADER, value);
            }
            Err(_) => tracing::warn!("proxy key is not a valid header value; not sending it"),
        }
    }
    headers
}

/// Undoes a `Content-Encoding` chain. Encodings are applied in listed order, so
/// they are removed last-first.
fn decode_body(content_encoding: &str, body: &[u8]) -> Result<Vec<u8>, String> {
    let mut data = body.to_vec();
    for coding in content_encoding.split(',').map(str::trim).rev() {
        data = match coding.to_ascii_lowercase().as_str() {
            "" | "identity" => data,
            "gzip" | "x-gzip" => read_all(GzDecoder::new(data.as_slice()), "gzip")?,
            "deflate" => {
                read_all(ZlibDecoder::new(data.as_slice()), "deflate").or_else(|_| {
                    read_all(DeflateDecoder::new(data.as_slice()), "deflate")
                })?
            }
            "br" => read_all(
                brotli::Decompressor::new(data.as_slice(), BROTLI_BUFFER),
                "br",
            )?,
            other => return Err(format!("unsupported content-encoding \"{other}\"")),
        };
    }
    Ok(data)
}

fn read_all(mut reader: impl Read, coding: &str) -> Result<Vec<u8>, String> {
    let mut out = Vec::new();
    reader
        .read_to_end(&mut out)
        .map_err(|e| format!("{coding} decode failed: {e}"))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
    use flate2::Compression;

    use super::*;

    const BODY: &[u8] = br#"{"numero":2705}"#;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn brotli(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut writer = brotli::CompressorWriter::new(&mut out, 4096, 5, 22);
            writer.write_all(data).unwrap();
        }
        out
    }

    #[test]
    fn first_attempt_negotiates_then_manual() {
        assert_eq!(Strategy::for_attempt(1), Strategy::Negotiated);
        assert_eq!(Strategy::for_attempt(2), Strategy::ManualDecode);
    }

    #[test]
    fn decodes_gzip() {
        assert_eq!(decode_body("gzip", &gzip(BODY)).unwrap(), BODY);
    }

    #[test]
    fn decodes_zlib_and_raw_deflate() {
        let mut zlib = ZlibEncoder::new(Vec::new(), Compression::default());
        zlib.write_all(BODY).unwrap();
        assert_eq!(decode_body("deflate", &zlib.finish().unwrap()).unwrap(), BODY);

        let mut raw = DeflateEncoder::new(Vec::new(), Compression::default());
        raw.write_all(BODY).unwrap();
        assert_eq!(decode_body("deflate", &raw.finish().unwrap()).unwrap(), BODY);
    }

    #[test]
    fn decodes_brotli() {
        assert_eq!(decode_body("br", &brotli(BODY)).unwrap(), BODY);
    }

    #[test]
    fn decodes_stacked_encodings_in_reverse() {
        let stacked = brotli(&gzip(BODY));
        assert_eq!(decode_body("gzip, br", &stacked).unwrap(), BODY);
    }

    #[test]
    fn identity_passes_through() {
        assert_eq!(decode_body("identity", BODY).unwrap(), BODY);
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        let err = decode_body("zstd", BODY).unwrap_err();
        assert!(err.contains("zstd"), "{err}");
    }

    #[test]
    fn corrupt_gzip_is_rejected() {
        assert!(decode_body("gzip", b"not gzip").is_err());
    }

    #[test]
    fn identity_headers_include_proxy_key_only_when_set() {
        let without = identity_headers(None);
        assert!(without.get(identity::PROXY_KEY_HEADER).is_none());
        assert_eq!(without[header::ACCEPT_LANGUAGE], identity::ACCEPT_LANGUAGE);

        let with = identity_headers(Some("s3cret"));
        assert_eq!(with[identity::PROXY_KEY_HEADER], "s3cret");
    }
}
