//! Server time probe.
//!
//! One POST with an empty body to the `QueryTime` endpoint, timed, and
//! compared against the local clock. This is the only network I/O in the
//! crate; everything else is pure.

use async_trait::async_trait;
use reqwest::header::CONTENT_LENGTH;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};

use crate::steam_guard::core::current_unix_time;
use crate::steam_guard::types::*;

/// Public time service used by the mobile authenticator.
pub const DEFAULT_TIME_ENDPOINT: &str =
    "https://api.steampowered.com/ITwoFactorService/QueryTime/v1/";

// ─── Config ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSyncConfig {
    /// Full URL of the `QueryTime` endpoint.
    pub endpoint: String,
    /// Upper bound for one probe, in seconds.
    pub timeout_secs: u64,
    /// Optional `User-Agent` header.
    pub user_agent: Option<String>,
}

impl Default for TimeSyncConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_TIME_ENDPOINT.into(),
            timeout_secs: 10,
            user_agent: None,
        }
    }
}

impl TimeSyncConfig {
    fn validate(&self) -> Result<(), GuardError> {
        if self.endpoint.trim().is_empty() {
            return Err(GuardError::config_error("Time endpoint URL is required"));
        }
        if self.timeout_secs == 0 {
            return Err(GuardError::config_error("Timeout must be at least one second"));
        }
        Ok(())
    }
}

// ─── Transport ───────────────────────────────────────────────────────

/// Sends the probe request. Implementations return the raw response body.
#[async_trait]
pub trait TimeTransport: Send + Sync {
    /// POST with an explicit zero-length body.
    async fn post_empty(&self, url: &str) -> Result<String, GuardError>;
}

/// `reqwest`-backed transport.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &TimeSyncConfig) -> Result<Self, GuardError> {
        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout_secs));
        if let Some(ua) = &config.user_agent {
            builder = builder.user_agent(ua.clone());
        }
        let client = builder.build().map_err(|e| {
            GuardError::transport(format!("Failed to create HTTP client: {}", e))
        })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TimeTransport for ReqwestTransport {
    async fn post_empty(&self, url: &str) -> Result<String, GuardError> {
        let resp = self
            .client
            .post(url)
            .header(CONTENT_LENGTH, "0")
            .body(Vec::<u8>::new())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let code = status.as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GuardError::transport(format!("HTTP {} from time service", code))
                .with_detail(body.chars().take(500).collect::<String>())
                .with_status(code));
        }
        Ok(resp.text().await?)
    }
}

// ─── Client ──────────────────────────────────────────────────────────

/// Measures clock skew against the time service.
pub struct TimeSyncClient<T: TimeTransport = ReqwestTransport> {
    transport: T,
    config: TimeSyncConfig,
}

impl TimeSyncClient<ReqwestTransport> {
    pub fn from_config(config: TimeSyncConfig) -> Result<Self, GuardError> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self { transport, config })
    }
}

impl<T: TimeTransport> TimeSyncClient<T> {
    pub fn with_transport(config: TimeSyncConfig, transport: T) -> Result<Self, GuardError> {
        config.validate()?;
        Ok(Self { transport, config })
    }

    pub fn config(&self) -> &TimeSyncConfig {
        &self.config
    }

    /// Probe the server, bounded by the configured timeout.
    ///
    /// Dropping the returned future cancels the request.
    pub async fn get_time_offset(&self) -> Result<TimeOffset, GuardError> {
        self.get_time_offset_with_timeout(Duration::from_secs(self.config.timeout_secs))
            .await
    }

    /// Probe the server with a per-call bound.
    pub async fn get_time_offset_with_timeout(
        &self,
        timeout: Duration,
    ) -> Result<TimeOffset, GuardError> {
        let started = Instant::now();
        let sent = tokio::time::timeout(timeout, self.transport.post_empty(&self.config.endpoint));
        let body = match sent.await {
            Ok(Ok(body)) => body,
            Ok(Err(e)) => {
                log::warn!("time probe to {} failed: {}", self.config.endpoint, e);
                return Err(e);
            }
            Err(_) => {
                log::warn!("time probe to {} timed out", self.config.endpoint);
                return Err(GuardError::transport(format!(
                    "Time query timed out after {} ms",
                    timeout.as_millis()
                )));
            }
        };
        let latency = started.elapsed().as_millis() as u64;

        let (offset, server) = parse_query_time(&body, current_unix_time())?;
        log::debug!("time offset {}s, latency {}ms", offset, latency);
        Ok(TimeOffset {
            offset,
            latency,
            server,
        })
    }
}

/// Probe the default endpoint with default settings.
pub async fn get_time_offset() -> Result<TimeOffset, GuardError> {
    TimeSyncClient::from_config(TimeSyncConfig::default())?
        .get_time_offset()
        .await
}

// ─── Response parsing ────────────────────────────────────────────────

/// Parse a `QueryTime` body and compute `server_time - local_now`.
///
/// `server_time` may be a JSON string (what the service sends) or a number.
pub fn parse_query_time(
    body: &str,
    local_now: u64,
) -> Result<(i64, QueryTimeResponse), GuardError> {
    let root: Value = serde_json::from_str(body)?;

    let mut response = match root {
        Value::Object(mut map) => match map.remove("response") {
            Some(Value::Object(inner)) => inner,
            _ => return Err(GuardError::response_format("Missing 'response' object")),
        },
        _ => return Err(GuardError::response_format("Expected a JSON object")),
    };

    let server_time = match response.remove("server_time") {
        Some(Value::String(s)) => s.trim().parse::<u64>().map_err(|e| {
            GuardError::response_format(format!("Invalid server_time '{}'", s))
                .with_detail(e.to_string())
        })?,
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| GuardError::response_format(format!("Invalid server_time {}", n)))?,
        Some(_) => return Err(GuardError::response_format("server_time has the wrong type")),
        None => return Err(GuardError::response_format("Missing server_time")),
    };

    let server = i64::try_from(server_time)
        .map_err(|_| GuardError::response_format("server_time out of range"))?;
    let local = i64::try_from(local_now).unwrap_or(i64::MAX);

    Ok((
        server.saturating_sub(local),
        QueryTimeResponse {
            server_time,
            hints: response,
        },
    ))
}
