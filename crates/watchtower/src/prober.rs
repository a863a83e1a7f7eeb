use std::error::Error as _;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::classifier::classify;
use crate::config::ProbeConfig;
use crate::model::TargetStatus;

/// Raw outcome of one probe, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    /// HTTP status code, `None` when no response arrived
    pub status_code: Option<u16>,

    /// Wall-clock time from issuing the request to the response or failure.
    /// `None` when the request could not even be built.
    pub elapsed_ms: Option<u64>,

    /// Human readable transport failure
    pub error: Option<String>,
}

impl ProbeResult {
    /// The target answered with `status_code`
    pub fn response(status_code: u16, elapsed_ms: u64) -> Self {
        Self { status_code: Some(status_code), elapsed_ms: Some(elapsed_ms), error: None }
    }

    /// The request failed below HTTP (DNS, refused connection, TLS, timeout...)
    pub fn failure(error: impl Into<String>, elapsed_ms: Option<u64>) -> Self {
        Self { status_code: None, elapsed_ms, error: Some(error.into()) }
    }

    pub fn status(&self) -> TargetStatus {
        classify(self.error.as_deref().unwrap_or_default(), self.status_code.unwrap_or(0))
    }
}

/// Issues a single health-check request against a URL.
///
/// Implementations never fail: transport errors are folded into the
/// returned [`ProbeResult`].
#[async_trait::async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeResult;
}

/// HTTP GET prober backed by a shared `reqwest` client.
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    /// Build a prober identifying itself with the configured user agent.
    ///
    /// No request timeout is set unless `request_timeout_seconds` is given, so
    /// by default a hanging target is bounded only by the transport.
    pub fn new(config: &ProbeConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());

        if let Some(seconds) = config.request_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }

        Ok(Self::with_client(builder.build()?))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> ProbeResult {
        let start = Instant::now();

        match self.client.get(url).send().await {
            Ok(response) => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                let status_code = response.status().as_u16();
                debug!(url, status_code, elapsed_ms, "probe answered");
                // Body is never read, dropping the response releases the connection.
                drop(response);
                ProbeResult::response(status_code, elapsed_ms)
            }
            Err(e) if e.is_builder() => ProbeResult::failure(describe(&e), None),
            Err(e) => {
                let elapsed_ms = start.elapsed().as_millis() as u64;
                debug!(url, elapsed_ms, "probe failed: {e}");
                ProbeResult::failure(describe(&e), Some(elapsed_ms))
            }
        }
    }
}

/// Flatten a reqwest error and its sources into one line.
fn describe(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
