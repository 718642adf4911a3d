//! Fetching the same report from the remote instance.
//!
//! The remote contribution is best effort: any failure is logged, counted
//! and turned into an empty list. Nothing is retried.

use crate::config::RemoteConfig;
use crate::metrics_defs::{REMOTE_FETCH_DEGRADED, REMOTE_FETCH_DURATION};
use crate::reports::ReportKind;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde_json::Value;
use shared::{counter, histogram};
use std::time::{Duration, Instant};
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum RemoteError {
    #[error("remote instance timed out")]
    Timeout,
    #[error("could not reach remote instance: {0}")]
    Transport(reqwest::Error),
    #[error("remote instance responded with {0}")]
    Status(StatusCode),
    #[error("malformed remote response: {0}")]
    Malformed(String),
}

impl RemoteError {
    /// Short tag for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            RemoteError::Timeout => "timeout",
            RemoteError::Transport(_) => "transport",
            RemoteError::Status(_) => "status",
            RemoteError::Malformed(_) => "malformed",
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteError::Timeout
        } else {
            RemoteError::Transport(e)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteStatus {
    Ok,
    Degraded,
}

impl RemoteStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RemoteStatus::Ok => "ok",
            RemoteStatus::Degraded => "degraded",
        }
    }
}

#[derive(Debug)]
pub struct RemoteOutcome {
    pub records: Vec<Value>,
    pub status: RemoteStatus,
}

impl RemoteOutcome {
    fn degraded() -> Self {
        Self {
            records: Vec::new(),
            status: RemoteStatus::Degraded,
        }
    }
}

/// Turns a remote response body into records. An object is a single
/// record; anything other than an object or array is malformed.
pub fn records_from_body(body: &[u8]) -> Result<Vec<Value>, RemoteError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| RemoteError::Malformed(e.to_string()))?;
    match value {
        Value::Array(records) => Ok(records),
        Value::Object(_) => Ok(vec![value]),
        other => Err(RemoteError::Malformed(format!(
            "expected an array or object, got {other}"
        ))),
    }
}

/// One pooled HTTP client shared by every report
pub struct RemoteFetcher {
    client: reqwest::Client,
    api_key: String,
}

impl RemoteFetcher {
    pub fn new(config: &RemoteConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
        })
    }

    /// Fetches `kind` from `url`. Never fails; a failed fetch is an empty,
    /// degraded outcome.
    pub async fn fetch(
        &self,
        kind: ReportKind,
        url: &Url,
        params: &[(String, String)],
    ) -> RemoteOutcome {
        let start = Instant::now();
        let result = self.try_fetch(url, params).await;
        let elapsed = start.elapsed().as_secs_f64();

        match result {
            Ok(records) => {
                histogram!(REMOTE_FETCH_DURATION, "report" => kind.as_str(), "outcome" => "ok")
                    .record(elapsed);
                tracing::debug!(
                    report = kind.as_str(),
                    records = records.len(),
                    "fetched remote records"
                );
                RemoteOutcome {
                    records,
                    status: RemoteStatus::Ok,
                }
            }
            Err(e) => {
                histogram!(
                    REMOTE_FETCH_DURATION,
                    "report" => kind.as_str(),
                    "outcome" => "degraded"
                )
                .record(elapsed);
                counter!(REMOTE_FETCH_DEGRADED, "report" => kind.as_str(), "reason" => e.reason())
                    .increment(1);
                tracing::warn!(
                    report = kind.as_str(),
                    url = %url,
                    error = %e,
                    "remote fetch failed, continuing with local records only"
                );
                RemoteOutcome::degraded()
            }
        }
    }

    async fn try_fetch(
        &self,
        url: &Url,
        params: &[(String, String)],
    ) -> Result<Vec<Value>, RemoteError> {
        let response = self
            .client
            .get(url.clone())
            .query(params)
            .header(AUTHORIZATION, &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(RemoteError::Status(status));
        }

        let body = response.bytes().await?;
        records_from_body(&body)
    }
}
