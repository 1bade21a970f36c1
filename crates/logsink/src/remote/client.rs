//! Wire client for the remote log-store service.
//!
//! Transport only: one blocking submission per call, no retries. A call
//! that hangs is bounded by the client's request timeout, nothing else.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use tracing::debug;

use crate::config::remote::RemoteSinkConfig;
use crate::error::{ConfigError, DeliveryError};

/// Source label stamped on every submission this engine produces.
const SUBMISSION_SOURCE: &str = "logsink-remote";

const ACCESS_KEY_ID_HEADER: &str = "x-access-key-id";
const ACCESS_KEY_SECRET_HEADER: &str = "x-access-key-secret";

/// One normalized log entry as the service accepts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Whole seconds since the Unix epoch.
    pub time: u32,
    /// Nanosecond remainder of the timestamp.
    pub time_ns: u32,
    /// Ordered key/value text pairs.
    pub contents: Vec<LogPair>,
}

/// One key/value text pair of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogPair {
    pub key: String,
    pub value: String,
}

impl LogEntry {
    /// Serialized size the batch ceiling accounts against: the summed byte
    /// length of every key and value.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.contents.iter().map(LogPair::size_bytes).sum()
    }
}

impl LogPair {
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.key.len() + self.value.len()
    }
}

#[derive(Serialize)]
struct LogGroup<'a> {
    topic: &'a str,
    source: &'a str,
    logs: &'a [LogEntry],
}

/// Blocking HTTP client for the store ingestion API.
#[derive(Debug, Clone)]
pub struct LogStoreClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    project: String,
}

impl LogStoreClient {
    /// Builds the client from validated configuration. Credentials ride as
    /// default headers on every request.
    pub fn new(config: &RemoteSinkConfig) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_KEY_ID_HEADER, header_value(&config.access_key_id)?);
        headers.insert(
            ACCESS_KEY_SECRET_HEADER,
            header_value(&config.access_key_secret)?,
        );

        let http = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.flush_timeout))
            .build()
            .map_err(ConfigError::Client)?;

        Ok(LogStoreClient {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project: config.project.clone(),
        })
    }

    /// Checks whether the configured project exists on the service.
    pub fn project_exists(&self) -> Result<bool, DeliveryError> {
        let url = format!("{}/projects/{}", self.endpoint, self.project);
        let response = self.http.get(&url).send()?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                status,
                message: response.text().unwrap_or_default(),
            });
        }
        Ok(true)
    }

    /// Submits one batch of entries to `store`, tagged with the cycle's
    /// topic. Ownership of the batch effectively transfers here: a submitted
    /// batch is never mutated or resent.
    pub fn put_logs(&self, store: &str, topic: &str, logs: &[LogEntry]) -> Result<(), DeliveryError> {
        let url = format!(
            "{}/projects/{}/logstores/{}/logs",
            self.endpoint, self.project, store
        );
        let group = LogGroup {
            topic,
            source: SUBMISSION_SOURCE,
            logs,
        };
        let response = self.http.post(&url).json(&group).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                status,
                message: response.text().unwrap_or_default(),
            });
        }
        debug!("submitted {} log(s) to store {store}", logs.len());
        Ok(())
    }
}

fn header_value(value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value)
        .map_err(|_| ConfigError::Parse("access key is not a valid header value".to_string()))
}
