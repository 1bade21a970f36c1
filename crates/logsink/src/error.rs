//! Error families for the engine.
//!
//! Three kinds cover the contract: [`ConfigError`] is fatal to sink startup,
//! [`FlushError`] aborts a single flush cycle, and [`DeliveryError`] is one
//! failed submission to the remote service. Routing misses and oversized
//! fields are not errors; they are handled in the batch router as documented
//! filters.

use thiserror::Error;

/// Startup failure: a sink that returns one of these never processes records.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configured output format name is not one of the supported ones.
    #[error("unsupported log format: {0}")]
    UnsupportedFormat(String),

    /// A required config field was absent or empty.
    #[error("missing required config field: {0}")]
    MissingField(&'static str),

    /// The config file could not be read or deserialized.
    #[error("{0}")]
    Parse(String),

    /// The wire client could not be constructed.
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    /// The configured project does not exist on the remote service.
    #[error("project {0} does not exist, create it first")]
    ProjectNotFound(String),

    /// The project existence check itself failed.
    #[error("failed to verify project {project}: {source}")]
    ProjectCheck {
        project: String,
        #[source]
        source: DeliveryError,
    },
}

/// Failure of one flush cycle, reported once to the host.
#[derive(Debug, Error)]
pub enum FlushError {
    /// Directory creation, file open or file write failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A record could not be serialized.
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    /// Some store batches could not be delivered; the rest were still
    /// attempted.
    #[error("failed to deliver {failed_batches} batch(es)")]
    Delivery { failed_batches: usize },
}

/// One failed submission to the remote log-store service.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The request never completed.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("remote service returned {status}: {message}")]
    Rejected {
        status: reqwest::StatusCode,
        message: String,
    },
}
