//! Remote sink: bounded batches delivered to a multi-tenant log-store
//! service.

pub mod client;
pub mod router;

use std::path::Path;

use tracing::{debug, error};

use crate::config::remote::RemoteSinkConfig;
use crate::error::{ConfigError, FlushError};
use crate::record::{LogRecord, RawRecord};
use crate::remote::client::LogStoreClient;
use crate::remote::router::BatchRouter;
use crate::sink::LogSink;

/// Routes each flush cycle into per-store batches and ships them through
/// the wire client. Delivery is at-least-once with best-effort error
/// surfacing: nothing here retries, and nothing survives a process restart.
#[derive(Debug)]
pub struct RemoteSink {
    router: BatchRouter,
    client: LogStoreClient,
}

impl RemoteSink {
    /// Initializes the sink from its YAML config file. Any failure here,
    /// including a project that does not exist on the service, is fatal:
    /// the sink never processes records.
    pub fn new(config_path: &Path) -> Result<Self, ConfigError> {
        Self::from_config(RemoteSinkConfig::load(config_path)?)
    }

    /// Initializes the sink from an already-loaded configuration.
    pub fn from_config(config: RemoteSinkConfig) -> Result<Self, ConfigError> {
        let client = LogStoreClient::new(&config)?;
        match client.project_exists() {
            Ok(true) => {}
            Ok(false) => return Err(ConfigError::ProjectNotFound(config.project)),
            Err(source) => {
                return Err(ConfigError::ProjectCheck {
                    project: config.project,
                    source,
                })
            }
        }

        let route_key = if config.route_key.is_empty() {
            None
        } else {
            Some(config.route_key)
        };
        Ok(RemoteSink {
            router: BatchRouter::new(route_key, config.stores),
            client,
        })
    }
}

impl LogSink for RemoteSink {
    /// Routes and delivers the batch. A failed store batch is logged and
    /// counted; it never blocks delivery of the other batches. The cycle
    /// reports its failures once, after every batch has been attempted.
    fn flush(&self, tag: &str, records: Vec<RawRecord>) -> Result<(), FlushError> {
        let records: Vec<LogRecord> = records
            .into_iter()
            .map(|raw| LogRecord::resolve(tag, raw))
            .collect();

        let mut failed_batches = 0;
        for batch in self.router.route(&records) {
            match self.client.put_logs(&batch.store, tag, &batch.logs) {
                Ok(()) => debug!(
                    "delivered {} log(s) ({} bytes) to store {}",
                    batch.logs.len(),
                    batch.size_bytes(),
                    batch.store
                ),
                Err(e) => {
                    error!("failed to deliver batch to store {}: {e}", batch.store);
                    failed_batches += 1;
                }
            }
        }
        if failed_batches > 0 {
            return Err(FlushError::Delivery { failed_batches });
        }
        Ok(())
    }

    fn shutdown(&self) {
        // Nothing to release: the wire client holds no state that outlives
        // drop.
    }
}
