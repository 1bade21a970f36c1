//! Batch routing for the remote sink.
//!
//! A flush cycle arrives as an unordered pile of records; each is assigned
//! to a destination store by a designated routing field, converted to its
//! wire entry, and packed into size-bounded batches per store. Records with
//! no usable destination are dropped on purpose; they belong to no known
//! store, and dropping them is a documented filter, not a fault.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

use crate::record::LogRecord;
use crate::remote::client::{LogEntry, LogPair};

/// Serialized ceiling for a single key/value pair.
pub const MAX_FIELD_SIZE_BYTES: usize = 1024 * 1024;

/// Serialized ceiling for one outbound submission.
pub const MAX_BATCH_SIZE_BYTES: usize = 9 * 1024 * 1024;

/// Value substituted when a pair alone exceeds the field ceiling. The key
/// is preserved; the record is never rejected for it.
pub const OVERSIZED_FIELD_PLACEHOLDER: &str = "value too large, discard";

/// Synthetic field carrying the record's resolved timestamp, prefixed to
/// every routed entry in addition to the original fields.
pub const TIME_FIELD_KEY: &str = "_time_";

const TIME_FIELD_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9fZ";

/// One size-bounded batch ready for submission to a single store.
#[derive(Debug, Clone)]
pub struct StoreBatch {
    pub store: String,
    pub logs: Vec<LogEntry>,
    size_bytes: usize,
}

impl StoreBatch {
    fn new(store: &str) -> Self {
        StoreBatch {
            store: store.to_string(),
            logs: Vec::new(),
            size_bytes: 0,
        }
    }

    fn push(&mut self, log: LogEntry, size: usize) {
        self.size_bytes += size;
        self.logs.push(log);
    }

    /// Running serialized size of the batch.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }
}

/// Partitions a flush cycle's records into bounded per-store batches.
#[derive(Debug)]
pub struct BatchRouter {
    route_key: Option<String>,
    stores: HashSet<String>,
    max_field_size: usize,
    max_batch_size: usize,
}

impl BatchRouter {
    #[must_use]
    pub fn new(route_key: Option<String>, stores: impl IntoIterator<Item = String>) -> Self {
        BatchRouter {
            route_key,
            stores: stores.into_iter().collect(),
            max_field_size: MAX_FIELD_SIZE_BYTES,
            max_batch_size: MAX_BATCH_SIZE_BYTES,
        }
    }

    #[cfg(test)]
    fn with_limits(mut self, max_field_size: usize, max_batch_size: usize) -> Self {
        self.max_field_size = max_field_size;
        self.max_batch_size = max_batch_size;
        self
    }

    /// Routes one flush cycle. Every surviving record lands in exactly one
    /// batch, and no batch exceeds the size ceiling unless a single entry
    /// already does; such an entry ships alone rather than being dropped.
    #[must_use]
    pub fn route(&self, records: &[LogRecord]) -> Vec<StoreBatch> {
        let mut grouped: BTreeMap<String, Vec<LogEntry>> = BTreeMap::new();
        for record in records {
            let Some(store) = self.store_for(record) else {
                continue;
            };
            grouped.entry(store).or_default().push(self.entry_for(record));
        }

        let mut batches = Vec::new();
        for (store, logs) in grouped {
            let mut current = StoreBatch::new(&store);
            for log in logs {
                let size = log.size_bytes();
                if !current.logs.is_empty() && current.size_bytes + size > self.max_batch_size {
                    batches.push(std::mem::replace(&mut current, StoreBatch::new(&store)));
                }
                current.push(log, size);
            }
            if !current.logs.is_empty() {
                batches.push(current);
            }
        }
        batches
    }

    /// Selects the destination store for one record. Each miss is a named
    /// filter branch: routing disabled, routing field absent, store unknown.
    fn store_for(&self, record: &LogRecord) -> Option<String> {
        let key = match &self.route_key {
            Some(key) => key,
            None => {
                debug!("routing disabled, dropping record for tag {}", record.tag);
                return None;
            }
        };
        let value = match record.fields.get(key) {
            Some(value) => value.render(),
            None => {
                debug!("record for tag {} has no {key} field, dropped", record.tag);
                return None;
            }
        };
        if !self.stores.contains(value.as_ref()) {
            debug!("unknown store {value} for tag {}, record dropped", record.tag);
            return None;
        }
        Some(value.into_owned())
    }

    /// Converts a record to its wire entry: the synthetic time pair first,
    /// then every original field rendered to text. A pair over the field
    /// ceiling keeps its key and takes the placeholder value; the batch
    /// ceiling then accounts for the placeholder's size, not the original's,
    /// so substitution cannot re-trigger the oversized condition.
    fn entry_for(&self, record: &LogRecord) -> LogEntry {
        let mut contents = Vec::with_capacity(record.fields.len() + 1);
        contents.push(LogPair {
            key: TIME_FIELD_KEY.to_string(),
            value: record.timestamp.format(TIME_FIELD_FORMAT).to_string(),
        });
        for (key, value) in &record.fields {
            let mut pair = LogPair {
                key: key.clone(),
                value: value.render().into_owned(),
            };
            if pair.size_bytes() > self.max_field_size {
                warn!(
                    "field {} exceeds the size limit ({} > {} bytes), value discarded",
                    pair.key,
                    pair.size_bytes(),
                    self.max_field_size
                );
                pair.value = OVERSIZED_FIELD_PLACEHOLDER.to_string();
            }
            contents.push(pair);
        }
        LogEntry {
            time: u32::try_from(record.timestamp.timestamp()).unwrap_or_default(),
            time_ns: record.timestamp.timestamp_subsec_nanos(),
            contents,
        }
    }
}
