//! File sink: rotated, append-only local log files.

pub mod cache;
pub mod format;
pub mod template;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::config::FileSinkConfig;
use crate::error::FlushError;
use crate::file::cache::{FileHandleCache, DEFAULT_OPEN_FILE_LIMIT, IDLE_LIFETIME_FLOOR};
use crate::file::format::RecordFormat;
use crate::file::template::FilenameTemplate;
use crate::record::{LogRecord, RawRecord};
use crate::sink::LogSink;

/// Writes each record of a flush cycle to the file its tag and timestamp
/// resolve to, reusing open handles through the shared cache. Files are
/// only ever appended to, never truncated.
pub struct FileSink {
    template: FilenameTemplate,
    format: RecordFormat,
    cache: Arc<Mutex<FileHandleCache>>,
}

impl FileSink {
    /// Builds the sink with its own handle cache at the default capacity
    /// and idle lifetime.
    #[must_use]
    pub fn new(config: FileSinkConfig) -> Self {
        let cache = FileHandleCache::new(DEFAULT_OPEN_FILE_LIMIT, IDLE_LIFETIME_FLOOR);
        Self::with_cache(config, Arc::new(Mutex::new(cache)))
    }

    /// Builds the sink around an injected cache, letting several instances
    /// (or tests) share one handle budget.
    #[must_use]
    pub fn with_cache(config: FileSinkConfig, cache: Arc<Mutex<FileHandleCache>>) -> Self {
        FileSink {
            template: FilenameTemplate::new(config.filename_template, config.date_format),
            format: config.format,
            cache,
        }
    }
}

impl LogSink for FileSink {
    /// Writes the batch record by record. The first encode or I/O failure
    /// aborts the cycle; records already written stay written.
    fn flush(&self, tag: &str, records: Vec<RawRecord>) -> Result<(), FlushError> {
        for raw in records {
            let record = LogRecord::resolve(tag, raw);
            let path = PathBuf::from(self.template.expand(&record.tag, record.timestamp));
            let line = self.format.encode(&record)?;

            #[allow(clippy::expect_used)]
            let written = self
                .cache
                .lock()
                .expect("lock poisoned")
                .write(&path, &line)?;
            debug!("wrote {written} bytes to {}", path.display());
        }
        Ok(())
    }

    fn shutdown(&self) {
        #[allow(clippy::expect_used)]
        self.cache.lock().expect("lock poisoned").release_all();
    }
}
