//! On-disk line encodings for the file sink.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::record::LogRecord;

const OUT_FILE_FORMAT: &str = "out_file";
const PLAIN_FORMAT: &str = "plain";

/// The supported line encodings. Each record becomes a single
/// newline-terminated line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordFormat {
    /// `tag: [seconds.nanoseconds, {fields}]`, the conventional structured
    /// forwarder file format, kept for downstream tool compatibility.
    #[default]
    OutFile,
    /// The field map alone, as a JSON object.
    Plain,
}

impl RecordFormat {
    /// Parses a configured format name. Unsupported names are rejected here,
    /// at sink initialization, never at write time.
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name {
            OUT_FILE_FORMAT => Ok(RecordFormat::OutFile),
            PLAIN_FORMAT => Ok(RecordFormat::Plain),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Encodes one record. Field values are normalized to text and
    /// serialized in deterministic key order.
    pub fn encode(self, record: &LogRecord) -> Result<Vec<u8>, serde_json::Error> {
        let fields: BTreeMap<&str, Cow<'_, str>> = record
            .fields
            .iter()
            .map(|(key, value)| (key.as_str(), value.render()))
            .collect();
        let body = serde_json::to_string(&fields)?;
        let line = match self {
            RecordFormat::OutFile => format!(
                "{}: [{}.{}, {}]\n",
                record.tag,
                record.timestamp.timestamp(),
                record.timestamp.timestamp_subsec_nanos(),
                body
            ),
            RecordFormat::Plain => format!("{body}\n"),
        };
        Ok(line.into_bytes())
    }
}
