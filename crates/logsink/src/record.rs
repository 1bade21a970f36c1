//! Record and field-value model shared by both sinks.

use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::timestamp::{self, TimestampInput};

/// A single scalar attached to a record field.
///
/// The host decodes its own wire format into these shapes; both sinks
/// normalize them to text on output.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Bytes(Vec<u8>),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl FieldValue {
    /// Renders the value as text: byte sequences as raw (lossy UTF-8) text,
    /// every other scalar via its default display form.
    #[must_use]
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Text(text) => Cow::Borrowed(text),
            FieldValue::Bytes(bytes) => String::from_utf8_lossy(bytes),
            FieldValue::Int(value) => Cow::Owned(value.to_string()),
            FieldValue::UInt(value) => Cow::Owned(value.to_string()),
            FieldValue::Float(value) => Cow::Owned(value.to_string()),
            FieldValue::Bool(value) => Cow::Owned(value.to_string()),
        }
    }
}

/// One host-decoded record, before its timestamp has been resolved.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    pub timestamp: TimestampInput,
    pub fields: BTreeMap<String, FieldValue>,
}

/// A record bound to its tag with a resolved timestamp.
///
/// Owned exclusively by the flush cycle that created it; never persisted.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub tag: String,
    pub timestamp: DateTime<Utc>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl LogRecord {
    /// Binds a raw record to the cycle's tag, resolving its timestamp.
    #[must_use]
    pub fn resolve(tag: &str, raw: RawRecord) -> Self {
        LogRecord {
            tag: tag.to_string(),
            timestamp: timestamp::resolve(&raw.timestamp),
            fields: raw.fields,
        }
    }
}
