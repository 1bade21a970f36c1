//! Sink configuration surfaces.
//!
//! The file sink is configured through the host's key/value parameters
//! (`File`, `Date`, `Format`); the remote sink through a small YAML file,
//! see [`remote`]. Everything is parsed and validated once at sink
//! initialization; a sink that fails here never processes records.

pub mod remote;

use std::collections::HashMap;

use crate::error::ConfigError;
use crate::file::format::RecordFormat;

const FILE_KEY: &str = "File";
const DATE_KEY: &str = "Date";
const FORMAT_KEY: &str = "Format";

/// Default filename template: one file per tag per day.
pub const DEFAULT_FILENAME_TEMPLATE: &str = "$Tag-$Date.log";
/// Default `$Date` pattern.
pub const DEFAULT_DATE_FORMAT: &str = "%Y%m%d";

/// Configuration for the file sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSinkConfig {
    /// Filename template with `$Tag` and `$Date` placeholders.
    pub filename_template: String,
    /// Pattern the `$Date` placeholder expands with.
    pub date_format: String,
    /// Line encoding for written records.
    pub format: RecordFormat,
}

impl Default for FileSinkConfig {
    fn default() -> Self {
        FileSinkConfig {
            filename_template: DEFAULT_FILENAME_TEMPLATE.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            format: RecordFormat::OutFile,
        }
    }
}

impl FileSinkConfig {
    /// Builds the configuration from the host's parameters. Missing and
    /// empty values keep their defaults; an unsupported `Format` name fails
    /// initialization outright.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = FileSinkConfig::default();
        if let Some(template) = non_empty(params.get(FILE_KEY)) {
            config.filename_template = template.to_string();
        }
        if let Some(date_format) = non_empty(params.get(DATE_KEY)) {
            config.date_format = date_format.to_string();
        }
        if let Some(format) = non_empty(params.get(FORMAT_KEY)) {
            config.format = RecordFormat::parse(format)?;
        }
        Ok(config)
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|value| !value.is_empty())
}
