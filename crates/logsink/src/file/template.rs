//! Filename templating for the file sink.

use std::fmt::Write;

use chrono::{DateTime, Datelike, Local, Timelike, Utc};

/// Expands a filename template for a record's tag and timestamp.
///
/// The template recognizes the literal placeholders `$Tag` and `$Date`. No
/// escaping is supported: every `$Tag`/`$Date` substring in the template is
/// replaced wherever it appears. This is an accepted limitation of the
/// format, not a bug.
#[derive(Debug, Clone)]
pub struct FilenameTemplate {
    template: String,
    date_format: String,
}

impl FilenameTemplate {
    pub fn new(template: impl Into<String>, date_format: impl Into<String>) -> Self {
        FilenameTemplate {
            template: template.into(),
            date_format: date_format.into(),
        }
    }

    /// Expands the template for one record. `$Date` renders the record's
    /// timestamp in local time, the way rotated log files are conventionally
    /// named.
    #[must_use]
    pub fn expand(&self, tag: &str, timestamp: DateTime<Utc>) -> String {
        let date = format_date(&self.date_format, &timestamp.with_timezone(&Local));
        self.template.replace("$Tag", tag).replace("$Date", &date)
    }
}

/// Renders `pattern` against `time`, recognizing the `%Y`, `%m`, `%d`, `%H`
/// and `%M` tokens. Any other character, including an unrecognized `%x`
/// pair, is copied through literally.
fn format_date(pattern: &str, time: &DateTime<Local>) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('Y') => {
                let _ = write!(out, "{:04}", time.year());
            }
            Some('m') => {
                let _ = write!(out, "{:02}", time.month());
            }
            Some('d') => {
                let _ = write!(out, "{:02}", time.day());
            }
            Some('H') => {
                let _ = write!(out, "{:02}", time.hour());
            }
            Some('M') => {
                let _ = write!(out, "{:02}", time.minute());
            }
            Some(other) => {
                out.push('%');
                out.push(other);
            }
            None => out.push('%'),
        }
    }
    out
}
