//! Timestamp normalization for host-supplied records.

use chrono::{DateTime, Utc};

/// The timestamp shapes the host pipeline can hand over.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TimestampInput {
    /// A structured high-resolution time value, used verbatim.
    HighRes(DateTime<Utc>),
    /// Whole seconds since the Unix epoch, UTC, no sub-second part.
    EpochSeconds(u64),
    /// No usable timestamp was supplied.
    #[default]
    Missing,
}

/// Resolves an opaque host timestamp into calendar time.
///
/// Priority: a structured value is used verbatim; an integer is interpreted
/// as whole epoch seconds; anything else (missing, or an epoch value outside
/// the representable range) falls back to the wall clock at the time of the
/// call. A record without a usable timestamp only loses precision, it is
/// never an error. Downstream file bucketing and remote ordering both key
/// off this value.
pub fn resolve(input: &TimestampInput) -> DateTime<Utc> {
    match input {
        TimestampInput::HighRes(time) => *time,
        TimestampInput::EpochSeconds(seconds) => i64::try_from(*seconds)
            .ok()
            .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
            .unwrap_or_else(Utc::now),
        TimestampInput::Missing => Utc::now(),
    }
}
