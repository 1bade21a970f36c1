//! The contract a host pipeline drives.

use crate::error::FlushError;
use crate::record::RawRecord;

/// One sink instance: initialized once from configuration, driven by
/// repeated flush cycles, shut down once at host exit.
///
/// The host owns decoding of its wire format into [`RawRecord`]s and calls
/// [`LogSink::flush`] once per batch. Flushes may run concurrently for
/// different tags, but the host serializes delivery per source, so no two
/// cycles target the same destination file or store batch at once. A
/// concrete host binding registers these entry points with its own loading
/// mechanism; the engine never depends on a specific hosting ABI.
pub trait LogSink {
    /// Delivers one batch of records carried under a single tag.
    ///
    /// Blocking: the call returns once every record has been handed to its
    /// destination (or the cycle failed). No retries happen here.
    fn flush(&self, tag: &str, records: Vec<RawRecord>) -> Result<(), FlushError>;

    /// Releases resources held by the sink; called once at host shutdown.
    fn shutdown(&self);
}
