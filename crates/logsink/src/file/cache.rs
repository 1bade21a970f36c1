//! Destination file-handle cache for the file sink.
//!
//! Long-running ingestion opens one append handle per resolved path and
//! reuses it across flush cycles. The cache bounds how many handles stay
//! open (soft capacity) and how long an idle handle may linger (idle
//! lifetime). The capacity is checked cheaply up front so flush cycles
//! under the bound never scan; once it is exceeded, a single sweep closes
//! every entry outside the idle-lifetime protection window, not just
//! enough to get back under the cap. The lifetime window keeps a burst of
//! many distinct tags from thrashing handles for files still being written.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Open handles kept before acquires start sweeping. Tuned for few tags
/// with long-lived files, not many concurrent destinations.
pub const DEFAULT_OPEN_FILE_LIMIT: usize = 2;

/// Hard ceiling for the capacity bound.
pub const MAX_OPEN_FILE_LIMIT: usize = 10;

/// Minimum idle time before a cached handle becomes eligible for eviction.
pub const IDLE_LIFETIME_FLOOR: Duration = Duration::from_secs(3600);

/// Clock seam so eviction decisions are testable against a fixed time.
pub trait Clock: Send {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time; the production clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct CachedFile {
    file: File,
    opened_at: DateTime<Utc>,
    last_written_at: DateTime<Utc>,
}

/// Path-keyed cache of exclusive append handles.
///
/// Callers share it behind a single `Mutex`: lookups, inserts and eviction
/// sweeps all happen inside one critical section, so flush cycles for
/// different tags that resolve to the same path can never race an open
/// against a close. At most one handle exists per path, and nothing outside
/// the cache writes through it.
pub struct FileHandleCache {
    entries: HashMap<PathBuf, CachedFile>,
    capacity: usize,
    idle_lifetime: chrono::Duration,
    clock: Box<dyn Clock>,
}

impl FileHandleCache {
    /// Builds a cache with the given capacity bound and idle lifetime,
    /// driven by the system clock. The capacity is clamped to
    /// [`MAX_OPEN_FILE_LIMIT`]; the lifetime is taken as configured.
    #[must_use]
    pub fn new(capacity: usize, idle_lifetime: Duration) -> Self {
        Self::with_clock(capacity, idle_lifetime, Box::new(SystemClock))
    }

    /// Same, with an injected clock.
    #[must_use]
    pub fn with_clock(capacity: usize, idle_lifetime: Duration, clock: Box<dyn Clock>) -> Self {
        let capacity = capacity.min(MAX_OPEN_FILE_LIMIT);
        FileHandleCache {
            entries: HashMap::with_capacity(capacity),
            capacity,
            idle_lifetime: chrono::Duration::from_std(idle_lifetime)
                .unwrap_or_else(|_| chrono::Duration::max_value()),
            clock,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Ensures an open handle for `path`, opening the file in append-create
    /// mode (and creating missing parent directories) on first use. A fresh
    /// open inserts the entry and immediately triggers a capacity-checked
    /// eviction sweep. Directory creation or open failure is fatal to the
    /// call.
    pub fn acquire(&mut self, path: &Path) -> io::Result<()> {
        if self.entries.contains_key(path) {
            return Ok(());
        }
        self.open_entry(path)?;
        self.evict(true, true);
        // A zero-lifetime sweep can reap the entry that was just inserted;
        // reopen so the caller always holds a live handle.
        if !self.entries.contains_key(path) {
            self.open_entry(path)?;
        }
        Ok(())
    }

    /// Appends `bytes` to the file behind `path`, acquiring a handle if
    /// needed. The entry's last-write time is stamped only on success.
    /// I/O errors surface to the caller; no retry.
    pub fn write(&mut self, path: &Path, bytes: &[u8]) -> io::Result<usize> {
        self.acquire(path)?;
        let now = self.clock.now();
        let entry = self
            .entries
            .get_mut(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "cached handle vanished"))?;
        entry.file.write_all(bytes)?;
        entry.last_written_at = now;
        Ok(bytes.len())
    }

    /// Sweeps the cache. With `check_capacity`, the sweep is skipped while
    /// the cache is at or under its capacity bound. With `check_lifetime`,
    /// entries whose last write is still inside the idle-lifetime window
    /// are protected. Everything else is flushed, closed and removed in
    /// this one pass, regardless of how far under the bound the sweep ends
    /// up. Flush errors are logged and never block removal.
    pub fn evict(&mut self, check_capacity: bool, check_lifetime: bool) {
        if check_capacity && self.entries.len() <= self.capacity {
            return;
        }
        let now = self.clock.now();
        let idle_lifetime = self.idle_lifetime;
        self.entries.retain(|path, entry| {
            if check_lifetime {
                let deadline = entry.last_written_at.checked_add_signed(idle_lifetime);
                if deadline.map_or(true, |deadline| deadline > now) {
                    return true;
                }
            }
            close_entry(path, entry);
            debug!(
                "closed log file {} after {}s of use",
                path.display(),
                (entry.last_written_at - entry.opened_at).num_seconds()
            );
            false
        });
    }

    /// Unconditionally flushes and closes every cached handle; used at
    /// shutdown. Per-entry errors are logged and do not abort the sweep.
    pub fn release_all(&mut self) {
        for (path, entry) in &mut self.entries {
            close_entry(path, entry);
        }
        self.entries.clear();
    }

    fn open_entry(&mut self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("creating log directory {}", parent.display());
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let now = self.clock.now();
        debug!("opened log file {}", path.display());
        self.entries.insert(
            path.to_path_buf(),
            CachedFile {
                file,
                opened_at: now,
                last_written_at: now,
            },
        );
        Ok(())
    }
}

/// Flushes an entry about to be dropped. Closing happens when the handle
/// drops; errors here are best-effort cleanup, logged and swallowed.
fn close_entry(path: &Path, entry: &mut CachedFile) {
    if let Err(e) = entry.file.sync_all() {
        warn!("failed to flush {}: {e}", path.display());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Clone)]
    struct FixedClock {
        now: Arc<Mutex<DateTime<Utc>>>,
    }

    impl FixedClock {
        fn new() -> Self {
            FixedClock {
                now: Arc::new(Mutex::new(
                    DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
                )),
            }
        }

        fn advance(&self, seconds: i64) {
            let mut now = self.now.lock().unwrap();
            *now = *now + chrono::Duration::seconds(seconds);
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    fn cache(capacity: usize, lifetime: Duration) -> (FileHandleCache, FixedClock) {
        let clock = FixedClock::new();
        let cache = FileHandleCache::with_clock(capacity, lifetime, Box::new(clock.clone()));
        (cache, clock)
    }

    #[test]
    fn write_creates_parent_dirs_and_appends() {
        let dir = TempDir::new().unwrap();
        let (mut cache, _clock) = cache(2, Duration::from_secs(3600));
        let path = dir.path().join("svc/a/current.log");

        assert_eq!(cache.write(&path, b"first\n").unwrap(), 6);
        assert_eq!(cache.write(&path, b"second\n").unwrap(), 7);

        assert_eq!(cache.len(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn third_acquire_sweeps_unprotected_entries() {
        let dir = TempDir::new().unwrap();
        let (mut cache, _clock) = cache(2, Duration::ZERO);
        let p1 = dir.path().join("one.log");
        let p2 = dir.path().join("two.log");
        let p3 = dir.path().join("three.log");

        cache.acquire(&p1).unwrap();
        cache.acquire(&p2).unwrap();
        assert_eq!(cache.len(), 2);

        // Third acquire exceeds the bound; with no lifetime protection the
        // sweep empties the cache and the new entry is reopened.
        cache.acquire(&p3).unwrap();
        assert!(cache.len() <= 2);
        assert!(cache.contains(&p3));
        assert!(!cache.contains(&p1));
        assert!(!cache.contains(&p2));
    }

    #[test]
    fn recently_written_entries_are_protected_from_the_sweep() {
        let dir = TempDir::new().unwrap();
        let (mut cache, clock) = cache(2, Duration::from_secs(3600));
        let p1 = dir.path().join("one.log");
        let p2 = dir.path().join("two.log");
        let p3 = dir.path().join("three.log");

        cache.acquire(&p1).unwrap();
        clock.advance(1);
        cache.acquire(&p2).unwrap();
        clock.advance(1);
        cache.acquire(&p3).unwrap();

        // All three were written within the lifetime window: the sweep runs
        // but defers, leaving the cache over its capacity bound.
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn idle_entries_are_swept_once_capacity_is_exceeded() {
        let dir = TempDir::new().unwrap();
        let (mut cache, clock) = cache(2, Duration::from_secs(3600));
        let p1 = dir.path().join("one.log");
        let p2 = dir.path().join("two.log");
        let p3 = dir.path().join("three.log");

        cache.acquire(&p1).unwrap();
        cache.acquire(&p2).unwrap();
        clock.advance(7200);
        cache.write(&p1, b"fresh\n").unwrap();
        cache.acquire(&p3).unwrap();

        // p1 was just written and p3 just opened; p2 idled past the window.
        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&p1));
        assert!(!cache.contains(&p2));
        assert!(cache.contains(&p3));
    }

    #[test]
    fn evict_is_a_no_op_at_or_under_capacity() {
        let dir = TempDir::new().unwrap();
        let (mut cache, clock) = cache(2, Duration::from_secs(3600));
        cache.acquire(&dir.path().join("one.log")).unwrap();
        cache.acquire(&dir.path().join("two.log")).unwrap();

        clock.advance(7200);
        cache.evict(true, true);

        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn unchecked_evict_clears_everything() {
        let dir = TempDir::new().unwrap();
        let (mut cache, _clock) = cache(2, Duration::from_secs(3600));
        cache.acquire(&dir.path().join("one.log")).unwrap();
        cache.acquire(&dir.path().join("two.log")).unwrap();

        cache.evict(false, false);

        assert!(cache.is_empty());
    }

    #[test]
    fn release_all_closes_and_clears() {
        let dir = TempDir::new().unwrap();
        let (mut cache, _clock) = cache(2, Duration::from_secs(3600));
        let path = dir.path().join("one.log");
        cache.write(&path, b"line\n").unwrap();
        cache.acquire(&dir.path().join("two.log")).unwrap();

        cache.release_all();

        assert!(cache.is_empty());
        // A released path can be re-acquired and written again.
        cache.write(&path, b"more\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "line\nmore\n");
    }

    #[test]
    fn acquire_fails_when_the_path_is_a_directory() {
        let dir = TempDir::new().unwrap();
        let (mut cache, _clock) = cache(2, Duration::from_secs(3600));

        assert!(cache.acquire(dir.path()).is_err());
        assert!(cache.is_empty());
    }
}
