//! End-to-end tests for the file sink: host parameters in, rotated
//! append-only files out.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Datelike, Local};
use tempfile::TempDir;

use logsink::config::FileSinkConfig;
use logsink::file::cache::FileHandleCache;
use logsink::file::FileSink;
use logsink::record::{FieldValue, RawRecord};
use logsink::sink::LogSink;
use logsink::timestamp::TimestampInput;

const EPOCH: u64 = 1_700_000_000;

fn record(message: &str) -> RawRecord {
    let mut fields = BTreeMap::new();
    fields.insert(
        "message".to_string(),
        FieldValue::Text(message.to_string()),
    );
    RawRecord {
        timestamp: TimestampInput::EpochSeconds(EPOCH),
        fields,
    }
}

/// The `$Date` text the default pattern produces for `EPOCH`, computed the
/// same way the sink does (local calendar date).
fn default_date() -> String {
    let local = chrono::DateTime::from_timestamp(EPOCH as i64, 0)
        .unwrap()
        .with_timezone(&Local);
    format!("{:04}{:02}{:02}", local.year(), local.month(), local.day())
}

fn sink_params(dir: &TempDir, format: &str) -> HashMap<String, String> {
    HashMap::from([
        (
            "File".to_string(),
            format!("{}/$Tag-$Date.log", dir.path().display()),
        ),
        ("Format".to_string(), format.to_string()),
    ])
}

#[test]
fn flush_appends_each_record_to_its_resolved_file() {
    let dir = TempDir::new().unwrap();
    let config = FileSinkConfig::from_params(&sink_params(&dir, "plain")).unwrap();
    let sink = FileSink::new(config);

    sink.flush("app", vec![record("hello"), record("world")])
        .unwrap();
    sink.flush("app", vec![record("again")]).unwrap();

    let path = dir.path().join(format!("app-{}.log", default_date()));
    let contents = fs::read_to_string(path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3);

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["message"], "hello");
    let last: serde_json::Value = serde_json::from_str(lines[2]).unwrap();
    assert_eq!(last["message"], "again");
}

#[test]
fn out_file_format_writes_the_structured_envelope() {
    let dir = TempDir::new().unwrap();
    let config = FileSinkConfig::from_params(&sink_params(&dir, "out_file")).unwrap();
    let sink = FileSink::new(config);

    sink.flush("svc.worker", vec![record("job done")]).unwrap();

    let path = dir.path().join(format!("svc.worker-{}.log", default_date()));
    let contents = fs::read_to_string(path).unwrap();
    assert_eq!(
        contents,
        format!("svc.worker: [{EPOCH}.0, {{\"message\":\"job done\"}}]\n")
    );
}

#[test]
fn distinct_tags_resolve_to_distinct_files() {
    let dir = TempDir::new().unwrap();
    let config = FileSinkConfig::from_params(&sink_params(&dir, "plain")).unwrap();
    let sink = FileSink::new(config);

    sink.flush("alpha", vec![record("a")]).unwrap();
    sink.flush("beta", vec![record("b")]).unwrap();

    assert!(dir
        .path()
        .join(format!("alpha-{}.log", default_date()))
        .exists());
    assert!(dir
        .path()
        .join(format!("beta-{}.log", default_date()))
        .exists());
}

#[test]
fn an_injected_cache_is_shared_and_released_at_shutdown() {
    let dir = TempDir::new().unwrap();
    let cache = Arc::new(Mutex::new(FileHandleCache::new(
        2,
        Duration::from_secs(3600),
    )));
    let config = FileSinkConfig::from_params(&sink_params(&dir, "plain")).unwrap();
    let sink = FileSink::with_cache(config, Arc::clone(&cache));

    sink.flush("alpha", vec![record("a")]).unwrap();
    sink.flush("beta", vec![record("b")]).unwrap();
    assert_eq!(cache.lock().unwrap().len(), 2);

    sink.shutdown();
    assert!(cache.lock().unwrap().is_empty());
}

#[test]
fn a_burst_of_tags_is_bounded_by_the_cache_policy() {
    let dir = TempDir::new().unwrap();
    // Zero idle lifetime: nothing is protected, so exceeding the capacity
    // bound sweeps the cache back down while every record still lands.
    let cache = Arc::new(Mutex::new(FileHandleCache::new(2, Duration::ZERO)));
    let config = FileSinkConfig::from_params(&sink_params(&dir, "plain")).unwrap();
    let sink = FileSink::with_cache(config, Arc::clone(&cache));

    for tag in ["one", "two", "three", "four", "five"] {
        sink.flush(tag, vec![record(tag)]).unwrap();
    }

    assert!(cache.lock().unwrap().len() <= 2);
    for tag in ["one", "two", "three", "four", "five"] {
        let path = dir.path().join(format!("{tag}-{}.log", default_date()));
        assert!(path.exists(), "{} missing", path.display());
    }
}

#[test]
fn templates_may_nest_the_tag_into_directories() {
    let dir = TempDir::new().unwrap();
    let params = HashMap::from([
        (
            "File".to_string(),
            format!("{}/$Tag/$Date.log", dir.path().display()),
        ),
        ("Format".to_string(), "plain".to_string()),
        ("Date".to_string(), "%Y-%m-%d".to_string()),
    ]);
    let config = FileSinkConfig::from_params(&params).unwrap();
    let sink = FileSink::new(config);

    sink.flush("nested.tag", vec![record("x")]).unwrap();

    let local = chrono::DateTime::from_timestamp(EPOCH as i64, 0)
        .unwrap()
        .with_timezone(&Local);
    let date = format!("{:04}-{:02}-{:02}", local.year(), local.month(), local.day());
    assert!(dir.path().join("nested.tag").join(format!("{date}.log")).exists());
}
