//! # logsink
//!
//! A log-sink engine for host collection pipelines: tagged, timestamped
//! key/value records stream in per flush cycle and are durably delivered
//! either to rotated local files or to a remote multi-tenant log-store
//! service, under destination-specific size limits and resource lifetimes.
//!
//! Two pieces carry the engineering weight:
//!
//! - [`file::cache::FileHandleCache`] opens, reuses and evicts append
//!   handles under a capacity bound plus an idle-lifetime protection
//!   window, so long-running ingestion neither exhausts file descriptors
//!   nor holds files open forever.
//! - [`remote::router::BatchRouter`] partitions a cycle by destination
//!   store, splits greedily under a per-submission size ceiling, and
//!   substitutes a placeholder for any single field over its own limit
//!   instead of dropping the whole record.
//!
//! Hosts drive the engine through the [`sink::LogSink`] contract: build a
//! [`file::FileSink`] or [`remote::RemoteSink`] at startup, call `flush`
//! once per record batch, and `shutdown` once at exit. All calls are
//! synchronous; concurrency discipline is documented on the trait.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

/// Sink configuration surfaces (host parameters and YAML).
pub mod config;

/// Error families: configuration, flush-cycle and delivery errors.
pub mod error;

/// File sink: templating, handle cache, line encodings.
pub mod file;

/// Tracing bootstrap for hosts embedding the engine.
pub mod logger;

/// Record and field-value model shared by both sinks.
pub mod record;

/// Remote sink: batch router and wire client.
pub mod remote;

/// The flush/shutdown contract a host pipeline drives.
pub mod sink;

/// Timestamp normalization.
pub mod timestamp;
