//! # Profiling
//!
//! With the `profiling` feature the world opens `info_span!`s around
//! `World::update`, every system run and every query revalidation. Without a
//! subscriber those spans cost nothing; [`init_json_logging`] installs one
//! that writes JSON lines to a daily rolling file.
//!
//! ```toml
//! [dependencies]
//! sparse_ecs = { version = "0.1", features = ["profiling"] }
//! ```
//!
//! ```ignore
//! let _guard = sparse_ecs::profiling::init_json_logging("logs", "ecs.json")?;
//!
//! let mut world = World::new();
//! world.update()?;
//! // keep `_guard` alive until shutdown so buffered lines get flushed
//! ```
//!
//! Use `RUST_LOG`-style filtering on the subscriber side if TRACE is too
//! noisy; query revalidation logs at TRACE.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;

use crate::error::{EcsError, Result};

/// Install a global JSON subscriber writing to `dir/prefix.YYYY-MM-DD`.
///
/// Returns the writer guard; dropping it flushes and stops the background
/// writer. Fails if a global subscriber is already set.
pub fn init_json_logging(dir: impl AsRef<Path>, prefix: &str) -> Result<WorkerGuard> {
    let appender = tracing_appender::rolling::daily(dir, prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .json()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .try_init()
        .map_err(|err| EcsError::SubscriberInit(err.to_string()))?;

    Ok(guard)
}
