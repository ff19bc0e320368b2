//! Migration version numbers.
//!
//! Versions are 14-digit UTC timestamps (`yyyyMMddHHmmss`). A run can emit
//! several files within the same second, so the sequence bumps by one second
//! whenever the clock has not moved past the last issued version.

use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};

/// Format of a migration version.
pub const VERSION_FORMAT: &str = "%Y%m%d%H%M%S";

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Strictly increasing migration versions.
pub struct VersionSequence {
    clock: Arc<dyn Clock>,
    last: Option<DateTime<Utc>>,
}

impl VersionSequence {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock, last: None }
    }

    /// Sequence driven by the wall clock.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Issue the next version: `max(now, last + 1s)`.
    pub fn next_version(&mut self) -> String {
        let now = self.clock.now().trunc_subsecs(0);
        let next = match self.last {
            Some(last) if now <= last => last + Duration::seconds(1),
            _ => now,
        };
        self.last = Some(next);
        next.format(VERSION_FORMAT).to_string()
    }
}

impl Default for VersionSequence {
    fn default() -> Self {
        Self::system()
    }
}
