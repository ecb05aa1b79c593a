//! # Clock
//!
//! Source of the request timestamp. Production code uses [`SystemClock`];
//! tests pin time with [`FixedClock`].

use chrono::{DateTime, Utc};

/// Time source for request signing.
pub trait Clock: Send + Sync {
    /// Current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// RFC 1123 date in lowercase, e.g. `thu, 27 apr 2017 00:51:12 gmt`.
pub fn format_x_ms_date(instant: DateTime<Utc>) -> String {
    instant
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
        .to_lowercase()
}
