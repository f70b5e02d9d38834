//! Reference Rule Sets for common backends.
//!
//! | Backend | Forbidden keys | Key transform | Values | Unknown types |
//! |---------|----------------|---------------|--------|---------------|
//! | [`mongo`] | `^\$`, `__proto__`, `prototype`, `constructor` (prefixes) | `.` | unchanged | stripped |
//! | [`sql`] | none | `;` | control chars, comment tokens, quotes removed | stripped |
//! | [`redis`] | none | CR, LF, NUL | CR, LF, NUL removed | stripped |
//! | [`elasticsearch`] | `script` (case-insensitive, exact) | none | unchanged | stripped |
//!
//! These rules reduce obvious injection shapes. They are not a replacement for
//! parameterized queries or the backend's own escaping.

mod elasticsearch;
mod mongo;
mod redis;
mod sql;

pub use elasticsearch::elasticsearch;
pub use mongo::mongo;
pub use redis::{redis, CrlfScrubber};
pub use sql::{sql, SqlScrubber};

use crate::rules::RuleSet;

pub const MONGO: &str = "mongo";
pub const SQL: &str = "sql";
pub const REDIS: &str = "redis";
pub const ELASTICSEARCH: &str = "elasticsearch";

/// Every reference Rule Set under its backend name.
pub fn reference_rule_sets() -> Vec<(&'static str, RuleSet)> {
    vec![
        (MONGO, mongo()),
        (SQL, sql()),
        (REDIS, redis()),
        (ELASTICSEARCH, elasticsearch()),
    ]
}
