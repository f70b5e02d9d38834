//! Backend-aware sanitization of nested data.
//!
//! This crate separates:
//! - **Rules**: what a backend considers dangerous ([`RuleSet`]).
//! - **Traversal**: how a value graph is walked and rebuilt ([`Engine`]).
//!
//! The engine walks arbitrary nested data, drops pollution and forbidden keys,
//! transforms the keys it keeps, scrubs every leaf, bounds recursion depth and
//! mirrors cycles instead of following them forever. It never fails: anything
//! it cannot keep safely is omitted.
//!
//! Key rules:
//! - `__proto__`, `prototype` and `constructor` keys are always dropped.
//! - Depth `max_depth` is still processed; anything deeper is omitted.
//! - Omitted array elements leave a hole ([`Value::Absent`]) instead of
//!   shifting later elements.
//! - Host instances are stripped or passed through by reference, per Rule Set.
//!
//! What this crate does:
//! - defines the [`Value`] model and the [`RuleSet`] contract
//! - provides reference Rule Sets for common backends (feature `backends`)
//! - provides a registry with per-call overrides and the [`sanitize`] entrypoint
//! - walks typed data through the same rules via `#[derive(Scrub)]`
//!
//! What it does not do:
//! - replace parameterized queries or backend escaping
//! - validate schemas or coerce value types
//!
//! The `Scrub` derive macro lives in `sanitization-derive` and is re-exported
//! here.

// <https://doc.rust-lang.org/rustc/lints/listing/allowed-by-default.html>
#![warn(
    anonymous_parameters,
    bare_trait_objects,
    elided_lifetimes_in_paths,
    missing_copy_implementations,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces
)]
// <https://rust-lang.github.io/rust-clippy/stable>
#![warn(
    clippy::all,
    clippy::cargo,
    clippy::dbg_macro,
    clippy::float_cmp_const,
    clippy::get_unwrap,
    clippy::mem_forget,
    clippy::nursery,
    clippy::pedantic,
    clippy::todo,
    clippy::unwrap_used,
    clippy::uninlined_format_args
)]
// Allow some clippy lints
#![allow(
    clippy::default_trait_access,
    clippy::doc_markdown,
    clippy::if_not_else,
    clippy::module_name_repetitions,
    clippy::multiple_crate_versions,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::use_self,
    clippy::cargo_common_metadata,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::enum_glob_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::option_if_let_else,
    clippy::return_self_not_must_use
)]
// Allow some lints while testing
#![cfg_attr(test, allow(clippy::non_ascii_literal, clippy::unwrap_used))]

pub use sanitization_derive::Scrub;

#[cfg(feature = "backends")]
pub mod backends;
pub mod config;
mod engine;
pub mod error;
mod json;
mod registry;
mod rules;
#[cfg(feature = "slog")]
pub mod slog;
mod typed;
mod value;

pub use engine::{Engine, Sanitized, DEFAULT_MAX_DEPTH};
pub use error::{ConfigError, RegistryError, RuleSetError, ValueError};
pub use registry::{freeze, get_rules, global, register, sanitize, Registry, SanitizeOptions};
pub use rules::{
    is_pollution_key, matches_forbidden, KeyMatcher, KeyTransform, PassThrough, RuleSet,
    RulesOverride, StripPatterns, ValueScrubber, KEY_PLACEHOLDER, POLLUTION_KEYS,
};
pub use typed::{Scrub, ScrubMapper, ScrubText, Scrubbable};
pub use value::{Instance, Object, Value, ValueKind};
