//! Core of the SFGS mailer.
//!
//! Application state shared by the feature crates, plus the pure dispatch
//! policy: settings normalization, the rate policy and the batch selector.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod app;
pub mod cron;
pub mod prelude;
pub mod rate_policy;
pub mod selector;
pub mod settings;

pub use app::{App, AppBuilder, AppOpts, AppState};

// vim: ts=4
