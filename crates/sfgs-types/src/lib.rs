//! Shared types, adapter traits, and core utilities for the SFGS mailer.
//!
//! This crate contains the foundational types that are shared between the
//! dispatch crates, the server binary and all adapter implementations. Keeping
//! them in a separate crate allows the adapters to compile in parallel with the
//! feature crates.

#![forbid(unsafe_code)]

pub mod blob_adapter;
pub mod error;
pub mod fetch;
pub mod mail;
pub mod prelude;
pub mod queue;
pub mod queue_adapter;
pub mod types;
pub mod utils;

// vim: ts=4
