//! Shared setup for the queue integration tests

#![allow(dead_code)]

pub mod adapters;
pub mod fixtures;

pub use adapters::*;
pub use fixtures::*;

// vim: ts=4
