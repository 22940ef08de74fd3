//! Shared setup for the server integration tests

#![allow(dead_code)]

pub mod adapters;

pub use adapters::*;

// vim: ts=4
