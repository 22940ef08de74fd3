pub use sfgs_core::prelude::*;

// vim: ts=4
