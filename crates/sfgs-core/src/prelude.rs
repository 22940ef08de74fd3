pub use crate::app::App;
pub use sfgs_types::prelude::*;

// vim: ts=4
