//! Email queue processing for the SFGS mailer
//!
//! - `scheduler`: one rate-limited processing pass over the queue
//! - `dispatcher`: sending a claimed entry and recording the outcome
//! - `birthday`: daily generation of birthday jobs
//! - `handler`: HTTP endpoints

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod birthday;
pub mod dispatcher;
pub mod handler;
pub mod scheduler;

mod prelude;

pub use birthday::{BirthdayReport, queue_birthday_emails};
pub use scheduler::{ProcessReport, process_queue};

// vim: ts=4
