//! Structured logging for kernel operations
//!
//! - `init(profile)` installs the process-wide subscriber once
//! - `log_op_start!`, `log_op_end!` and `log_op_error!` emit the canonical
//!   operation boundary events (fields from [`crate::schema`])
//! - `test_capture` records events in memory for assertions
//!
//! The kernel itself only logs at operation boundaries of bulk work
//! (transition-table builds, deep copies) and at debug level for proxy
//! resolution; per-element list mutations are reported through
//! notifications, not logs.
//!
//! ```rust
//! use modelkit_core::logging_facility::{init, Profile};
//!
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
