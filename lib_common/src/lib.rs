//! # lib_common
//!
//! Shared building blocks for the dashboard binaries. Each top-level folder is
//! gated behind a cargo feature of the same name so consumers only compile the
//! parts they use.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

/// File logging with per-run log files and rotation.
#[cfg(feature = "loggers")]
pub mod loggers;

/// HTTP retrieval utilities.
#[cfg(feature = "retrieve")]
pub mod retrieve;
