//! # Observability
//!
//! Structured logging for the client and CLI.
//!
//! Log output goes to stderr so command output on stdout stays parseable.
//! `RUST_LOG` overrides the default level.

pub mod logging;

pub use logging::{init_logging, LogFormat};
