//! # Sessionbox
//!
//! A stateless service for running untrusted code and shell commands in
//! per-session sandbox directories.
//!
//! ## Features
//!
//! - **Sessions as directories:** a session is a directory under the base
//!   directory, created on first use and forkable
//! - **Confined paths:** every relative path is checked lexically and against
//!   symlinks before any I/O
//! - **Process sandbox:** wall-clock, CPU and memory limits with whole
//!   process-group cleanup
//! - **Code evaluation:** run a function against input/output cases in
//!   parallel, one process per case

pub mod config;
pub mod error;
pub mod eval;
pub mod files;
pub mod gateway;
pub mod sandbox;
pub mod session;

pub use config::Config;
pub use error::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
