//! strata-server: command execution and the local shell.
//!
//! Maps parsed commands onto the engine, owns the runtime config
//! registry, and formats replies for the `strata` binary.

pub mod config;
pub mod format;
pub mod handler;
pub mod shell;

pub use config::{ConfigRegistry, StrataConfig};
pub use handler::{execute, execute_frame};
