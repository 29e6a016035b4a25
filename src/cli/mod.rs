//! CLI module for stressmap
//!
//! - Argument parsing (`args`)
//! - Runtime setup: logging and thread pool (`setup`)
//!
//! Subcommand handlers live in `crate::commands`.

pub mod args;
pub mod setup;

pub use args::{Cli, Commands};
pub use setup::{configure_thread_pool, get_worker_count, init_logging, LOG_ENV_VAR};

/// Parse CLI arguments using Clap
pub fn parse_args() -> Cli {
    args::parse_args()
}
