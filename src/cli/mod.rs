//! CLI module for scoremap
//!
//! - Argument parsing (`args`)
//! - Command handlers (`commands`)
//! - Runtime setup (`setup`)

pub mod args;
pub mod commands;
pub mod setup;

pub use args::{Cli, Commands, OutputFormat};
pub use commands::{handle_init_command, handle_render_command, handle_validate_command};
pub use setup::{init_tracing, log_level, LOG_ENV};

/// Parse CLI arguments using Clap
pub fn parse_args() -> Cli {
    args::parse_args()
}
