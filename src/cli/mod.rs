//! CLI module for trishul-link.
//!
//! - Argument parsing and config overlay
//! - Version display
//! - Line commands read from stdin while running
//!
//! ```ignore
//! use trishul_link::cli::{parse_args, CliCommand};
//!
//! match parse_args(std::env::args())? {
//!     CliCommand::Version => handle_version_command(),
//!     CliCommand::Help => println!("{}", USAGE),
//!     CliCommand::Run(options) => { /* start the console */ }
//! }
//! ```

pub mod args;
pub mod commands;
pub mod version;

pub use args::{parse_args, CliCommand, CliOptions, USAGE};
pub use commands::{parse_command, ConsoleCommand, COMMANDS_HELP};
pub use version::{handle_version_command, VERSION};
