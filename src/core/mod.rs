//! Core application functionality
//!
//! - `cli.rs`: command line arguments
//! - `config_file.rs`: the user settings file
//! - `settings.rs`: runtime settings resolved from both
//! - `platform.rs`: error reporting and argument handling
//! - `runner.rs`: loading, layout and output

pub mod cli;
pub mod config_file;
pub mod platform;
pub mod runner;
pub mod settings;

// Re-export commonly used items
pub use cli::CliArgs;
pub use config_file::ConfigFile;
pub use runner::{layout_text, run_app};
pub use settings::{EditSettings, LayoutSettings};
