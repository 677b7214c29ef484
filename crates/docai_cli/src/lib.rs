//! Command-line front end for the docai add-on backend.
pub mod app;
pub mod args;
pub mod config;
pub mod render;

pub use app::run;
pub use args::{client_command, Cli, Command, LogTarget};
pub use config::{load_config, save_config, CliConfig, ConfigFileError, DEFAULT_CONFIG_FILE};
