pub mod cleaning;
#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

pub use cleaning::{CleaningConfig, OutputColumn};
#[cfg(feature = "cli")]
pub use cli::{Cli, CliConfig, Command};
pub use toml_config::TomlConfig;
