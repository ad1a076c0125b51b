//! `rew.toml` configuration.

pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, load_or_default, ConfigError, CONFIG_FILE};
pub use schema::{
    FilesConfig, FormatConfig, ImportsConfig, RewriteConfig, ValidationError, ValidationIssue,
};
