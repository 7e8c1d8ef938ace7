//! Persistent configuration.
//!
//! Settings live in an INI file under the user's config directory:
//!
//! ```ini
//! [ticket]
//! enabled = true
//! pause_all = false
//! group_size = 64
//! run_every = 20
//! proximity_threshold = 64
//!
//! [load]
//! window = 100
//! disable_tps = 15.0
//! recover_tps = 20.0
//!
//! [perf]
//! exclude_paused = true
//! top_types = 5
//! ```
//!
//! A missing file means defaults. [`ConfigKey`] addresses single settings as
//! `section.key` for the CLI.

mod file;
mod keys;

pub use file::{
    config_directory, config_file_path, ConfigFile, LoadSettings, PerfSettings, TicketSettings,
    CONFIG_FILE_NAME,
};
pub use keys::ConfigKey;

use std::path::PathBuf;

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}
